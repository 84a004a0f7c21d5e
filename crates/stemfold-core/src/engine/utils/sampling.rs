use rand::{distributions::WeightedIndex, prelude::*};
use thiserror::Error;
use tracing::instrument;

#[derive(Debug, Error)]
pub enum SamplingError {
    #[error("Input list is empty, cannot perform sampling")]
    Empty,
    #[error("Invalid temperature: {0}. Temperature must be finite and non-negative")]
    InvalidTemperature(f64),
    #[error("Invalid beta value: {0}. Beta must be positive for Boltzmann weighting")]
    InvalidBeta(f64),
    #[error("Failed to create weighted distribution: {source}")]
    DistributionError {
        #[from]
        source: rand::distributions::WeightedError,
    },
}

/// Index of the largest value; ties go to the earliest index.
pub fn argmax_first(values: &[u32]) -> Option<usize> {
    let mut best: Option<(usize, u32)> = None;
    for (idx, &v) in values.iter().enumerate() {
        if best.is_none_or(|(_, b)| v > b) {
            best = Some((idx, v));
        }
    }
    best.map(|(idx, _)| idx)
}

/// Samples an index with probability proportional to `visits^(1/temperature)`.
///
/// A temperature of zero is greedy. When every count is zero the choice is
/// uniform.
#[instrument(level = "trace", skip_all, fields(temperature = temperature))]
pub fn sample_visits(
    visits: &[u32],
    temperature: f64,
    rng: &mut impl Rng,
) -> Result<usize, SamplingError> {
    let max_visits = visits.iter().copied().max().ok_or(SamplingError::Empty)?;
    if !temperature.is_finite() || temperature < 0.0 {
        return Err(SamplingError::InvalidTemperature(temperature));
    }
    if max_visits == 0 {
        return Ok(rng.gen_range(0..visits.len()));
    }
    if temperature == 0.0 {
        return argmax_first(visits).ok_or(SamplingError::Empty);
    }

    // Scaling by the maximum keeps the largest weight at exactly 1.
    let exponent = 1.0 / temperature;
    let weights: Vec<f64> = visits
        .iter()
        .map(|&v| (v as f64 / max_visits as f64).powf(exponent))
        .collect();

    let dist = WeightedIndex::new(&weights)?;
    Ok(dist.sample(rng))
}

/// Normalised Boltzmann weights `exp(-beta * (e - e_min))`.
#[instrument(level = "trace", skip_all, fields(beta = beta))]
pub fn boltzmann_weights(energies: &[f64], beta: f64) -> Result<Vec<f64>, SamplingError> {
    if energies.is_empty() {
        return Err(SamplingError::Empty);
    }
    if beta <= 0.0 || !beta.is_finite() {
        return Err(SamplingError::InvalidBeta(beta));
    }

    let min_energy = energies.iter().copied().fold(f64::INFINITY, f64::min);
    let weights: Vec<f64> = energies
        .iter()
        .map(|&e| (-(e - min_energy) * beta).exp())
        .collect();

    let total: f64 = weights.iter().sum();
    Ok(weights.into_iter().map(|w| w / total).collect())
}
