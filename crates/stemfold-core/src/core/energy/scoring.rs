use super::decompose::{LoopRegion, Stem, classify_loops, decompose_stems};
use super::motifs;
use super::params::EnergyParams;
use super::term::EnergyTerm;
use crate::core::models::pairing::Pairing;
use crate::core::models::sequence::Sequence;
use std::collections::HashSet;

/// Closed-form nearest-neighbour energy model.
///
/// Scoring is a pure function of the sequence and the pairing: nothing is
/// cached between calls, so the result for a given pairing never depends on
/// how that pairing was reached.
#[derive(Debug, Clone, Default)]
pub struct EnergyModel {
    params: EnergyParams,
}

impl EnergyModel {
    pub fn new(params: EnergyParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &EnergyParams {
        &self.params
    }

    /// Total energy in kcal/mol; lower is more stable.
    pub fn score(&self, sequence: &Sequence, pairing: &Pairing) -> f64 {
        self.breakdown(sequence, pairing).total()
    }

    pub fn breakdown(&self, sequence: &Sequence, pairing: &Pairing) -> EnergyTerm {
        debug_assert_eq!(sequence.len(), pairing.len());

        let stems = decompose_stems(pairing);
        let mut term = EnergyTerm {
            unpaired: self.params.unpaired_penalty * pairing.unpaired_count() as f64,
            ..Default::default()
        };

        for stem in &stems {
            term.stack += self.stem_energy(sequence, stem);
        }

        for region in classify_loops(pairing, &stems) {
            match region {
                LoopRegion::Hairpin { closing, len } => {
                    let core = &sequence.bases()[closing.0 + 1..closing.0 + 1 + len];
                    term.hairpin += motifs::hairpin(&self.params, core);
                }
                LoopRegion::Internal {
                    left_len,
                    right_len,
                    ..
                } => term.internal += motifs::internal_loop(&self.params, left_len, right_len),
                LoopRegion::Multibranch {
                    branches, unpaired, ..
                } => term.multibranch += motifs::multibranch(&self.params, branches, unpaired),
            }
        }

        if self.params.coaxial.enabled {
            term.coaxial = self.params.coaxial.bonus * coaxial_junctions(&stems) as f64;
        }

        term
    }

    fn stem_energy(&self, sequence: &Sequence, stem: &Stem) -> f64 {
        if stem.len == 1 {
            return self.params.isolated_pair;
        }
        (0..stem.len - 1)
            .map(|k| {
                let (i, j) = stem.layer(k);
                let motif = [sequence[i], sequence[j], sequence[i + 1], sequence[j - 1]];
                motifs::stack_layer(&self.params, &motif)
            })
            .sum()
    }
}

/// Counts stem pairs whose outer ends touch (`a.end + 1 == b.start`).
fn coaxial_junctions(stems: &[Stem]) -> usize {
    let starts: HashSet<usize> = stems.iter().map(|s| s.start).collect();
    stems
        .iter()
        .filter(|s| starts.contains(&(s.end + 1)))
        .count()
}
