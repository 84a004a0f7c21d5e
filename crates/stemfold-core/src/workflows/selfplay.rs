use super::episode::{EpisodeTrace, Transition};
use crate::core::energy::scoring::EnergyModel;
use crate::core::models::pairing::Pairing;
use crate::core::models::sequence::Sequence;
use crate::engine::config::FoldConfig;
use crate::engine::env::{Action, FoldingEnv, State};
use crate::engine::error::EngineError;
use crate::engine::evaluator::StateEvaluator;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::search::Puct;
use crate::engine::state::{Solution, SolutionSet};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// A training example: the searched state, its visit policy and the episode
/// outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelfPlaySample {
    pub state: State,
    pub actions: Vec<Action>,
    pub policy: Vec<f64>,
    /// `-final_energy` of the episode this sample belongs to.
    pub outcome: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelfPlayEpisode {
    pub samples: Vec<SelfPlaySample>,
    pub trace: EpisodeTrace,
}

#[derive(Debug, Clone)]
pub struct BatchResult {
    /// One episode per input sequence, in input order.
    pub episodes: Vec<SelfPlayEpisode>,
    /// Lowest-energy distinct structures, ascending by energy.
    pub best: Vec<Solution>,
}

fn build_search(
    config: &FoldConfig,
    evaluator: Option<Arc<dyn StateEvaluator>>,
) -> Result<Puct, EngineError> {
    let search = match evaluator {
        Some(evaluator) => Puct::with_evaluator(config.search, evaluator)?,
        None => Puct::new(config.search)?,
    };
    Ok(search)
}

/// Plays one episode, searching before every move and sampling the move from
/// the visit counts at the configured temperature.
#[instrument(skip_all, name = "self_play_episode", fields(length = sequence.len()))]
pub fn play_episode(
    sequence: Arc<Sequence>,
    model: Arc<EnergyModel>,
    evaluator: Option<Arc<dyn StateEvaluator>>,
    config: &FoldConfig,
    rng: &mut impl Rng,
) -> Result<SelfPlayEpisode, EngineError> {
    config.validate()?;
    let search = build_search(config, evaluator)?;
    let mut env = FoldingEnv::new(sequence, model, config.environment)?;
    play_on(&mut env, &search, config.self_play.temperature, rng, |_, _| {})
}

fn play_on(
    env: &mut FoldingEnv,
    search: &Puct,
    temperature: f64,
    rng: &mut impl Rng,
    mut on_move: impl FnMut(usize, Action),
) -> Result<SelfPlayEpisode, EngineError> {
    let mut state = env.reset();
    let mut samples = Vec::new();
    let mut transitions = Vec::new();
    let mut total_reward = 0.0;

    while !env.is_terminal() {
        let result = search.search(env)?;
        let action = result.sample(rng, temperature)?.unwrap_or(Action::Skip);
        // A dead end under the pairs-only space has nothing to learn from.
        if !result.terminal {
            samples.push(SelfPlaySample {
                state: state.clone(),
                actions: result.actions,
                policy: result.policy,
                outcome: 0.0,
            });
        }

        on_move(state.cursor, action);
        let step = env.step(action)?;
        total_reward += step.reward;
        transitions.push(Transition {
            state,
            action,
            reward: step.reward,
            next_state: step.state.clone(),
            done: step.done,
        });
        state = step.state;
    }

    let outcome = -env.energy();
    for sample in &mut samples {
        sample.outcome = outcome;
    }

    let trace = EpisodeTrace {
        sequence: env.sequence().to_string(),
        transitions,
        final_structure: env.pairing().to_bracket(),
        final_energy: env.energy(),
        total_reward,
    };
    debug!(
        structure = %trace.final_structure,
        energy = trace.final_energy,
        "Self-play episode finished"
    );
    Ok(SelfPlayEpisode { samples, trace })
}

/// Plays one episode per sequence and collects the best structures found.
///
/// Episode `i` uses a generator seeded with `seed + i`, so the result does not
/// depend on whether the `parallel` feature is enabled.
#[instrument(skip_all, name = "self_play_batch", fields(episodes = sequences.len()))]
pub fn play_batch(
    sequences: &[Arc<Sequence>],
    model: Arc<EnergyModel>,
    evaluator: Option<Arc<dyn StateEvaluator>>,
    config: &FoldConfig,
    reporter: &ProgressReporter,
) -> Result<BatchResult, EngineError> {
    config.validate()?;
    let search = build_search(config, evaluator)?;
    let seed = config.self_play.seed;
    let temperature = config.self_play.temperature;

    reporter.report(Progress::BatchStart {
        episodes: sequences.len() as u64,
    });
    info!(
        episodes = sequences.len(),
        simulations = config.search.num_simulations,
        "Starting self-play batch"
    );

    #[cfg(not(feature = "parallel"))]
    let iterator = sequences.iter().enumerate();

    #[cfg(feature = "parallel")]
    let iterator = sequences.par_iter().enumerate();

    let episodes = iterator
        .map(|(index, sequence)| -> Result<SelfPlayEpisode, EngineError> {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(index as u64));
            let mut env =
                FoldingEnv::new(Arc::clone(sequence), Arc::clone(&model), config.environment)?;
            reporter.report(Progress::EpisodeStart {
                index,
                length: sequence.len(),
            });

            let episode = play_on(&mut env, &search, temperature, &mut rng, |cursor, action| {
                reporter.report(Progress::MoveCommitted {
                    index,
                    cursor,
                    action,
                })
            })?;

            reporter.report(Progress::EpisodeFinish {
                index,
                structure: episode.trace.final_structure.clone(),
                energy: episode.trace.final_energy,
            });
            Ok(episode)
        })
        .collect::<Result<Vec<_>, EngineError>>()?;

    let mut solutions = SolutionSet::new(config.self_play.keep_best);
    for episode in &episodes {
        let trace = &episode.trace;
        solutions.offer(Solution {
            energy: trace.final_energy,
            sequence: trace.sequence.clone(),
            structure: trace.final_structure.clone(),
            pairing: Pairing::from_bracket(&trace.final_structure)?,
        });
    }
    let best = solutions.into_sorted_vec();

    if let Some(top) = best.first() {
        info!(
            energy = top.energy,
            structure = %top.structure,
            "Self-play batch finished"
        );
    }
    reporter.report(Progress::Message(format!(
        "Kept {} distinct structures from {} episodes",
        best.len(),
        episodes.len()
    )));
    reporter.report(Progress::BatchFinish);

    Ok(BatchResult { episodes, best })
}
