use crate::engine::env::{Action, FoldingEnv, State};
use crate::engine::error::EngineError;
use crate::engine::search::Puct;
use rand::RngCore;
use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::{debug, instrument};

/// One recorded environment transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transition {
    pub state: State,
    pub action: Action,
    pub reward: f64,
    pub next_state: State,
    pub done: bool,
}

/// Full record of one episode, serialisable for external learners.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeTrace {
    pub sequence: String,
    pub transitions: Vec<Transition>,
    pub final_structure: String,
    pub final_energy: f64,
    pub total_reward: f64,
}

/// Chooses an action among those the environment offers.
///
/// `actions` may be empty under the pairs-only action space; any action is
/// then accepted by the environment as an implicit skip.
pub trait Policy {
    fn select(
        &mut self,
        env: &FoldingEnv,
        actions: &[Action],
        rng: &mut dyn RngCore,
    ) -> Result<Action, EngineError>;
}

/// Uniform choice among the offered actions.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomPolicy;

impl Policy for RandomPolicy {
    fn select(
        &mut self,
        _env: &FoldingEnv,
        actions: &[Action],
        rng: &mut dyn RngCore,
    ) -> Result<Action, EngineError> {
        Ok(actions.choose(rng).copied().unwrap_or(Action::Skip))
    }
}

/// Runs a PUCT search per move and plays the most visited action.
#[derive(Clone)]
pub struct SearchPolicy {
    search: Puct,
}

impl SearchPolicy {
    pub fn new(search: Puct) -> Self {
        Self { search }
    }
}

impl Policy for SearchPolicy {
    fn select(
        &mut self,
        env: &FoldingEnv,
        _actions: &[Action],
        _rng: &mut dyn RngCore,
    ) -> Result<Action, EngineError> {
        let result = self.search.search(env)?;
        Ok(result.best_action().unwrap_or(Action::Skip))
    }
}

/// Resets `env` and plays it to the end with `policy`.
#[instrument(skip_all, name = "episode", fields(length = env.len()))]
pub fn run_episode<P: Policy + ?Sized>(
    env: &mut FoldingEnv,
    policy: &mut P,
    rng: &mut dyn RngCore,
) -> Result<EpisodeTrace, EngineError> {
    let mut state = env.reset();
    let mut transitions = Vec::with_capacity(env.len());
    let mut total_reward = 0.0;

    while !env.is_terminal() {
        let actions = env.valid_actions();
        let action = policy.select(env, &actions, rng)?;
        let result = env.step(action)?;
        total_reward += result.reward;
        transitions.push(Transition {
            state,
            action,
            reward: result.reward,
            next_state: result.state.clone(),
            done: result.done,
        });
        state = result.state;
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
        steps = trace.transitions.len(),
        "Episode finished"
    );
    Ok(trace)
}
