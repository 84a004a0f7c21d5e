use crate::core::energy::scoring::EnergyModel;
use crate::core::models::sequence::Sequence;
use crate::engine::config::EnvConfig;
use crate::engine::env::{Action, FoldingEnv};
use crate::engine::evaluator::{Evaluation, EvaluatorError, StateEvaluator};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn env_for(sequence: &str) -> FoldingEnv {
    env_with(sequence, EnvConfig::default())
}

pub fn env_with(sequence: &str, config: EnvConfig) -> FoldingEnv {
    let sequence: Sequence = sequence.parse().unwrap();
    FoldingEnv::new(Arc::new(sequence), Arc::new(EnergyModel::default()), config).unwrap()
}

/// Always fails.
pub struct FailingEvaluator;

impl StateEvaluator for FailingEvaluator {
    fn evaluate(&self, env: &FoldingEnv, _actions: &[Action]) -> Result<Evaluation, EvaluatorError> {
        Err(EvaluatorError::Unavailable {
            cursor: env.cursor(),
        })
    }
}

/// Returns the same evaluation for every state.
pub struct FixedEvaluator {
    pub evaluation: Evaluation,
}

impl StateEvaluator for FixedEvaluator {
    fn evaluate(&self, _env: &FoldingEnv, _actions: &[Action]) -> Result<Evaluation, EvaluatorError> {
        Ok(self.evaluation.clone())
    }
}

/// Uniform priors, counting how often it is queried.
#[derive(Default)]
pub struct CountingEvaluator {
    calls: AtomicUsize,
}

impl CountingEvaluator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl StateEvaluator for CountingEvaluator {
    fn evaluate(&self, _env: &FoldingEnv, actions: &[Action]) -> Result<Evaluation, EvaluatorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Evaluation::uniform(actions))
    }
}
