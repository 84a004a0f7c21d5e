use super::config::ConfigError;
use super::env::{Action, FoldingEnv};
use super::utils::sampling::boltzmann_weights;
use std::collections::HashMap;
use thiserror::Error;
use tracing::warn;

/// Allowed distance of a prior distribution's sum from 1.
pub const PRIOR_SUM_TOLERANCE: f64 = 1e-3;

#[derive(Debug, Error)]
pub enum EvaluatorError {
    #[error("Evaluator failed: {0}")]
    Failed(String),
    #[error("Evaluator has no estimate for cursor {cursor}")]
    Unavailable { cursor: usize },
}

/// Priors over the offered actions plus a scalar value estimate of the state.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub priors: HashMap<Action, f64>,
    pub value: f64,
}

impl Evaluation {
    pub fn uniform(actions: &[Action]) -> Self {
        let p = 1.0 / actions.len().max(1) as f64;
        Self {
            priors: actions.iter().map(|&a| (a, p)).collect(),
            value: 0.0,
        }
    }
}

/// Source of priors and values for the tree search.
///
/// Implementations are shared across self-play threads behind an `Arc`, so
/// they must be `Send + Sync`. An evaluator reads the environment; it never
/// steps it.
pub trait StateEvaluator: Send + Sync {
    fn evaluate(&self, env: &FoldingEnv, actions: &[Action]) -> Result<Evaluation, EvaluatorError>;
}

/// Uniform priors and a zero value.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformEvaluator;

impl StateEvaluator for UniformEvaluator {
    fn evaluate(&self, _env: &FoldingEnv, actions: &[Action]) -> Result<Evaluation, EvaluatorError> {
        Ok(Evaluation::uniform(actions))
    }
}

/// Priors Boltzmann-weighted on the one-step energy change of each action;
/// value `tanh(-energy / value_scale)`.
#[derive(Debug, Clone, Copy)]
pub struct EnergyGuidedEvaluator {
    beta: f64,
    value_scale: f64,
}

impl Default for EnergyGuidedEvaluator {
    fn default() -> Self {
        Self {
            beta: 1.0,
            value_scale: 10.0,
        }
    }
}

impl EnergyGuidedEvaluator {
    pub fn new(beta: f64, value_scale: f64) -> Result<Self, ConfigError> {
        if !beta.is_finite() || beta <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "beta",
                reason: format!("must be finite and positive, got {}", beta),
            });
        }
        if !value_scale.is_finite() || value_scale <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "value_scale",
                reason: format!("must be finite and positive, got {}", value_scale),
            });
        }
        Ok(Self { beta, value_scale })
    }
}

impl StateEvaluator for EnergyGuidedEvaluator {
    fn evaluate(&self, env: &FoldingEnv, actions: &[Action]) -> Result<Evaluation, EvaluatorError> {
        let value = (-env.energy() / self.value_scale).tanh();
        if actions.is_empty() {
            return Ok(Evaluation {
                priors: HashMap::new(),
                value,
            });
        }

        let deltas = actions
            .iter()
            .map(|&a| env.preview(a))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| EvaluatorError::Failed(e.to_string()))?;
        let weights = boltzmann_weights(&deltas, self.beta)
            .map_err(|e| EvaluatorError::Failed(e.to_string()))?;

        Ok(Evaluation {
            priors: actions.iter().copied().zip(weights).collect(),
            value,
        })
    }
}

/// Turns an evaluator response into priors aligned with `actions` and a value.
///
/// A missing evaluator, an error, or a malformed response all yield uniform
/// priors and a zero value; the latter two are logged.
pub(crate) fn resolve_evaluation(
    evaluator: Option<&dyn StateEvaluator>,
    env: &FoldingEnv,
    actions: &[Action],
) -> (Vec<f64>, f64) {
    let uniform = || (vec![1.0 / actions.len().max(1) as f64; actions.len()], 0.0);

    let Some(evaluator) = evaluator else {
        return uniform();
    };
    match evaluator.evaluate(env, actions) {
        Ok(evaluation) => match check_evaluation(&evaluation, actions) {
            Ok(priors) => (priors, evaluation.value),
            Err(reason) => {
                warn!(
                    cursor = env.cursor(),
                    reason, "Malformed evaluation, falling back to uniform priors"
                );
                uniform()
            }
        },
        Err(e) => {
            warn!(
                cursor = env.cursor(),
                error = %e,
                "Evaluator failed, falling back to uniform priors"
            );
            uniform()
        }
    }
}

fn check_evaluation(evaluation: &Evaluation, actions: &[Action]) -> Result<Vec<f64>, &'static str> {
    if !evaluation.value.is_finite() {
        return Err("value is not finite");
    }
    if evaluation.priors.len() != actions.len() {
        return Err("prior keys do not match the offered actions");
    }
    let priors = actions
        .iter()
        .map(|a| {
            evaluation
                .priors
                .get(a)
                .copied()
                .ok_or("prior keys do not match the offered actions")
        })
        .collect::<Result<Vec<_>, _>>()?;
    if priors.iter().any(|p| !p.is_finite() || *p < 0.0) {
        return Err("priors must be finite and non-negative");
    }
    if !actions.is_empty() && (priors.iter().sum::<f64>() - 1.0).abs() > PRIOR_SUM_TOLERANCE {
        return Err("priors do not sum to 1");
    }
    Ok(priors)
}
