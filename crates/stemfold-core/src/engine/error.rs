use thiserror::Error;

use super::config::ConfigError;
use super::env::Action;
use super::utils::sampling::SamplingError;
use crate::core::models::pairing::PairingError;
use crate::core::models::sequence::SequenceError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid sequence: {source}")]
    Sequence {
        #[from]
        source: SequenceError,
    },

    #[error("Invalid pairing: {source}")]
    Pairing {
        #[from]
        source: PairingError,
    },

    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Invalid action {action} at cursor {cursor}: {reason}")]
    InvalidAction {
        action: Action,
        cursor: usize,
        reason: &'static str,
    },

    #[error("Cursor {cursor} is out of range for a sequence of length {len}")]
    CursorOutOfRange { cursor: usize, len: usize },

    #[error("Episode has already reached a terminal state")]
    EpisodeFinished,

    #[error("Action sampling failed: {source}")]
    Sampling {
        #[from]
        source: SamplingError,
    },
}
