//! # Engine Module
//!
//! This module holds the stateful side of stemfold: the sequential folding
//! environment and the PUCT tree search that plays it.
//!
//! ## Overview
//!
//! A fold is built left to right. At every cursor position the environment
//! offers either to leave the base unpaired or to pair it with a later,
//! complementary, non-crossing partner. The search explores those decisions
//! on private copies of the environment and returns a visit-count policy over
//! the actions available at the root.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Action space, pair admissibility rule, search
//!   budget and self-play settings, with TOML loading
//! - **Environment** ([`env`]) - The `(cursor, pairing)` state machine and its rewards
//! - **Evaluation** ([`evaluator`]) - The injected prior/value source and its fallback
//! - **Search** ([`search`], [`tree`]) - PUCT over an arena of nodes
//! - **State Tracking** ([`state`]) - Top-k sets of the best structures found
//! - **Progress Monitoring** ([`progress`]) - Callback-based reporting for batch runs
//! - **Error Handling** ([`error`]) - Engine-specific error types
//!
//! ## Guarantees
//!
//! - Every pairing the environment produces is symmetric and non-crossing
//! - The cursor never moves backwards and an episode ends within `n` steps
//! - A search never mutates the caller's environment
//! - Evaluator failures degrade to uniform priors instead of aborting a search
//! - All randomness comes from caller-supplied, seedable generators

pub mod config;
pub mod env;
pub mod error;
pub mod evaluator;
pub mod progress;
pub mod search;
pub mod state;
pub mod tree;
pub mod utils;
