//! # Core Module
//!
//! This module provides the stateless building blocks of stemfold: the sequence
//! and pairing representations, the structural invariants they must satisfy and
//! the energy model that scores them.
//!
//! ## Architecture
//!
//! - **Data Models** ([`models`]) - Validated sequences and partner-index pairings
//! - **Structural Invariants** ([`structure`]) - Pair admissibility, crossing tests,
//!   minimum hairpin length and bracket notation
//! - **Energy Calculations** ([`energy`]) - Stem/loop decomposition and per-motif scoring
//!
//! Nothing in this module holds mutable state across calls; the stateful folding
//! environment and the tree search live in [`crate::engine`].

pub mod energy;
pub mod models;
pub mod structure;
