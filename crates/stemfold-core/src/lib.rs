//! # stemfold
//!
//! A library for exploring RNA secondary structures as a sequential decision
//! process: bases are visited left to right, each one is either left unpaired
//! or paired with a later complementary base, and a PUCT tree search guided by
//! a pluggable state evaluator chooses among those moves.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Sequence`, `Pairing`),
//!   the structural invariants of nested pairings and the nearest-neighbour
//!   energy model that scores them.
//!
//! - **[`engine`]: The Logic Core.** The stateful folding environment, the
//!   evaluator interface and the PUCT search, together with configuration,
//!   progress reporting and error types.
//!
//! - **[`workflows`]: The Public API.** Complete episode drivers: random or
//!   search-driven play producing serialisable traces, and self-play batches
//!   producing training samples and the best structures found.
//!
//! Energies are relative approximations for ranking candidate structures, not
//! calibrated thermodynamic predictions, and the search offers no optimality
//! guarantee.

pub mod core;
pub mod engine;
pub mod workflows;

#[cfg(test)]
pub(crate) mod test_util;
