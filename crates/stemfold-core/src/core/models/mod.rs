//! # Core Models Module
//!
//! This module contains the two data structures every other part of stemfold is
//! built on: the immutable nucleotide [`sequence::Sequence`] and the mutable
//! partner-index [`pairing::Pairing`].
//!
//! ## Overview
//!
//! A secondary structure is kept as a flat array of partner slots rather than a
//! graph of pair objects. Stems and loops are never stored; they are re-derived
//! from the array whenever they are needed. This keeps the two structural
//! invariants locally checkable:
//!
//! - **Symmetry** - if slot `i` holds `j`, slot `j` holds `i`
//! - **Non-crossing** - no two pairs `(i, j)`, `(k, l)` satisfy `i < k < j < l`
//!
//! ## Key Components
//!
//! - [`sequence`] - Validated RNA sequence over `A`, `C`, `G`, `U`
//! - [`pairing`] - Partner-index array with validated constructors
//!
//! ## Usage
//!
//! ```ignore
//! use stemfold::core::models::{pairing::Pairing, sequence::Sequence};
//!
//! let seq: Sequence = "GGGAAACCC".parse()?;
//! let pairing = Pairing::from_bracket("(((...)))")?;
//! assert_eq!(seq.len(), pairing.len());
//! ```

pub mod pairing;
pub mod sequence;
