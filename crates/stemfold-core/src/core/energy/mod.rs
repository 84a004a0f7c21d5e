//! # Energy Module
//!
//! This module implements the simplified nearest-neighbour free-energy model used
//! to score RNA secondary structures in stemfold.
//!
//! ## Overview
//!
//! A structure is decomposed into stems (maximal runs of stacked pairs) and the
//! loop regions they close, and every motif contributes an additive term:
//!
//! - **Stacking** from a 4-base nearest-neighbour table, with a default for
//!   unknown motifs and a weak constant for isolated pairs
//! - **Hairpin loops** with a log-length model, a large penalty below the
//!   minimum loop size and bonuses for known tetraloop families
//! - **Internal and bulge loops** with a log-length term and an asymmetry penalty
//! - **Multibranch loops** linear in branches and enclosed unpaired bases
//! - **Coaxial stacking** of directly adjacent stems (optional)
//! - **Unpaired bases** with a small per-base penalty
//!
//! Lower energies are more stable. Values are relative approximations, not
//! calibrated Turner free energies.
//!
//! ## Key Components
//!
//! - [`params`] - Named energy constants and their TOML/CSV loaders
//! - [`decompose`] - Stem and loop-region derivation from a pairing
//! - [`term`] - Per-motif energy breakdown
//! - [`scoring`] - The [`scoring::EnergyModel`] entry point
//!
//! ## Usage
//!
//! ```ignore
//! use stemfold::core::energy::scoring::EnergyModel;
//!
//! let model = EnergyModel::default();
//! let energy = model.score(&sequence, &pairing);
//! let breakdown = model.breakdown(&sequence, &pairing);
//! ```

pub mod decompose;
pub(crate) mod motifs;
pub mod params;
pub mod scoring;
pub mod term;
