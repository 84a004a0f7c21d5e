//! Utility functions for the engine module.
//!
//! Currently this holds the sampling helpers shared by the search output,
//! the self-play driver and the energy-guided evaluator.

pub mod sampling;
