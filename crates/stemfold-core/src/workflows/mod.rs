//! # Workflows Module
//!
//! This module provides the high-level drivers that play complete folding
//! episodes on top of the [`crate::engine`] layer.
//!
//! ## Overview
//!
//! Workflows are the entry points for hosts that want finished structures or
//! training data rather than single environment steps. They own the episode
//! loop, seed the random generators, report progress and gather results.
//!
//! ## Architecture
//!
//! - **Episodes** ([`episode`]) - The [`episode::Policy`] abstraction, random and
//!   search-driven policies, and the serialisable [`episode::EpisodeTrace`]
//! - **Self-Play** ([`selfplay`]) - Search-per-move episodes that record visit
//!   policies and outcomes, and batches of them run in parallel
//!
//! ## Key Capabilities
//!
//! - **Reproducible runs** from explicit seeds, sequential or parallel
//! - **Training samples** pairing each searched state with its visit policy
//!   and the final outcome
//! - **Best-structure tracking** across a batch

pub mod episode;
pub mod selfplay;
