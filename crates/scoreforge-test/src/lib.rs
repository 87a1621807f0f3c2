//! Shared test fixtures for ScoreForge crates.
//!
//! This crate provides data types and pure functions for testing.
//! It only depends on `scoreforge-core`, so the director crate can use it as
//! a dev-dependency without a second copy of its own types.
//!
//! - [`conflict`] - Equal-values pair conflicts with forbidden-value facts
//! - [`chain`] - Jobs with a "next in sequence" shadow variable
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! scoreforge-test = { workspace = true }
//! ```
//!
//! ```ignore
//! use scoreforge_test::conflict::{calculate_conflicts, create_conflict_descriptor, ConflictSolution};
//! use scoreforge_test::chain::{NextJobListener, ChainSolution};
//! ```

pub mod chain;
pub mod conflict;

pub use chain::{ChainSolution, Job, NextJobListener};
pub use conflict::{ConflictSolution, Forbidden, ValueSlot};
