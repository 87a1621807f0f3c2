//! ScoreForge Core - value types and domain metadata for score directors
//!
//! This crate provides the building blocks every score director relies on:
//! - Score types for representing solution quality
//! - Domain traits for defining planning problems
//! - Descriptor types for runtime metadata and type-erased entity access
//! - Variable listener contracts for shadow variables
//! - Look-up of working objects from external references

pub mod constraint;
pub mod domain;
pub mod error;
pub mod score;

pub use constraint::{ConstraintRef, ImpactType};
pub use domain::{
    LookUpError, LookUpManager, LookUpStrategyType, PlanningEntity, PlanningId, PlanningSolution,
    ProblemFact,
};
pub use error::ScoreForgeError;
pub use score::{HardSoftScore, Score, SimpleScore};
