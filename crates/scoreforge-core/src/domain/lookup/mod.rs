//! Look-up of working objects from external references.
//!
//! A score director only mutates its own working instances. Problem changes
//! and moves rebased from another solution carry references to objects of a
//! different instance, which are mapped back onto the working solution here.
//!
//! The identity used per object type is resolved once from a
//! [`LookUpStrategyType`] and the keys registered on the descriptors.

mod error;
mod key;
mod manager;
mod strategy;


pub use error::LookUpError;
pub use key::LookUpKey;
pub use manager::{LookUpManager, ObjectLocation};
pub use strategy::{LookUpStrategy, LookUpStrategyType};
