//! Runtime descriptors of a planning solution.
//!
//! Descriptors give score directors type-erased access to the entity and
//! fact collections of a solution, name every planning variable, and carry
//! the identity keys used by look-up.

mod entity;
mod problem_fact;
mod solution;
mod var_descriptor;


pub use entity::EntityDescriptor;
pub use problem_fact::ProblemFactDescriptor;
pub use solution::{CollectionKind, SolutionDescriptor};
pub use var_descriptor::VariableDescriptor;
