//! Domain model traits and runtime metadata for planning problems
//!
//! These types define the structure a score director works on:
//! - `PlanningSolution`: The container for the complete problem and solution
//! - `PlanningEntity`: Things that are planned/optimized
//! - `ProblemFact`: Read-only input data
//! - `PlanningId`: Unique identification used by look-up

mod descriptor;
mod entity_ref;
pub mod listener;
pub mod lookup;
mod traits;
mod variable;

pub use descriptor::{
    CollectionKind, EntityDescriptor, ProblemFactDescriptor, SolutionDescriptor,
    VariableDescriptor,
};
pub use entity_ref::{BoxedObject, EntityExtractor, EntityPosition, TypedEntityExtractor};
pub use listener::{ShadowContext, VariableListener, VariableNotification};
pub use lookup::{
    LookUpError, LookUpKey, LookUpManager, LookUpStrategy, LookUpStrategyType, ObjectLocation,
};
pub use traits::{PlanningEntity, PlanningId, PlanningSolution, ProblemFact};
pub use variable::{VariableId, VariableType};
