//! Problem fact descriptor.

use std::any::TypeId;
use std::fmt;
use std::hash::Hash;

use crate::domain::entity_ref::EntityExtractor;
use crate::domain::lookup::LookUpKey;
use crate::domain::traits::PlanningId;

/// Describes a problem fact collection at runtime.
pub struct ProblemFactDescriptor {
    /// Name of the problem fact type.
    pub type_name: &'static str,
    /// TypeId of the problem fact type.
    pub type_id: TypeId,
    /// Field name in the solution.
    pub solution_field: &'static str,
    /// Extractor for getting facts from a solution.
    pub extractor: Option<Box<dyn EntityExtractor>>,
    /// Identity key from [`PlanningId`], if registered.
    pub planning_id_key: Option<LookUpKey>,
    /// Identity key from `Eq + Hash`, if registered.
    pub equality_key: Option<LookUpKey>,
}

impl ProblemFactDescriptor {
    /// Creates a new ProblemFactDescriptor.
    pub fn new(type_name: &'static str, type_id: TypeId, solution_field: &'static str) -> Self {
        ProblemFactDescriptor {
            type_name,
            type_id,
            solution_field,
            extractor: None,
            planning_id_key: None,
            equality_key: None,
        }
    }

    /// Sets the extractor for this descriptor.
    pub fn with_extractor(mut self, extractor: Box<dyn EntityExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Registers [`PlanningId`] as the identity of this fact type.
    pub fn with_planning_id<F: PlanningId + 'static>(mut self) -> Self {
        self.planning_id_key = Some(LookUpKey::planning_id::<F>());
        self
    }

    /// Registers value equality as the identity of this fact type.
    pub fn with_equality_key<F: Eq + Hash + 'static>(mut self) -> Self {
        self.equality_key = Some(LookUpKey::equality::<F>());
        self
    }
}

impl Clone for ProblemFactDescriptor {
    fn clone(&self) -> Self {
        Self {
            type_name: self.type_name,
            type_id: self.type_id,
            solution_field: self.solution_field,
            extractor: self.extractor.clone(),
            planning_id_key: self.planning_id_key,
            equality_key: self.equality_key,
        }
    }
}

impl fmt::Debug for ProblemFactDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProblemFactDescriptor")
            .field("type_name", &self.type_name)
            .field("solution_field", &self.solution_field)
            .finish()
    }
}
