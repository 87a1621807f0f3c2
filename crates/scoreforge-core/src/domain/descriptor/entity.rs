//! Entity descriptor.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::Hash;

use super::VariableDescriptor;
use crate::domain::entity_ref::EntityExtractor;
use crate::domain::lookup::LookUpKey;
use crate::domain::traits::PlanningId;

/// Describes a planning entity type at runtime.
pub struct EntityDescriptor {
    /// Name of the entity type.
    pub type_name: &'static str,
    /// TypeId of the entity type.
    pub type_id: TypeId,
    /// Field name of the entity collection in the solution.
    pub solution_field: &'static str,
    /// Variable descriptors for this entity, addressed by position.
    pub variable_descriptors: Vec<VariableDescriptor>,
    /// Extractor for getting entities from a solution.
    pub extractor: Option<Box<dyn EntityExtractor>>,
    /// Identity key from [`PlanningId`], if registered.
    pub planning_id_key: Option<LookUpKey>,
    /// Identity key from `Eq + Hash`, if registered.
    pub equality_key: Option<LookUpKey>,
}

impl EntityDescriptor {
    /// Creates a new EntityDescriptor.
    pub fn new(type_name: &'static str, type_id: TypeId, solution_field: &'static str) -> Self {
        EntityDescriptor {
            type_name,
            type_id,
            solution_field,
            variable_descriptors: Vec::new(),
            extractor: None,
            planning_id_key: None,
            equality_key: None,
        }
    }

    /// Sets the entity extractor for this descriptor.
    pub fn with_extractor(mut self, extractor: Box<dyn EntityExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Adds a variable descriptor.
    pub fn with_variable(mut self, descriptor: VariableDescriptor) -> Self {
        self.variable_descriptors.push(descriptor);
        self
    }

    /// Registers [`PlanningId`] as the identity of this entity type.
    pub fn with_planning_id<E: PlanningId + 'static>(mut self) -> Self {
        self.planning_id_key = Some(LookUpKey::planning_id::<E>());
        self
    }

    /// Registers value equality as the identity of this entity type.
    pub fn with_equality_key<E: Eq + Hash + 'static>(mut self) -> Self {
        self.equality_key = Some(LookUpKey::equality::<E>());
        self
    }

    /// Returns genuine (non-shadow) variable descriptors.
    pub fn genuine_variable_descriptors(&self) -> impl Iterator<Item = &VariableDescriptor> {
        self.variable_descriptors
            .iter()
            .filter(|v| v.variable_type.is_genuine())
    }

    /// Returns shadow variable descriptors.
    pub fn shadow_variable_descriptors(&self) -> impl Iterator<Item = &VariableDescriptor> {
        self.variable_descriptors
            .iter()
            .filter(|v| v.variable_type.is_shadow())
    }

    /// Finds a variable descriptor by name.
    pub fn find_variable(&self, name: &str) -> Option<&VariableDescriptor> {
        self.variable_descriptors.iter().find(|v| v.name == name)
    }

    /// Returns the position of a variable by name.
    pub fn variable_index(&self, name: &str) -> Option<usize> {
        self.variable_descriptors.iter().position(|v| v.name == name)
    }

    /// Returns whether this descriptor has an entity extractor.
    pub fn has_extractor(&self) -> bool {
        self.extractor.is_some()
    }

    /// Returns the number of entities in the solution.
    ///
    /// Returns `None` if no extractor is set or solution type doesn't match.
    pub fn entity_count(&self, solution: &dyn Any) -> Option<usize> {
        self.extractor.as_ref()?.count(solution)
    }

    /// Gets a reference to an entity by index.
    pub fn get_entity<'a>(&self, solution: &'a dyn Any, index: usize) -> Option<&'a dyn Any> {
        self.extractor.as_ref()?.get(solution, index)
    }

    /// Gets a mutable reference to an entity by index.
    pub fn get_entity_mut<'a>(
        &self,
        solution: &'a mut dyn Any,
        index: usize,
    ) -> Option<&'a mut dyn Any> {
        self.extractor.as_ref()?.get_mut(solution, index)
    }
}

impl Clone for EntityDescriptor {
    fn clone(&self) -> Self {
        Self {
            type_name: self.type_name,
            type_id: self.type_id,
            solution_field: self.solution_field,
            variable_descriptors: self.variable_descriptors.clone(),
            extractor: self.extractor.clone(),
            planning_id_key: self.planning_id_key,
            equality_key: self.equality_key,
        }
    }
}

impl fmt::Debug for EntityDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityDescriptor")
            .field("type_name", &self.type_name)
            .field("solution_field", &self.solution_field)
            .field("variables", &self.variable_descriptors.len())
            .field("planning_id", &self.planning_id_key.is_some())
            .finish()
    }
}
