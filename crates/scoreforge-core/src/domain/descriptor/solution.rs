//! Solution descriptor.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use super::{EntityDescriptor, ProblemFactDescriptor, VariableDescriptor};
use crate::domain::entity_ref::EntityExtractor;
use crate::domain::variable::VariableId;
use crate::error::ScoreForgeError;

/// Which kind of collection a descriptor index refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CollectionKind {
    /// A planning entity collection.
    Entity,
    /// A problem fact collection.
    ProblemFact,
}

impl CollectionKind {
    pub fn label(self) -> &'static str {
        match self {
            CollectionKind::Entity => "entity",
            CollectionKind::ProblemFact => "problem fact",
        }
    }
}

/// Describes a planning solution at runtime.
///
/// Contains metadata about:
/// - Entity collections and their variables
/// - Problem fact collections
/// - Which descriptor owns each object type
pub struct SolutionDescriptor {
    /// Name of the solution type.
    pub type_name: &'static str,
    /// TypeId of the solution type.
    pub type_id: TypeId,
    /// Descriptors for all entity collections in this solution.
    pub entity_descriptors: Vec<EntityDescriptor>,
    /// Descriptors for all problem fact collections.
    pub problem_fact_descriptors: Vec<ProblemFactDescriptor>,
    entity_type_index: HashMap<TypeId, usize>,
    fact_type_index: HashMap<TypeId, usize>,
}

impl SolutionDescriptor {
    /// Creates a new SolutionDescriptor.
    pub fn new(type_name: &'static str, type_id: TypeId) -> Self {
        SolutionDescriptor {
            type_name,
            type_id,
            entity_descriptors: Vec::new(),
            problem_fact_descriptors: Vec::new(),
            entity_type_index: HashMap::new(),
            fact_type_index: HashMap::new(),
        }
    }

    /// Adds an entity descriptor and indexes it by TypeId for O(1) lookup.
    pub fn with_entity(mut self, descriptor: EntityDescriptor) -> Self {
        let index = self.entity_descriptors.len();
        self.entity_type_index.insert(descriptor.type_id, index);
        self.entity_descriptors.push(descriptor);
        self
    }

    /// Adds a problem fact descriptor and indexes it by TypeId.
    pub fn with_problem_fact(mut self, descriptor: ProblemFactDescriptor) -> Self {
        let index = self.problem_fact_descriptors.len();
        self.fact_type_index.insert(descriptor.type_id, index);
        self.problem_fact_descriptors.push(descriptor);
        self
    }

    /// Finds an entity descriptor by type name.
    pub fn find_entity_descriptor(&self, type_name: &str) -> Option<&EntityDescriptor> {
        self.entity_descriptors
            .iter()
            .find(|d| d.type_name == type_name)
    }

    /// Finds an entity descriptor by type ID (O(1) lookup).
    pub fn find_entity_descriptor_by_type(&self, type_id: TypeId) -> Option<&EntityDescriptor> {
        self.entity_type_index
            .get(&type_id)
            .and_then(|&idx| self.entity_descriptors.get(idx))
    }

    /// Returns the collection that holds objects of the given type.
    ///
    /// Entity collections take precedence over fact collections.
    pub fn locate_type(&self, type_id: TypeId) -> Option<(CollectionKind, usize)> {
        if let Some(&idx) = self.entity_type_index.get(&type_id) {
            return Some((CollectionKind::Entity, idx));
        }
        self.fact_type_index
            .get(&type_id)
            .map(|&idx| (CollectionKind::ProblemFact, idx))
    }

    /// Returns the entity descriptor at `index`.
    pub fn entity_descriptor(&self, index: usize) -> Result<&EntityDescriptor, ScoreForgeError> {
        self.entity_descriptors
            .get(index)
            .ok_or(ScoreForgeError::UnknownDescriptor {
                kind: CollectionKind::Entity.label(),
                index,
            })
    }

    /// Returns the problem fact descriptor at `index`.
    pub fn problem_fact_descriptor(
        &self,
        index: usize,
    ) -> Result<&ProblemFactDescriptor, ScoreForgeError> {
        self.problem_fact_descriptors
            .get(index)
            .ok_or(ScoreForgeError::UnknownDescriptor {
                kind: CollectionKind::ProblemFact.label(),
                index,
            })
    }

    /// Returns the type name of the objects in a collection.
    pub fn collection_type_name(
        &self,
        kind: CollectionKind,
        index: usize,
    ) -> Result<&'static str, ScoreForgeError> {
        match kind {
            CollectionKind::Entity => self.entity_descriptor(index).map(|d| d.type_name),
            CollectionKind::ProblemFact => {
                self.problem_fact_descriptor(index).map(|d| d.type_name)
            }
        }
    }

    /// Returns the extractor of a collection.
    pub fn extractor(
        &self,
        kind: CollectionKind,
        index: usize,
    ) -> Result<&dyn EntityExtractor, ScoreForgeError> {
        let (extractor, type_name) = match kind {
            CollectionKind::Entity => {
                let d = self.entity_descriptor(index)?;
                (d.extractor.as_deref(), d.type_name)
            }
            CollectionKind::ProblemFact => {
                let d = self.problem_fact_descriptor(index)?;
                (d.extractor.as_deref(), d.type_name)
            }
        };
        extractor.ok_or_else(|| {
            ScoreForgeError::DomainModel(format!("{} has no extractor configured", type_name))
        })
    }

    /// Resolves a variable name on an entity descriptor to its handle.
    pub fn variable_id(
        &self,
        descriptor_index: usize,
        variable_name: &str,
    ) -> Result<VariableId, ScoreForgeError> {
        let descriptor = self.entity_descriptor(descriptor_index)?;
        descriptor
            .variable_index(variable_name)
            .map(|variable_index| VariableId::new(descriptor_index, variable_index))
            .ok_or_else(|| ScoreForgeError::UnknownVariable {
                entity: descriptor.type_name,
                variable: variable_name.to_string(),
            })
    }

    /// Returns the variable descriptor behind a handle.
    pub fn variable_descriptor(
        &self,
        variable: VariableId,
    ) -> Result<&VariableDescriptor, ScoreForgeError> {
        let descriptor = self.entity_descriptor(variable.descriptor_index)?;
        descriptor
            .variable_descriptors
            .get(variable.variable_index)
            .ok_or_else(|| ScoreForgeError::UnknownVariable {
                entity: descriptor.type_name,
                variable: format!("#{}", variable.variable_index),
            })
    }

    /// Returns all genuine variable descriptors across all entities.
    pub fn genuine_variable_descriptors(&self) -> Vec<&VariableDescriptor> {
        self.entity_descriptors
            .iter()
            .flat_map(|e| e.genuine_variable_descriptors())
            .collect()
    }

    /// Returns all shadow variable descriptors across all entities.
    pub fn shadow_variable_descriptors(&self) -> Vec<&VariableDescriptor> {
        self.entity_descriptors
            .iter()
            .flat_map(|e| e.shadow_variable_descriptors())
            .collect()
    }

    /// Returns the number of objects in a collection.
    pub fn object_count(&self, solution: &dyn Any, kind: CollectionKind, index: usize) -> Option<usize> {
        self.extractor(kind, index).ok()?.count(solution)
    }

    /// Returns the total number of entities across all entity collections.
    ///
    /// Returns `None` if any entity descriptor lacks an extractor or the solution
    /// type doesn't match.
    pub fn total_entity_count(&self, solution: &dyn Any) -> Option<usize> {
        let mut total = 0;
        for desc in &self.entity_descriptors {
            total += desc.entity_count(solution)?;
        }
        Some(total)
    }

    /// Gets an entity by descriptor index and entity index.
    pub fn get_entity<'a>(
        &self,
        solution: &'a dyn Any,
        descriptor_index: usize,
        entity_index: usize,
    ) -> Option<&'a dyn Any> {
        self.entity_descriptors
            .get(descriptor_index)?
            .get_entity(solution, entity_index)
    }

    /// Gets a mutable entity by descriptor index and entity index.
    pub fn get_entity_mut<'a>(
        &self,
        solution: &'a mut dyn Any,
        descriptor_index: usize,
        entity_index: usize,
    ) -> Option<&'a mut dyn Any> {
        self.entity_descriptors
            .get(descriptor_index)?
            .get_entity_mut(solution, entity_index)
    }

    /// Returns the number of entity descriptors.
    pub fn entity_descriptor_count(&self) -> usize {
        self.entity_descriptors.len()
    }

    /// Returns the number of problem fact descriptors.
    pub fn problem_fact_descriptor_count(&self) -> usize {
        self.problem_fact_descriptors.len()
    }

    /// Returns whether every entity and fact descriptor has an extractor.
    pub fn all_extractors_configured(&self) -> bool {
        self.entity_descriptors.iter().all(|d| d.has_extractor())
            && self
                .problem_fact_descriptors
                .iter()
                .all(|d| d.extractor.is_some())
    }
}

impl Clone for SolutionDescriptor {
    fn clone(&self) -> Self {
        Self {
            type_name: self.type_name,
            type_id: self.type_id,
            entity_descriptors: self.entity_descriptors.clone(),
            problem_fact_descriptors: self.problem_fact_descriptors.clone(),
            entity_type_index: self.entity_type_index.clone(),
            fact_type_index: self.fact_type_index.clone(),
        }
    }
}

impl fmt::Debug for SolutionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolutionDescriptor")
            .field("type_name", &self.type_name)
            .field("entities", &self.entity_descriptors.len())
            .field("problem_facts", &self.problem_fact_descriptors.len())
            .finish()
    }
}
