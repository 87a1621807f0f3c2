use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;

use smallvec::SmallVec;

use super::{LookUpError, LookUpKey, LookUpStrategy, LookUpStrategyType};
use crate::domain::descriptor::{CollectionKind, SolutionDescriptor};
use crate::domain::entity_ref::EntityExtractor;
use crate::error::ScoreForgeError;

/// Where a looked-up working object lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectLocation {
    pub kind: CollectionKind,
    pub descriptor_index: usize,
    pub index: usize,
}

#[derive(Debug, Clone, Copy)]
struct TypeLookUp {
    type_name: &'static str,
    kind: CollectionKind,
    descriptor_index: usize,
    strategy: LookUpStrategy,
}

struct KeyRegistration {
    type_name: &'static str,
    type_id: TypeId,
    planning_id: Option<LookUpKey>,
    equality: Option<LookUpKey>,
    has_extractor: bool,
}

impl KeyRegistration {
    // The first descriptor of a type wins; entities are registered before facts.
    fn register(
        self,
        types: &mut HashMap<TypeId, TypeLookUp>,
        strategy_type: LookUpStrategyType,
        kind: CollectionKind,
        descriptor_index: usize,
    ) -> Result<(), ScoreForgeError> {
        for key in self.planning_id.iter().chain(self.equality.iter()) {
            if key.type_id() != Some(self.type_id) {
                return Err(ScoreForgeError::DomainModel(format!(
                    "look-up key registered on {} belongs to another type",
                    self.type_name
                )));
            }
        }
        let strategy = strategy_type.resolve(self.type_name, self.planning_id, self.equality)?;
        if strategy.is_supported() && !self.has_extractor {
            return Err(ScoreForgeError::DomainModel(format!(
                "{} supports look-up but has no extractor configured",
                self.type_name
            )));
        }
        types.entry(self.type_id).or_insert(TypeLookUp {
            type_name: self.type_name,
            kind,
            descriptor_index,
            strategy,
        });
        Ok(())
    }
}

/// Hash buckets of working object positions for one collection.
#[derive(Debug, Default)]
struct LookUpIndex {
    buckets: HashMap<u64, SmallVec<[usize; 1]>>,
}

/// Maps external objects onto the working solution of one score director.
///
/// Strategies are resolved per object type when the manager is created.
/// Indexes are built per collection on the first look-up that needs them
/// and are dropped when the collection or the whole working solution changes.
#[derive(Debug)]
pub struct LookUpManager {
    strategy_type: LookUpStrategyType,
    types: HashMap<TypeId, TypeLookUp>,
    indexes: RefCell<HashMap<(CollectionKind, usize), LookUpIndex>>,
}

impl LookUpManager {
    /// Creates a manager for every entity and fact type of the descriptor.
    ///
    /// Fails when a registered key belongs to another type than its
    /// descriptor, when a supported type has no extractor, or when the
    /// strategy type is [`LookUpStrategyType::PlanningIdOrFailFast`] and a
    /// type has no planning id.
    pub fn new(
        strategy_type: LookUpStrategyType,
        descriptor: &SolutionDescriptor,
    ) -> Result<Self, ScoreForgeError> {
        let mut types = HashMap::new();
        for (index, d) in descriptor.entity_descriptors.iter().enumerate() {
            let registration = KeyRegistration {
                type_name: d.type_name,
                type_id: d.type_id,
                planning_id: d.planning_id_key,
                equality: d.equality_key,
                has_extractor: d.has_extractor(),
            };
            registration.register(&mut types, strategy_type, CollectionKind::Entity, index)?;
        }
        for (index, d) in descriptor.problem_fact_descriptors.iter().enumerate() {
            let registration = KeyRegistration {
                type_name: d.type_name,
                type_id: d.type_id,
                planning_id: d.planning_id_key,
                equality: d.equality_key,
                has_extractor: d.extractor.is_some(),
            };
            registration.register(&mut types, strategy_type, CollectionKind::ProblemFact, index)?;
        }

        Ok(Self {
            strategy_type,
            types,
            indexes: RefCell::new(HashMap::new()),
        })
    }

    pub fn strategy_type(&self) -> LookUpStrategyType {
        self.strategy_type
    }

    /// Returns the resolved strategy of a type, `None` if the type is unknown.
    pub fn strategy_of(&self, type_id: TypeId) -> Option<LookUpStrategy> {
        self.types.get(&type_id).map(|t| t.strategy)
    }

    /// Drops every index; called when the working solution is replaced.
    pub fn reset_working_solution(&mut self) {
        self.indexes.get_mut().clear();
    }

    /// Drops the index of one collection after an object was added or removed.
    pub fn invalidate(&mut self, kind: CollectionKind, descriptor_index: usize) {
        self.indexes.get_mut().remove(&(kind, descriptor_index));
    }

    /// Returns the number of collections with a built index.
    pub fn built_index_count(&self) -> usize {
        self.indexes.borrow().len()
    }

    /// Finds the working object equivalent to `external`.
    ///
    /// `type_name` is only used in errors for types unknown to the descriptor.
    /// Failures are checked in order: unsupported type, duplicate identity
    /// while building the index, then not found.
    pub fn look_up(
        &self,
        descriptor: &SolutionDescriptor,
        solution: &dyn Any,
        external: &dyn Any,
        type_name: &'static str,
    ) -> Result<ObjectLocation, LookUpError> {
        let type_id = <dyn Any as Any>::type_id(external);
        let unsupported = LookUpError::UnsupportedType {
            type_name,
            strategy_type: self.strategy_type,
        };
        let Some(entry) = self.types.get(&type_id) else {
            return Err(unsupported);
        };
        let Some(key) = entry.strategy.key() else {
            return Err(LookUpError::UnsupportedType {
                type_name: entry.type_name,
                strategy_type: self.strategy_type,
            });
        };
        let not_found = LookUpError::NotFound {
            type_name: entry.type_name,
        };
        let Ok(extractor) = descriptor.extractor(entry.kind, entry.descriptor_index) else {
            return Err(not_found);
        };
        let Some(hash) = key.hash(external) else {
            return Err(not_found);
        };

        let mut indexes = self.indexes.borrow_mut();
        let slot = (entry.kind, entry.descriptor_index);
        if !indexes.contains_key(&slot) {
            let index = build_index(&key, extractor, solution, entry.type_name)?;
            indexes.insert(slot, index);
        }
        let candidates = indexes
            .get(&slot)
            .and_then(|index| index.buckets.get(&hash))
            .into_iter()
            .flatten();
        for &candidate in candidates {
            let Some(working) = extractor.get(solution, candidate) else {
                continue;
            };
            if key.matches(working, external) {
                return Ok(ObjectLocation {
                    kind: entry.kind,
                    descriptor_index: entry.descriptor_index,
                    index: candidate,
                });
            }
        }
        Err(not_found)
    }
}

fn build_index(
    key: &LookUpKey,
    extractor: &dyn EntityExtractor,
    solution: &dyn Any,
    type_name: &'static str,
) -> Result<LookUpIndex, LookUpError> {
    let mut index = LookUpIndex::default();
    let count = extractor.count(solution).unwrap_or(0);
    for position in 0..count {
        let Some(object) = extractor.get(solution, position) else {
            continue;
        };
        let Some(hash) = key.hash(object) else {
            continue;
        };
        let bucket = index.buckets.entry(hash).or_default();
        for &existing in bucket.iter() {
            let duplicate = extractor
                .get(solution, existing)
                .is_some_and(|other| key.matches(other, object));
            if duplicate {
                return Err(LookUpError::DuplicateId {
                    type_name,
                    first: existing,
                    second: position,
                });
            }
        }
        bucket.push(position);
    }
    Ok(index)
}
