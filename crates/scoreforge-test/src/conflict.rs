//! Equal-values pair conflict fixtures.
//!
//! Each slot holds an integer value; every pair of slots with equal values
//! costs one point, and so does every slot whose value is forbidden by a
//! problem fact.
//!
//! # Example
//!
//! ```
//! use scoreforge_core::SimpleScore;
//! use scoreforge_test::conflict::{calculate_conflicts, ConflictSolution};
//!
//! let solution = ConflictSolution::with_values(&[1, 1, 2]);
//! assert_eq!(calculate_conflicts(&solution), SimpleScore::of(-1));
//! ```

use std::any::TypeId;

use scoreforge_core::domain::{
    EntityDescriptor, PlanningEntity, PlanningId, PlanningSolution, ProblemFact,
    ProblemFactDescriptor, SolutionDescriptor, TypedEntityExtractor, VariableDescriptor,
    VariableId,
};
use scoreforge_core::SimpleScore;

/// Handle of [`ValueSlot::value`] in [`create_conflict_descriptor`].
pub const VALUE_VARIABLE: VariableId = VariableId::new(0, 0);

/// A planning entity holding one integer value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValueSlot {
    pub id: usize,
    pub value: i64,
}

impl ValueSlot {
    pub fn new(id: usize, value: i64) -> Self {
        Self { id, value }
    }
}

impl PlanningEntity for ValueSlot {}

impl PlanningId for ValueSlot {
    type Id = usize;

    fn planning_id(&self) -> usize {
        self.id
    }
}

/// A value no slot may take.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Forbidden {
    pub value: i64,
}

impl ProblemFact for Forbidden {}

#[derive(Clone, Debug)]
pub struct ConflictSolution {
    pub slots: Vec<ValueSlot>,
    pub forbidden: Vec<Forbidden>,
    pub score: Option<SimpleScore>,
}

impl ConflictSolution {
    /// Creates slots with ids `0..values.len()`.
    pub fn with_values(values: &[i64]) -> Self {
        let slots = values
            .iter()
            .enumerate()
            .map(|(id, &value)| ValueSlot::new(id, value))
            .collect();
        Self {
            slots,
            forbidden: Vec::new(),
            score: None,
        }
    }

    pub fn values(&self) -> Vec<i64> {
        self.slots.iter().map(|s| s.value).collect()
    }
}

impl PlanningSolution for ConflictSolution {
    type Score = SimpleScore;

    fn score(&self) -> Option<Self::Score> {
        self.score
    }

    fn set_score(&mut self, score: Option<Self::Score>) {
        self.score = score;
    }
}

pub fn get_slots(s: &ConflictSolution) -> &Vec<ValueSlot> {
    &s.slots
}

pub fn get_slots_mut(s: &mut ConflictSolution) -> &mut Vec<ValueSlot> {
    &mut s.slots
}

pub fn get_forbidden(s: &ConflictSolution) -> &Vec<Forbidden> {
    &s.forbidden
}

pub fn get_forbidden_mut(s: &mut ConflictSolution) -> &mut Vec<Forbidden> {
    &mut s.forbidden
}

/// Counts equal pairs, plus slots holding a forbidden value.
pub fn calculate_conflicts(solution: &ConflictSolution) -> SimpleScore {
    let slots = &solution.slots;
    let mut conflicts = 0;
    for i in 0..slots.len() {
        for j in (i + 1)..slots.len() {
            if slots[i].value == slots[j].value {
                conflicts += 1;
            }
        }
    }
    for slot in slots {
        conflicts += solution
            .forbidden
            .iter()
            .filter(|f| f.value == slot.value)
            .count() as i64;
    }
    SimpleScore::of(-conflicts)
}

/// Descriptor with slots at entity index 0 and forbidden values at fact index 0.
///
/// Slots are looked up by planning id, forbidden values by equality.
pub fn create_conflict_descriptor() -> SolutionDescriptor {
    let slots = EntityDescriptor::new("ValueSlot", TypeId::of::<ValueSlot>(), "slots")
        .with_extractor(Box::new(TypedEntityExtractor::new(
            "ValueSlot",
            "slots",
            get_slots,
            get_slots_mut,
        )))
        .with_variable(VariableDescriptor::genuine("value"))
        .with_planning_id::<ValueSlot>();
    let forbidden = ProblemFactDescriptor::new("Forbidden", TypeId::of::<Forbidden>(), "forbidden")
        .with_extractor(Box::new(TypedEntityExtractor::new(
            "Forbidden",
            "forbidden",
            get_forbidden,
            get_forbidden_mut,
        )))
        .with_equality_key::<Forbidden>();

    SolutionDescriptor::new("ConflictSolution", TypeId::of::<ConflictSolution>())
        .with_entity(slots)
        .with_problem_fact(forbidden)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_pairs() {
        assert_eq!(
            calculate_conflicts(&ConflictSolution::with_values(&[1, 1, 2])),
            SimpleScore::of(-1)
        );
        assert_eq!(
            calculate_conflicts(&ConflictSolution::with_values(&[1, 3, 2])),
            SimpleScore::of(0)
        );
        assert_eq!(
            calculate_conflicts(&ConflictSolution::with_values(&[2, 2, 2])),
            SimpleScore::of(-3)
        );
    }

    #[test]
    fn test_forbidden_values() {
        let mut solution = ConflictSolution::with_values(&[1, 2, 2]);
        solution.forbidden.push(Forbidden { value: 2 });
        assert_eq!(calculate_conflicts(&solution), SimpleScore::of(-3));
    }

    #[test]
    fn test_descriptor() {
        let descriptor = create_conflict_descriptor();
        let solution = ConflictSolution::with_values(&[1, 2]);
        assert_eq!(descriptor.total_entity_count(&solution), Some(2));
        assert_eq!(descriptor.variable_id(0, "value").ok(), Some(VALUE_VARIABLE));
        assert!(descriptor.all_extractors_configured());
    }
}
