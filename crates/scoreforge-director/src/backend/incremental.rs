//! Delta-based backend driven by a user calculator.

use scoreforge_core::domain::{EntityPosition, VariableId};
use scoreforge_core::PlanningSolution;

use super::{BackendKind, ScoreBackend};
use crate::constraint_match::ConstraintMatchTotal;

/// User calculator that keeps a running score up to date.
///
/// The calculator receives every entity and variable hook. It must hold
/// enough state to retract the old contribution of an entity in a "before"
/// hook and add the new one in the matching "after" hook, so that
/// `calculate_score` only finalizes the accumulator.
///
/// Problem fact changes are not forwarded: the backend resets the calculator
/// from the whole working solution instead.
pub trait IncrementalScoreCalculator<S: PlanningSolution>: Send {
    /// Rebuilds all state from `solution`.
    fn reset_working_solution(&mut self, solution: &S, constraint_match_enabled: bool);

    fn before_entity_added(&mut self, _solution: &S, _entity: EntityPosition) {}

    fn after_entity_added(&mut self, solution: &S, entity: EntityPosition);

    fn before_variable_changed(&mut self, solution: &S, variable: VariableId, entity_index: usize);

    fn after_variable_changed(&mut self, solution: &S, variable: VariableId, entity_index: usize);

    fn before_entity_removed(&mut self, solution: &S, entity: EntityPosition);

    fn after_entity_removed(&mut self, _solution: &S, _entity: EntityPosition) {}

    fn calculate_score(&mut self) -> S::Score;

    /// Returns true if the calculator tracks constraint matches.
    fn supports_constraint_match(&self) -> bool {
        false
    }

    /// Returns the tracked constraint matches.
    fn constraint_match_totals(&self) -> Vec<ConstraintMatchTotal<S::Score>> {
        Vec::new()
    }
}

/// Backend forwarding every hook to an [`IncrementalScoreCalculator`].
pub struct IncrementalScoreBackend<S: PlanningSolution> {
    calculator: Box<dyn IncrementalScoreCalculator<S>>,
    constraint_match_enabled: bool,
}

impl<S: PlanningSolution> IncrementalScoreBackend<S> {
    pub fn new(calculator: Box<dyn IncrementalScoreCalculator<S>>) -> Self {
        Self {
            calculator,
            constraint_match_enabled: false,
        }
    }

    fn reset_calculator(&mut self, solution: &S) {
        self.calculator
            .reset_working_solution(solution, self.constraint_match_enabled);
    }
}

impl<S: PlanningSolution> ScoreBackend<S> for IncrementalScoreBackend<S> {
    fn kind(&self) -> BackendKind {
        BackendKind::Incremental
    }

    fn is_incremental(&self) -> bool {
        true
    }

    fn supports_constraint_match(&self) -> bool {
        self.calculator.supports_constraint_match()
    }

    fn reset_working_solution(&mut self, solution: &S, constraint_match_enabled: bool) {
        self.constraint_match_enabled = constraint_match_enabled;
        self.reset_calculator(solution);
    }

    fn before_entity_added(&mut self, solution: &S, entity: EntityPosition) {
        self.calculator.before_entity_added(solution, entity);
    }

    fn after_entity_added(&mut self, solution: &S, entity: EntityPosition) {
        self.calculator.after_entity_added(solution, entity);
    }

    fn before_variable_changed(&mut self, solution: &S, variable: VariableId, entity_index: usize) {
        self.calculator
            .before_variable_changed(solution, variable, entity_index);
    }

    fn after_variable_changed(&mut self, solution: &S, variable: VariableId, entity_index: usize) {
        self.calculator
            .after_variable_changed(solution, variable, entity_index);
    }

    fn before_entity_removed(&mut self, solution: &S, entity: EntityPosition) {
        self.calculator.before_entity_removed(solution, entity);
    }

    fn after_entity_removed(&mut self, solution: &S, entity: EntityPosition) {
        self.calculator.after_entity_removed(solution, entity);
    }

    fn after_problem_fact_added(&mut self, solution: &S, _descriptor_index: usize, _fact_index: usize) {
        self.reset_calculator(solution);
    }

    fn after_problem_fact_removed(&mut self, solution: &S, _descriptor_index: usize, _fact_index: usize) {
        self.reset_calculator(solution);
    }

    fn after_problem_property_changed(
        &mut self,
        solution: &S,
        _descriptor_index: usize,
        _fact_index: usize,
    ) {
        self.reset_calculator(solution);
    }

    fn calculate_score(&mut self, _solution: &S) -> S::Score {
        self.calculator.calculate_score()
    }

    fn constraint_match_totals(&self) -> Option<Vec<ConstraintMatchTotal<S::Score>>> {
        self.constraint_match_enabled
            .then(|| self.calculator.constraint_match_totals())
    }
}
