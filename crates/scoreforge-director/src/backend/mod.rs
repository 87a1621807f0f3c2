//! Score calculation backends.
//!
//! A score director composes one backend with the shared listener and
//! look-up infrastructure. Every backend sees the same before/after hooks
//! and must produce the same score for the same working solution:
//!
//! - [`EasyScoreBackend`] - Full recalculation (baseline and test oracle)
//! - [`IncrementalScoreBackend`] - Delta updates by a user calculator
//! - [`RuleEngineScoreBackend`] - Working memory of a rule session

mod easy;
mod incremental;
mod rule;

pub use easy::{EasyScoreBackend, EasyScoreCalculator};
pub use incremental::{IncrementalScoreBackend, IncrementalScoreCalculator};
pub use rule::RuleEngineScoreBackend;

use scoreforge_core::domain::{EntityPosition, VariableId};
use scoreforge_core::PlanningSolution;

use crate::constraint_match::ConstraintMatchTotal;

/// Which backend a director or factory uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Easy,
    Incremental,
    RuleEngine,
}

impl BackendKind {
    pub fn label(self) -> &'static str {
        match self {
            BackendKind::Easy => "easy",
            BackendKind::Incremental => "incremental",
            BackendKind::RuleEngine => "rule_engine",
        }
    }
}

/// Capability set a score director delegates score calculation to.
///
/// Hooks receive the working solution in its state at the moment of the
/// notification: "before" hooks see the old state, "after" hooks the new one.
/// Entities and facts are addressed by descriptor index and position; after a
/// removal, later objects of the collection shift down by one.
pub trait ScoreBackend<S: PlanningSolution>: Send {
    fn kind(&self) -> BackendKind;

    /// Returns true if `calculate_score` costs less than a full recalculation.
    fn is_incremental(&self) -> bool;

    /// Returns true if this backend can produce constraint match totals.
    fn supports_constraint_match(&self) -> bool;

    /// Starts tracking a new working solution from scratch.
    fn reset_working_solution(&mut self, solution: &S, constraint_match_enabled: bool);

    fn before_entity_added(&mut self, _solution: &S, _entity: EntityPosition) {}

    fn after_entity_added(&mut self, _solution: &S, _entity: EntityPosition) {}

    fn before_variable_changed(
        &mut self,
        _solution: &S,
        _variable: VariableId,
        _entity_index: usize,
    ) {
    }

    fn after_variable_changed(
        &mut self,
        _solution: &S,
        _variable: VariableId,
        _entity_index: usize,
    ) {
    }

    fn before_entity_removed(&mut self, _solution: &S, _entity: EntityPosition) {}

    fn after_entity_removed(&mut self, _solution: &S, _entity: EntityPosition) {}

    fn before_problem_fact_added(
        &mut self,
        _solution: &S,
        _descriptor_index: usize,
        _fact_index: usize,
    ) {
    }

    fn after_problem_fact_added(
        &mut self,
        _solution: &S,
        _descriptor_index: usize,
        _fact_index: usize,
    ) {
    }

    fn before_problem_fact_removed(
        &mut self,
        _solution: &S,
        _descriptor_index: usize,
        _fact_index: usize,
    ) {
    }

    fn after_problem_fact_removed(
        &mut self,
        _solution: &S,
        _descriptor_index: usize,
        _fact_index: usize,
    ) {
    }

    fn before_problem_property_changed(
        &mut self,
        _solution: &S,
        _descriptor_index: usize,
        _fact_index: usize,
    ) {
    }

    fn after_problem_property_changed(
        &mut self,
        _solution: &S,
        _descriptor_index: usize,
        _fact_index: usize,
    ) {
    }

    /// Returns the score of the working solution after all reported changes.
    fn calculate_score(&mut self, solution: &S) -> S::Score;

    /// Returns the breakdown computed by the last `calculate_score`.
    ///
    /// `None` if constraint match was not enabled at the last reset.
    fn constraint_match_totals(&self) -> Option<Vec<ConstraintMatchTotal<S::Score>>>;

    /// Releases backend resources; the backend is reset before any reuse.
    fn dispose(&mut self) {}
}
