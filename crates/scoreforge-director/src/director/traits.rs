//! Score director trait definitions.

use std::any::Any;

use scoreforge_core::domain::{SolutionDescriptor, VariableId};
use scoreforge_core::PlanningSolution;

use crate::backend::BackendKind;
use crate::constraint_match::ConstraintMatchTotal;
use crate::error::Result;

/// The score director keeps a working solution and its score in sync.
///
/// Every change to the working solution is bracketed by a "before" and a
/// matching "after" notification, with the caller performing the change in
/// between through [`working_solution_mut`](Self::working_solution_mut).
/// Entities and facts are addressed by descriptor index and position;
/// after a removal, later objects of the collection shift down by one.
///
/// Out-of-order notifications fail with a protocol error and leave the
/// director corrupted.
pub trait ScoreDirector<S: PlanningSolution>: Send {
    /// Replaces the working solution; resets the backend, listeners and look-up index.
    fn set_working_solution(&mut self, solution: S) -> Result<()>;

    fn working_solution(&self) -> Result<&S>;

    /// Raw access for the change between a before and an after call.
    fn working_solution_mut(&mut self) -> Result<&mut S>;

    fn clone_working_solution(&self) -> Result<S>;

    fn solution_descriptor(&self) -> &SolutionDescriptor;

    /// Triggers the variable listeners and returns the score of the working
    /// solution, which is also stored on it.
    fn calculate_score(&mut self) -> Result<S::Score>;

    fn is_constraint_match_enabled(&self) -> bool;

    /// Returns the breakdown behind the last calculated score.
    ///
    /// Fails with [`ConstraintMatchDisabled`](crate::ScoreDirectorError::ConstraintMatchDisabled)
    /// unless constraint match is enabled.
    fn constraint_match_totals(&self) -> Result<Vec<ConstraintMatchTotal<S::Score>>>;

    /// `entity_index` is where the entity will sit once inserted.
    fn before_entity_added(&mut self, descriptor_index: usize, entity_index: usize) -> Result<()>;

    fn after_entity_added(&mut self, descriptor_index: usize, entity_index: usize) -> Result<()>;

    fn before_variable_changed(
        &mut self,
        descriptor_index: usize,
        entity_index: usize,
        variable_name: &str,
    ) -> Result<()>;

    fn after_variable_changed(
        &mut self,
        descriptor_index: usize,
        entity_index: usize,
        variable_name: &str,
    ) -> Result<()>;

    fn before_entity_removed(&mut self, descriptor_index: usize, entity_index: usize) -> Result<()>;

    /// `entity_index` is where the removed entity sat.
    fn after_entity_removed(&mut self, descriptor_index: usize, entity_index: usize) -> Result<()>;

    /// Runs the variable listeners on every queued notification.
    ///
    /// Fails if a before call awaits its after call.
    fn trigger_variable_listeners(&mut self) -> Result<()>;

    fn before_problem_fact_added(&mut self, descriptor_index: usize, fact_index: usize)
        -> Result<()>;

    fn after_problem_fact_added(&mut self, descriptor_index: usize, fact_index: usize)
        -> Result<()>;

    fn before_problem_fact_removed(
        &mut self,
        descriptor_index: usize,
        fact_index: usize,
    ) -> Result<()>;

    fn after_problem_fact_removed(
        &mut self,
        descriptor_index: usize,
        fact_index: usize,
    ) -> Result<()>;

    fn before_problem_property_changed(
        &mut self,
        descriptor_index: usize,
        fact_index: usize,
    ) -> Result<()>;

    fn after_problem_property_changed(
        &mut self,
        descriptor_index: usize,
        fact_index: usize,
    ) -> Result<()>;

    /// Finds the working object equivalent to `external`.
    ///
    /// Prefer the typed [`look_up_working_object`](crate::ScoreDirectorExt::look_up_working_object).
    fn look_up_erased(&self, external: &dyn Any, type_name: &'static str) -> Result<&dyn Any>;

    fn look_up_erased_mut(
        &mut self,
        external: &dyn Any,
        type_name: &'static str,
    ) -> Result<&mut dyn Any>;

    /// Returns true if `calculate_score` costs less than a full recalculation.
    fn is_incremental(&self) -> bool;

    /// Releases the backend and the listeners. Calling it again does nothing;
    /// every other operation fails afterwards.
    fn dispose(&mut self);
}

/// Score director surface for solver internals.
///
/// Adds notifications by variable handle, which skip the name resolution of
/// the public surface.
pub trait InnerScoreDirector<S: PlanningSolution>: ScoreDirector<S> {
    fn before_variable_changed_by_id(
        &mut self,
        variable: VariableId,
        entity_index: usize,
    ) -> Result<()>;

    fn after_variable_changed_by_id(
        &mut self,
        variable: VariableId,
        entity_index: usize,
    ) -> Result<()>;

    /// Brackets `assign` with before/after notifications and triggers the
    /// variable listeners.
    fn change_variable_facade(
        &mut self,
        variable: VariableId,
        entity_index: usize,
        assign: &mut dyn FnMut(&mut S),
    ) -> Result<()> {
        self.before_variable_changed_by_id(variable, entity_index)?;
        assign(self.working_solution_mut()?);
        self.after_variable_changed_by_id(variable, entity_index)?;
        self.trigger_variable_listeners()
    }

    /// Number of `calculate_score` calls that reached the backend.
    fn calculation_count(&self) -> u64;

    fn backend_kind(&self) -> BackendKind;
}
