//! The score director shared by every backend.

use std::any::Any;
use std::sync::Arc;

use scoreforge_config::EnvironmentMode;
use scoreforge_core::domain::{CollectionKind, EntityPosition, SolutionDescriptor, VariableId};
use scoreforge_core::{LookUpError, LookUpManager, PlanningSolution, ScoreForgeError};
use tracing::{debug, trace};

use super::listener_support::VariableListenerSupport;
use super::state::{Notification, ProtocolState};
use super::traits::{InnerScoreDirector, ScoreDirector};
use crate::backend::{BackendKind, EasyScoreCalculator, ScoreBackend};
use crate::constraint_match::ConstraintMatchTotal;
use crate::error::{Result, ScoreDirectorError};

fn missing_solution() -> ScoreDirectorError {
    ScoreDirectorError::Protocol("no working solution has been set".to_string())
}

struct ScoreAssertion<S: PlanningSolution> {
    calculator: Arc<dyn EasyScoreCalculator<S>>,
    mode: EnvironmentMode,
}

/// Score director composed of a backend, a variable listener chain and an
/// optional look-up manager.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use scoreforge_core::SimpleScore;
/// use scoreforge_director::backend::EasyScoreBackend;
/// use scoreforge_director::{DefaultScoreDirector, ScoreDirector};
/// use scoreforge_test::conflict::{calculate_conflicts, create_conflict_descriptor, ConflictSolution};
///
/// let backend = EasyScoreBackend::<ConflictSolution>::new(Arc::new(calculate_conflicts));
/// let mut director = DefaultScoreDirector::new(Arc::new(create_conflict_descriptor()), Box::new(backend));
/// director.set_working_solution(ConflictSolution::with_values(&[1, 1, 2])).unwrap();
///
/// director.before_variable_changed(0, 1, "value").unwrap();
/// director.working_solution_mut().unwrap().slots[1].value = 3;
/// director.after_variable_changed(0, 1, "value").unwrap();
///
/// assert_eq!(director.calculate_score().unwrap(), SimpleScore::of(0));
/// ```
pub struct DefaultScoreDirector<S: PlanningSolution> {
    descriptor: Arc<SolutionDescriptor>,
    backend: Box<dyn ScoreBackend<S>>,
    listeners: VariableListenerSupport<S>,
    look_up: Option<LookUpManager>,
    solution: Option<S>,
    protocol: ProtocolState,
    constraint_match_enabled: bool,
    score_cache: Option<S::Score>,
    assertion: Option<ScoreAssertion<S>>,
    calculation_count: u64,
}

impl<S: PlanningSolution> DefaultScoreDirector<S> {
    /// Creates a director without listeners, look-up or constraint match.
    pub fn new(descriptor: Arc<SolutionDescriptor>, backend: Box<dyn ScoreBackend<S>>) -> Self {
        Self {
            descriptor,
            backend,
            listeners: VariableListenerSupport::new(),
            look_up: None,
            solution: None,
            protocol: ProtocolState::new(),
            constraint_match_enabled: false,
            score_cache: None,
            assertion: None,
            calculation_count: 0,
        }
    }

    pub fn with_listeners(mut self, listeners: VariableListenerSupport<S>) -> Self {
        self.listeners = listeners;
        self
    }

    pub fn with_look_up(mut self, manager: LookUpManager) -> Self {
        self.look_up = Some(manager);
        self
    }

    /// Enables constraint match if the backend supports it.
    pub fn with_constraint_match(mut self, enabled: bool) -> Self {
        self.constraint_match_enabled = enabled && self.backend.supports_constraint_match();
        self
    }

    /// Compares every calculated score with `calculator` in assertion modes.
    pub fn with_assertion(
        mut self,
        calculator: Arc<dyn EasyScoreCalculator<S>>,
        mode: EnvironmentMode,
    ) -> Self {
        self.assertion = mode
            .is_asserted()
            .then_some(ScoreAssertion { calculator, mode });
        self
    }

    pub fn listener_support(&self) -> &VariableListenerSupport<S> {
        &self.listeners
    }

    pub fn look_up_manager(&self) -> Option<&LookUpManager> {
        self.look_up.as_ref()
    }

    pub fn environment_mode(&self) -> EnvironmentMode {
        self.assertion
            .as_ref()
            .map_or(EnvironmentMode::NonReproducible, |a| a.mode)
    }

    /// Returns the before notification awaiting its after call.
    pub fn pending_notification(&self) -> Option<Notification> {
        self.protocol.pending()
    }

    pub fn is_disposed(&self) -> bool {
        self.protocol.is_disposed()
    }

    pub fn is_corrupted(&self) -> bool {
        self.protocol.is_corrupted()
    }

    pub(crate) fn descriptor_arc(&self) -> &Arc<SolutionDescriptor> {
        &self.descriptor
    }

    fn solution_ref(&self) -> Result<&S> {
        self.protocol.ensure_ready()?;
        self.solution.as_ref().ok_or_else(missing_solution)
    }

    fn check_index(
        &self,
        kind: CollectionKind,
        descriptor_index: usize,
        index: usize,
        allow_end: bool,
    ) -> Result<()> {
        let solution = self.solution_ref()?;
        let extractor = self.descriptor.extractor(kind, descriptor_index)?;
        let type_name = self.descriptor.collection_type_name(kind, descriptor_index)?;
        let count = extractor.count(solution as &dyn Any).ok_or_else(|| {
            ScoreForgeError::DomainModel(format!(
                "extractor of {} does not match the solution type",
                type_name
            ))
        })?;
        let valid = if allow_end { index <= count } else { index < count };
        if valid {
            Ok(())
        } else {
            Err(ScoreDirectorError::UnknownObject { type_name, index })
        }
    }

    fn before(&mut self, notification: Notification) -> Result<()> {
        self.protocol.begin(notification)?;
        trace!(notification = %notification, "Before notification");
        self.score_cache = None;
        let solution = self.solution.as_ref().ok_or_else(missing_solution)?;
        match notification {
            Notification::EntityAdded(entity) => {
                self.listeners.before_entity_added(solution, entity);
                self.backend.before_entity_added(solution, entity);
            }
            Notification::VariableChanged {
                variable,
                entity_index,
            } => {
                self.listeners
                    .before_variable_changed(solution, variable, entity_index);
                self.backend
                    .before_variable_changed(solution, variable, entity_index);
            }
            Notification::EntityRemoved(entity) => {
                self.listeners.before_entity_removed(solution, entity);
                self.backend.before_entity_removed(solution, entity);
            }
            Notification::ProblemFactAdded {
                descriptor_index,
                fact_index,
            } => self
                .backend
                .before_problem_fact_added(solution, descriptor_index, fact_index),
            Notification::ProblemFactRemoved {
                descriptor_index,
                fact_index,
            } => self
                .backend
                .before_problem_fact_removed(solution, descriptor_index, fact_index),
            Notification::ProblemPropertyChanged {
                descriptor_index,
                fact_index,
            } => self
                .backend
                .before_problem_property_changed(solution, descriptor_index, fact_index),
        }
        Ok(())
    }

    fn after(&mut self, notification: Notification) -> Result<()> {
        self.protocol.end(notification)?;
        trace!(notification = %notification, "After notification");
        self.score_cache = None;
        let solution = self.solution.as_ref().ok_or_else(missing_solution)?;
        match notification {
            Notification::EntityAdded(entity) => {
                if let Some(manager) = self.look_up.as_mut() {
                    manager.invalidate(CollectionKind::Entity, entity.descriptor_index);
                }
                self.listeners.after_entity_added(entity);
                self.backend.after_entity_added(solution, entity);
            }
            Notification::VariableChanged {
                variable,
                entity_index,
            } => {
                self.listeners.after_variable_changed(variable, entity_index);
                self.backend
                    .after_variable_changed(solution, variable, entity_index);
            }
            Notification::EntityRemoved(entity) => {
                if let Some(manager) = self.look_up.as_mut() {
                    manager.invalidate(CollectionKind::Entity, entity.descriptor_index);
                }
                self.listeners.after_entity_removed(entity);
                self.backend.after_entity_removed(solution, entity);
            }
            Notification::ProblemFactAdded {
                descriptor_index,
                fact_index,
            } => {
                if let Some(manager) = self.look_up.as_mut() {
                    manager.invalidate(CollectionKind::ProblemFact, descriptor_index);
                }
                self.backend
                    .after_problem_fact_added(solution, descriptor_index, fact_index);
            }
            Notification::ProblemFactRemoved {
                descriptor_index,
                fact_index,
            } => {
                if let Some(manager) = self.look_up.as_mut() {
                    manager.invalidate(CollectionKind::ProblemFact, descriptor_index);
                }
                self.backend
                    .after_problem_fact_removed(solution, descriptor_index, fact_index);
            }
            Notification::ProblemPropertyChanged {
                descriptor_index,
                fact_index,
            } => self
                .backend
                .after_problem_property_changed(solution, descriptor_index, fact_index),
        }
        Ok(())
    }

    fn run_listeners(&mut self) -> Result<()> {
        let solution = self.solution.as_mut().ok_or_else(missing_solution)?;
        match self
            .listeners
            .trigger(solution, self.backend.as_mut(), &self.descriptor)
        {
            Ok(fired) => {
                if fired {
                    self.score_cache = None;
                }
                Ok(())
            }
            Err(error) => {
                self.protocol
                    .corrupt(format!("variable listener failed: {}", error));
                Err(error.into())
            }
        }
    }

    fn variable_notification(&self, variable: VariableId, entity_index: usize) -> Result<Notification> {
        self.descriptor.variable_descriptor(variable)?;
        self.check_index(
            CollectionKind::Entity,
            variable.descriptor_index,
            entity_index,
            false,
        )?;
        Ok(Notification::VariableChanged {
            variable,
            entity_index,
        })
    }
}

impl<S: PlanningSolution> ScoreDirector<S> for DefaultScoreDirector<S> {
    fn set_working_solution(&mut self, solution: S) -> Result<()> {
        self.protocol.ensure_configurable()?;
        if let Some(manager) = self.look_up.as_mut() {
            manager.reset_working_solution();
        }
        let solution = self.solution.insert(solution);
        self.listeners.reset_working_solution(solution);
        self.backend
            .reset_working_solution(solution, self.constraint_match_enabled);
        self.score_cache = None;
        self.protocol.mark_ready();
        debug!(
            solution = self.descriptor.type_name,
            entity_count = self
                .descriptor
                .total_entity_count(&*solution as &dyn Any)
                .unwrap_or(0),
            backend = self.backend.kind().label(),
            "Working solution set"
        );
        Ok(())
    }

    fn working_solution(&self) -> Result<&S> {
        self.solution_ref()
    }

    fn working_solution_mut(&mut self) -> Result<&mut S> {
        self.protocol.ensure_ready()?;
        self.score_cache = None;
        self.solution.as_mut().ok_or_else(missing_solution)
    }

    fn clone_working_solution(&self) -> Result<S> {
        self.solution_ref().cloned()
    }

    fn solution_descriptor(&self) -> &SolutionDescriptor {
        &self.descriptor
    }

    fn calculate_score(&mut self) -> Result<S::Score> {
        self.protocol.ensure_ready()?;
        self.protocol.require_idle("calculate_score")?;
        self.run_listeners()?;
        if let Some(score) = self.score_cache {
            return Ok(score);
        }

        let solution = self.solution.as_mut().ok_or_else(missing_solution)?;
        let score = self.backend.calculate_score(solution);
        self.calculation_count += 1;
        if let Some(assertion) = &self.assertion {
            let expected = assertion.calculator.calculate_score(solution);
            if expected != score {
                let error = ScoreDirectorError::ScoreCorruption {
                    backend: self.backend.kind().label(),
                    expected: expected.to_string(),
                    actual: score.to_string(),
                };
                self.protocol.corrupt(error.to_string());
                return Err(error);
            }
        }
        solution.set_score(Some(score));
        self.score_cache = Some(score);
        Ok(score)
    }

    fn is_constraint_match_enabled(&self) -> bool {
        self.constraint_match_enabled
    }

    fn constraint_match_totals(&self) -> Result<Vec<ConstraintMatchTotal<S::Score>>> {
        self.protocol.ensure_ready()?;
        if !self.constraint_match_enabled {
            return Err(ScoreDirectorError::ConstraintMatchDisabled);
        }
        self.backend
            .constraint_match_totals()
            .ok_or(ScoreDirectorError::ConstraintMatchDisabled)
    }

    fn before_entity_added(&mut self, descriptor_index: usize, entity_index: usize) -> Result<()> {
        self.check_index(CollectionKind::Entity, descriptor_index, entity_index, true)?;
        self.before(Notification::EntityAdded(EntityPosition::new(
            descriptor_index,
            entity_index,
        )))
    }

    fn after_entity_added(&mut self, descriptor_index: usize, entity_index: usize) -> Result<()> {
        self.check_index(CollectionKind::Entity, descriptor_index, entity_index, false)?;
        self.after(Notification::EntityAdded(EntityPosition::new(
            descriptor_index,
            entity_index,
        )))
    }

    fn before_variable_changed(
        &mut self,
        descriptor_index: usize,
        entity_index: usize,
        variable_name: &str,
    ) -> Result<()> {
        self.protocol.ensure_ready()?;
        let variable = self.descriptor.variable_id(descriptor_index, variable_name)?;
        self.before_variable_changed_by_id(variable, entity_index)
    }

    fn after_variable_changed(
        &mut self,
        descriptor_index: usize,
        entity_index: usize,
        variable_name: &str,
    ) -> Result<()> {
        self.protocol.ensure_ready()?;
        let variable = self.descriptor.variable_id(descriptor_index, variable_name)?;
        self.after_variable_changed_by_id(variable, entity_index)
    }

    fn before_entity_removed(&mut self, descriptor_index: usize, entity_index: usize) -> Result<()> {
        self.check_index(CollectionKind::Entity, descriptor_index, entity_index, false)?;
        self.before(Notification::EntityRemoved(EntityPosition::new(
            descriptor_index,
            entity_index,
        )))
    }

    fn after_entity_removed(&mut self, descriptor_index: usize, entity_index: usize) -> Result<()> {
        self.check_index(CollectionKind::Entity, descriptor_index, entity_index, true)?;
        self.after(Notification::EntityRemoved(EntityPosition::new(
            descriptor_index,
            entity_index,
        )))
    }

    fn trigger_variable_listeners(&mut self) -> Result<()> {
        self.protocol.ensure_ready()?;
        self.protocol.require_idle("trigger_variable_listeners")?;
        self.run_listeners()
    }

    fn before_problem_fact_added(&mut self, descriptor_index: usize, fact_index: usize) -> Result<()> {
        self.check_index(CollectionKind::ProblemFact, descriptor_index, fact_index, true)?;
        self.before(Notification::ProblemFactAdded {
            descriptor_index,
            fact_index,
        })
    }

    fn after_problem_fact_added(&mut self, descriptor_index: usize, fact_index: usize) -> Result<()> {
        self.check_index(CollectionKind::ProblemFact, descriptor_index, fact_index, false)?;
        self.after(Notification::ProblemFactAdded {
            descriptor_index,
            fact_index,
        })
    }

    fn before_problem_fact_removed(
        &mut self,
        descriptor_index: usize,
        fact_index: usize,
    ) -> Result<()> {
        self.check_index(CollectionKind::ProblemFact, descriptor_index, fact_index, false)?;
        self.before(Notification::ProblemFactRemoved {
            descriptor_index,
            fact_index,
        })
    }

    fn after_problem_fact_removed(
        &mut self,
        descriptor_index: usize,
        fact_index: usize,
    ) -> Result<()> {
        self.check_index(CollectionKind::ProblemFact, descriptor_index, fact_index, true)?;
        self.after(Notification::ProblemFactRemoved {
            descriptor_index,
            fact_index,
        })
    }

    fn before_problem_property_changed(
        &mut self,
        descriptor_index: usize,
        fact_index: usize,
    ) -> Result<()> {
        self.check_index(CollectionKind::ProblemFact, descriptor_index, fact_index, false)?;
        self.before(Notification::ProblemPropertyChanged {
            descriptor_index,
            fact_index,
        })
    }

    fn after_problem_property_changed(
        &mut self,
        descriptor_index: usize,
        fact_index: usize,
    ) -> Result<()> {
        self.check_index(CollectionKind::ProblemFact, descriptor_index, fact_index, false)?;
        self.after(Notification::ProblemPropertyChanged {
            descriptor_index,
            fact_index,
        })
    }

    fn look_up_erased(&self, external: &dyn Any, type_name: &'static str) -> Result<&dyn Any> {
        let solution = self.solution_ref()?;
        let manager = self.look_up.as_ref().ok_or(LookUpError::Disabled)?;
        let location = manager.look_up(&self.descriptor, solution as &dyn Any, external, type_name)?;
        let extractor = self
            .descriptor
            .extractor(location.kind, location.descriptor_index)?;
        extractor
            .get(solution as &dyn Any, location.index)
            .ok_or_else(|| LookUpError::NotFound { type_name }.into())
    }

    fn look_up_erased_mut(
        &mut self,
        external: &dyn Any,
        type_name: &'static str,
    ) -> Result<&mut dyn Any> {
        let location = {
            let solution = self.solution_ref()?;
            let manager = self.look_up.as_ref().ok_or(LookUpError::Disabled)?;
            manager.look_up(&self.descriptor, solution as &dyn Any, external, type_name)?
        };
        self.score_cache = None;
        let extractor = self
            .descriptor
            .extractor(location.kind, location.descriptor_index)?;
        let solution = self.solution.as_mut().ok_or_else(missing_solution)?;
        extractor
            .get_mut(solution as &mut dyn Any, location.index)
            .ok_or_else(|| LookUpError::NotFound { type_name }.into())
    }

    fn is_incremental(&self) -> bool {
        self.backend.is_incremental()
    }

    fn dispose(&mut self) {
        if self.protocol.is_disposed() {
            return;
        }
        self.listeners.close();
        self.backend.dispose();
        self.solution = None;
        self.score_cache = None;
        self.protocol.mark_disposed();
        debug!(
            backend = self.backend.kind().label(),
            calculation_count = self.calculation_count,
            "Score director disposed"
        );
    }
}

impl<S: PlanningSolution> InnerScoreDirector<S> for DefaultScoreDirector<S> {
    fn before_variable_changed_by_id(
        &mut self,
        variable: VariableId,
        entity_index: usize,
    ) -> Result<()> {
        let notification = self.variable_notification(variable, entity_index)?;
        self.before(notification)
    }

    fn after_variable_changed_by_id(
        &mut self,
        variable: VariableId,
        entity_index: usize,
    ) -> Result<()> {
        let notification = self.variable_notification(variable, entity_index)?;
        self.after(notification)
    }

    fn calculation_count(&self) -> u64 {
        self.calculation_count
    }

    fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }
}
