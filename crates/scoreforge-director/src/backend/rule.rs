//! Backend mirroring the working solution into a rule session.

use std::any::Any;
use std::sync::Arc;

use scoreforge_core::domain::{BoxedObject, CollectionKind, EntityPosition, SolutionDescriptor, VariableId};
use scoreforge_core::{PlanningSolution, Score};
use tracing::trace;

use super::{BackendKind, ScoreBackend};
use crate::constraint_match::ConstraintMatchTotal;
use crate::rule::{RuleBase, RuleSession};

/// Backend whose score is the score of a rule session.
///
/// Every entity and fact of the working solution is cloned into the session
/// at reset. "after" hooks insert or update the new state, "before removed"
/// hooks retract, and `calculate_score` fires the agenda.
pub struct RuleEngineScoreBackend<S: PlanningSolution> {
    descriptor: Arc<SolutionDescriptor>,
    rule_base: Arc<dyn RuleBase<S::Score>>,
    session: Option<Box<dyn RuleSession<S::Score>>>,
    constraint_match_enabled: bool,
}

impl<S: PlanningSolution> RuleEngineScoreBackend<S> {
    pub fn new(descriptor: Arc<SolutionDescriptor>, rule_base: Arc<dyn RuleBase<S::Score>>) -> Self {
        Self {
            descriptor,
            rule_base,
            session: None,
            constraint_match_enabled: false,
        }
    }

    /// Returns true while a session is open.
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    fn clone_object(&self, solution: &S, kind: CollectionKind, descriptor_index: usize, index: usize) -> Option<BoxedObject> {
        let extractor = self.descriptor.extractor(kind, descriptor_index).ok()?;
        extractor.clone_entity_boxed(solution as &dyn Any, index)
    }

    fn insert(&mut self, solution: &S, kind: CollectionKind, descriptor_index: usize, index: usize) {
        let Some(object) = self.clone_object(solution, kind, descriptor_index, index) else {
            trace!(kind = kind.label(), descriptor_index, index, "Nothing to insert");
            return;
        };
        if let Some(session) = self.session.as_mut() {
            session.insert(kind, descriptor_index, index, object);
        }
    }

    fn update(&mut self, solution: &S, kind: CollectionKind, descriptor_index: usize, index: usize) {
        let Some(object) = self.clone_object(solution, kind, descriptor_index, index) else {
            return;
        };
        if let Some(session) = self.session.as_mut() {
            session.update(kind, descriptor_index, index, object);
        }
    }

    fn retract(&mut self, kind: CollectionKind, descriptor_index: usize, index: usize) {
        if let Some(session) = self.session.as_mut() {
            session.retract(kind, descriptor_index, index);
        }
    }

    fn close_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.dispose();
        }
    }
}

impl<S: PlanningSolution> ScoreBackend<S> for RuleEngineScoreBackend<S> {
    fn kind(&self) -> BackendKind {
        BackendKind::RuleEngine
    }

    fn is_incremental(&self) -> bool {
        true
    }

    fn supports_constraint_match(&self) -> bool {
        true
    }

    fn reset_working_solution(&mut self, solution: &S, constraint_match_enabled: bool) {
        self.close_session();
        self.constraint_match_enabled = constraint_match_enabled;
        self.session = Some(self.rule_base.new_session(constraint_match_enabled));

        let collections = [
            (CollectionKind::Entity, self.descriptor.entity_descriptor_count()),
            (CollectionKind::ProblemFact, self.descriptor.problem_fact_descriptor_count()),
        ];
        for (kind, descriptor_count) in collections {
            for descriptor_index in 0..descriptor_count {
                let count = self
                    .descriptor
                    .object_count(solution as &dyn Any, kind, descriptor_index)
                    .unwrap_or(0);
                for index in 0..count {
                    self.insert(solution, kind, descriptor_index, index);
                }
            }
        }
    }

    fn after_entity_added(&mut self, solution: &S, entity: EntityPosition) {
        self.insert(solution, CollectionKind::Entity, entity.descriptor_index, entity.entity_index);
    }

    fn after_variable_changed(&mut self, solution: &S, variable: VariableId, entity_index: usize) {
        self.update(solution, CollectionKind::Entity, variable.descriptor_index, entity_index);
    }

    fn before_entity_removed(&mut self, _solution: &S, entity: EntityPosition) {
        self.retract(CollectionKind::Entity, entity.descriptor_index, entity.entity_index);
    }

    fn after_problem_fact_added(&mut self, solution: &S, descriptor_index: usize, fact_index: usize) {
        self.insert(solution, CollectionKind::ProblemFact, descriptor_index, fact_index);
    }

    fn before_problem_fact_removed(&mut self, _solution: &S, descriptor_index: usize, fact_index: usize) {
        self.retract(CollectionKind::ProblemFact, descriptor_index, fact_index);
    }

    fn after_problem_property_changed(&mut self, solution: &S, descriptor_index: usize, fact_index: usize) {
        self.update(solution, CollectionKind::ProblemFact, descriptor_index, fact_index);
    }

    fn calculate_score(&mut self, _solution: &S) -> S::Score {
        self.session
            .as_mut()
            .map_or_else(<S::Score as Score>::zero, |session| session.fire_all_rules())
    }

    fn constraint_match_totals(&self) -> Option<Vec<ConstraintMatchTotal<S::Score>>> {
        if !self.constraint_match_enabled {
            return None;
        }
        self.session.as_ref().map(|session| session.constraint_match_totals())
    }

    fn dispose(&mut self) {
        self.close_session();
    }
}
