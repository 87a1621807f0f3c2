//! Guards pairing a before notification with its after notification.

use std::marker::PhantomData;

use scoreforge_core::PlanningSolution;
use tracing::warn;

use super::traits::ScoreDirector;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ScopeKind {
    EntityAdded {
        descriptor_index: usize,
        entity_index: usize,
    },
    EntityRemoved {
        descriptor_index: usize,
        entity_index: usize,
    },
    VariableChanged {
        descriptor_index: usize,
        entity_index: usize,
        variable_name: String,
    },
    ProblemFactAdded {
        descriptor_index: usize,
        fact_index: usize,
    },
    ProblemFactRemoved {
        descriptor_index: usize,
        fact_index: usize,
    },
    ProblemPropertyChanged {
        descriptor_index: usize,
        fact_index: usize,
    },
}

/// A change in progress on a score director.
///
/// Created by the before notification; [`finish`](Self::finish) or drop
/// sends the after notification. Dropping ignores the result except for a
/// warning, so call `finish` where the error matters.
///
/// ```
/// use std::sync::Arc;
/// use scoreforge_core::SimpleScore;
/// use scoreforge_director::backend::EasyScoreBackend;
/// use scoreforge_director::{DefaultScoreDirector, ScoreDirector, ScoreDirectorExt};
/// use scoreforge_test::conflict::{calculate_conflicts, create_conflict_descriptor, ConflictSolution, ValueSlot};
///
/// let backend = EasyScoreBackend::<ConflictSolution>::new(Arc::new(calculate_conflicts));
/// let mut director = DefaultScoreDirector::new(Arc::new(create_conflict_descriptor()), Box::new(backend));
/// director.set_working_solution(ConflictSolution::with_values(&[1, 2])).unwrap();
///
/// let mut scope = director.entity_added_scope(0, 2).unwrap();
/// scope.working_solution_mut().unwrap().slots.push(ValueSlot::new(2, 2));
/// scope.finish().unwrap();
///
/// assert_eq!(director.calculate_score().unwrap(), SimpleScore::of(-1));
/// ```
pub struct NotificationScope<'a, S, D>
where
    S: PlanningSolution,
    D: ScoreDirector<S> + ?Sized,
{
    director: &'a mut D,
    kind: ScopeKind,
    finished: bool,
    _solution: PhantomData<fn() -> S>,
}

impl<'a, S, D> NotificationScope<'a, S, D>
where
    S: PlanningSolution,
    D: ScoreDirector<S> + ?Sized,
{
    pub(crate) fn begin(director: &'a mut D, kind: ScopeKind) -> Result<Self> {
        match &kind {
            ScopeKind::EntityAdded {
                descriptor_index,
                entity_index,
            } => director.before_entity_added(*descriptor_index, *entity_index)?,
            ScopeKind::EntityRemoved {
                descriptor_index,
                entity_index,
            } => director.before_entity_removed(*descriptor_index, *entity_index)?,
            ScopeKind::VariableChanged {
                descriptor_index,
                entity_index,
                variable_name,
            } => director.before_variable_changed(*descriptor_index, *entity_index, variable_name)?,
            ScopeKind::ProblemFactAdded {
                descriptor_index,
                fact_index,
            } => director.before_problem_fact_added(*descriptor_index, *fact_index)?,
            ScopeKind::ProblemFactRemoved {
                descriptor_index,
                fact_index,
            } => director.before_problem_fact_removed(*descriptor_index, *fact_index)?,
            ScopeKind::ProblemPropertyChanged {
                descriptor_index,
                fact_index,
            } => director.before_problem_property_changed(*descriptor_index, *fact_index)?,
        }
        Ok(Self {
            director,
            kind,
            finished: false,
            _solution: PhantomData,
        })
    }

    pub fn working_solution(&self) -> Result<&S> {
        self.director.working_solution()
    }

    pub fn working_solution_mut(&mut self) -> Result<&mut S> {
        self.director.working_solution_mut()
    }

    /// Sends the after notification.
    pub fn finish(mut self) -> Result<()> {
        self.finished = true;
        self.complete()
    }

    fn complete(&mut self) -> Result<()> {
        let director = &mut *self.director;
        match &self.kind {
            ScopeKind::EntityAdded {
                descriptor_index,
                entity_index,
            } => director.after_entity_added(*descriptor_index, *entity_index),
            ScopeKind::EntityRemoved {
                descriptor_index,
                entity_index,
            } => director.after_entity_removed(*descriptor_index, *entity_index),
            ScopeKind::VariableChanged {
                descriptor_index,
                entity_index,
                variable_name,
            } => director.after_variable_changed(*descriptor_index, *entity_index, variable_name),
            ScopeKind::ProblemFactAdded {
                descriptor_index,
                fact_index,
            } => director.after_problem_fact_added(*descriptor_index, *fact_index),
            ScopeKind::ProblemFactRemoved {
                descriptor_index,
                fact_index,
            } => director.after_problem_fact_removed(*descriptor_index, *fact_index),
            ScopeKind::ProblemPropertyChanged {
                descriptor_index,
                fact_index,
            } => director.after_problem_property_changed(*descriptor_index, *fact_index),
        }
    }
}

impl<S, D> Drop for NotificationScope<'_, S, D>
where
    S: PlanningSolution,
    D: ScoreDirector<S> + ?Sized,
{
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        if let Err(error) = self.complete() {
            warn!(scope = ?self.kind, error = %error, "Unfinished notification scope failed");
        }
    }
}
