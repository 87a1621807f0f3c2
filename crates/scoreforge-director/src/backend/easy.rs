//! Full recalculation backend.

use std::sync::Arc;

use scoreforge_core::PlanningSolution;

use super::{BackendKind, ScoreBackend};
use crate::constraint_match::{ConstraintMatchRecorder, ConstraintMatchTotal};

/// Calculates the score of a whole solution from scratch.
///
/// Implemented for every `Fn(&S) -> S::Score`, so a plain closure works:
///
/// ```
/// use scoreforge_core::{PlanningSolution, SimpleScore};
/// use scoreforge_director::backend::EasyScoreCalculator;
///
/// #[derive(Clone)]
/// struct Plan {
///     values: Vec<i64>,
///     score: Option<SimpleScore>,
/// }
///
/// impl PlanningSolution for Plan {
///     type Score = SimpleScore;
///     fn score(&self) -> Option<Self::Score> { self.score }
///     fn set_score(&mut self, score: Option<Self::Score>) { self.score = score; }
/// }
///
/// let calculator = |plan: &Plan| SimpleScore::of(-plan.values.iter().sum::<i64>());
/// let plan = Plan { values: vec![1, 2], score: None };
/// assert_eq!(calculator.calculate_score(&plan), SimpleScore::of(-3));
/// assert!(!EasyScoreCalculator::<Plan>::supports_constraint_match(&calculator));
/// ```
pub trait EasyScoreCalculator<S: PlanningSolution>: Send + Sync {
    fn calculate_score(&self, solution: &S) -> S::Score;

    /// Returns true if [`explain`](Self::explain) records matches.
    fn supports_constraint_match(&self) -> bool {
        false
    }

    /// Records the constraint matches behind the score of `solution`.
    fn explain(&self, _solution: &S, _recorder: &mut ConstraintMatchRecorder<S::Score>) {}
}

impl<S, F> EasyScoreCalculator<S> for F
where
    S: PlanningSolution,
    F: Fn(&S) -> S::Score + Send + Sync,
{
    fn calculate_score(&self, solution: &S) -> S::Score {
        self(solution)
    }
}

/// Backend that ignores every hook and recalculates on demand.
///
/// O(solution size) per calculation; correct by construction.
pub struct EasyScoreBackend<S: PlanningSolution> {
    calculator: Arc<dyn EasyScoreCalculator<S>>,
    recorder: Option<ConstraintMatchRecorder<S::Score>>,
}

impl<S: PlanningSolution> EasyScoreBackend<S> {
    pub fn new(calculator: Arc<dyn EasyScoreCalculator<S>>) -> Self {
        Self {
            calculator,
            recorder: None,
        }
    }
}

impl<S: PlanningSolution> ScoreBackend<S> for EasyScoreBackend<S> {
    fn kind(&self) -> BackendKind {
        BackendKind::Easy
    }

    fn is_incremental(&self) -> bool {
        false
    }

    fn supports_constraint_match(&self) -> bool {
        self.calculator.supports_constraint_match()
    }

    fn reset_working_solution(&mut self, _solution: &S, constraint_match_enabled: bool) {
        self.recorder = constraint_match_enabled.then(ConstraintMatchRecorder::new);
    }

    fn calculate_score(&mut self, solution: &S) -> S::Score {
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.clear();
            self.calculator.explain(solution, recorder);
        }
        self.calculator.calculate_score(solution)
    }

    fn constraint_match_totals(&self) -> Option<Vec<ConstraintMatchTotal<S::Score>>> {
        self.recorder.as_ref().map(ConstraintMatchRecorder::totals)
    }

    fn dispose(&mut self) {
        self.recorder = None;
    }
}
