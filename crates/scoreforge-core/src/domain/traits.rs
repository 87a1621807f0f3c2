//! Core domain traits

use std::fmt::Debug;
use std::hash::Hash;

use crate::score::Score;

/// Marker trait for planning solutions.
///
/// A planning solution represents both the problem definition and the
/// (potentially partial) solution. It contains:
/// - Problem facts: Immutable input data
/// - Planning entities: Things to be optimized
/// - Score: The quality of the current solution
///
/// # Example
///
/// ```
/// use scoreforge_core::{PlanningSolution, SimpleScore};
///
/// #[derive(Clone)]
/// struct NQueens {
///     rows: Vec<Option<usize>>,
///     score: Option<SimpleScore>,
/// }
///
/// impl PlanningSolution for NQueens {
///     type Score = SimpleScore;
///
///     fn score(&self) -> Option<Self::Score> {
///         self.score
///     }
///
///     fn set_score(&mut self, score: Option<Self::Score>) {
///         self.score = score;
///     }
/// }
/// ```
///
/// Each score director owns its working solution exclusively, so solutions
/// must be `Send` to move between the threads that drive separate directors.
pub trait PlanningSolution: Clone + Send + Sync + 'static {
    /// The score type used to evaluate this solution.
    type Score: Score;

    /// Returns the current score of this solution, if calculated.
    ///
    /// Returns `None` if the solution has not been scored yet.
    fn score(&self) -> Option<Self::Score>;

    /// Sets the score of this solution.
    fn set_score(&mut self, score: Option<Self::Score>);

    /// Returns true if this solution is fully initialized.
    fn is_initialized(&self) -> bool {
        true
    }
}

/// Marker trait for planning entities.
///
/// A planning entity holds one or more planning variables. Entities are
/// stored in `Vec` collections on the solution and registered through an
/// [`EntityDescriptor`](super::EntityDescriptor).
///
/// # Pinning
///
/// Entities can be pinned to prevent the search from changing them.
pub trait PlanningEntity: Clone + Debug + Send + Sync + 'static {
    /// Returns true if this entity is pinned (should not be changed).
    fn is_pinned(&self) -> bool {
        false
    }
}

/// Marker trait for problem facts.
///
/// Problem facts are read-only to the search. Problem changes may still add,
/// remove or modify them through the fact notifications of a score director.
pub trait ProblemFact: Clone + Debug + Send + Sync + 'static {}

/// Trait for unique identification of entities and facts.
///
/// Used for looking up working copies of objects that come from another
/// solution instance, such as a best-solution clone or a problem change.
///
/// # Example
///
/// ```
/// use scoreforge_core::PlanningId;
///
/// #[derive(Clone)]
/// struct Task {
///     id: i64,
///     name: String,
/// }
///
/// impl PlanningId for Task {
///     type Id = i64;
///     fn planning_id(&self) -> i64 { self.id }
/// }
/// ```
pub trait PlanningId {
    /// The type of the unique identifier.
    type Id: Eq + Hash + Clone + Send + Sync + 'static;

    /// Returns the unique identifier for this object.
    ///
    /// This must never return a value that changes during solving.
    fn planning_id(&self) -> Self::Id;
}
