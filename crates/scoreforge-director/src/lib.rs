//! Score directors for ScoreForge.
//!
//! This crate keeps the score of a working solution consistent with its
//! changes:
//! - Score directors bracketing every change with before/after notifications
//! - Three interchangeable backends: easy, incremental and a built-in rule engine
//! - Shadow variable listeners triggered in registration order
//! - Look-up of working objects and constraint match explanation
//!
//! # Example
//!
//! ```
//! use scoreforge_core::SimpleScore;
//! use scoreforge_director::{ScoreDirector, ScoreDirectorExt, ScoreDirectorFactory};
//! use scoreforge_test::conflict::{calculate_conflicts, create_conflict_descriptor, ConflictSolution, ValueSlot};
//!
//! let factory = ScoreDirectorFactory::<ConflictSolution>::easy(create_conflict_descriptor(), calculate_conflicts);
//! let mut director = factory.build_default().unwrap();
//! director.set_working_solution(ConflictSolution::with_values(&[1, 1, 2])).unwrap();
//! assert_eq!(director.calculate_score().unwrap(), SimpleScore::of(-1));
//!
//! director
//!     .change_entity_variable(0, 1, "value", |slot: &mut ValueSlot| slot.value = 3)
//!     .unwrap();
//! assert_eq!(director.calculate_score().unwrap(), SimpleScore::of(0));
//! ```

pub mod backend;
pub mod constraint_match;
pub mod director;
pub mod error;
pub mod rule;

pub use backend::{
    BackendKind, EasyScoreCalculator, IncrementalScoreCalculator, ScoreBackend,
};
pub use constraint_match::{
    ConstraintJustification, ConstraintMatch, ConstraintMatchRecorder, ConstraintMatchTotal,
    MatchId,
};
pub use director::{
    DefaultScoreDirector, InnerScoreDirector, InnerScoreDirectorFactory, ListenerRegistration,
    Notification, NotificationScope, ScoreDirector, ScoreDirectorExt, ScoreDirectorFactory,
    ScoreDirectorFactoryBuilder, TestGenJournal, TestGenScoreDirector,
    TestGenScoreDirectorFactory,
};
pub use error::{Result, ScoreDirectorError};
pub use rule::{BiRule, ConstraintRuleBase, JoinRule, RuleBase, RuleSession, UniRule};
