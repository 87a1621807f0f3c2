//! ScoreForge - Score directors in Rust
//!
//! Keep the score of a working solution consistent while it changes, with
//! an easy, an incremental or a rule-engine backend.
//!
//! # Example
//!
//! ```rust
//! use scoreforge::prelude::*;
//! use scoreforge_test::conflict::{calculate_conflicts, create_conflict_descriptor, ConflictSolution};
//!
//! let factory = ScoreDirectorFactoryBuilder::<ConflictSolution>::new(create_conflict_descriptor())
//!     .with_easy_calculator(calculate_conflicts)
//!     .build(&ScoreDirectorConfig::default())
//!     .unwrap();
//!
//! let (solution, score) = evaluate_solution(factory.as_ref(), ConflictSolution::with_values(&[1, 1, 2])).unwrap();
//! assert_eq!(score, SimpleScore::of(-1));
//! assert_eq!(solution.score, Some(score));
//! ```

// Score types
pub use scoreforge_core::score::{HardSoftScore, Score, SimpleScore};

// Domain model
pub use scoreforge_core::domain;
pub use scoreforge_core::{
    ConstraintRef, ImpactType, LookUpError, LookUpStrategyType, PlanningEntity, PlanningId,
    PlanningSolution, ProblemFact, ScoreForgeError,
};

// Configuration
pub use scoreforge_config::{ConfigError, EnvironmentMode, ScoreDirectorConfig, ScoreDirectorType};

// Score directors
pub use scoreforge_director::{
    backend, rule, BackendKind, ConstraintJustification, ConstraintMatchTotal, DefaultScoreDirector,
    EasyScoreCalculator, IncrementalScoreCalculator, InnerScoreDirector, InnerScoreDirectorFactory,
    ListenerRegistration, ScoreDirector, ScoreDirectorError, ScoreDirectorExt,
    ScoreDirectorFactory, ScoreDirectorFactoryBuilder, TestGenScoreDirectorFactory,
};

pub mod logging;

mod evaluate;
pub use evaluate::{evaluate_solution, explain_solution, load_config};

pub mod prelude {
    pub use super::{HardSoftScore, Score, SimpleScore};
    pub use super::{
        ScoreDirector, ScoreDirectorConfig, ScoreDirectorExt, ScoreDirectorFactory,
        ScoreDirectorFactoryBuilder,
    };
    pub use super::{evaluate_solution, explain_solution};
}
