//! Errors reported by score directors and their factories.

use scoreforge_core::{LookUpError, ScoreForgeError};
use thiserror::Error;

/// Error returned by every fallible score director operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScoreDirectorError {
    /// Out-of-order notifications, use before a working solution is set,
    /// use after dispose, or use after an earlier violation.
    #[error("score director protocol violation: {0}")]
    Protocol(String),

    /// Look-up of a working object failed.
    #[error(transparent)]
    LookUp(#[from] LookUpError),

    /// Constraint match totals were requested but recording is disabled.
    #[error("constraint match is not enabled on this score director")]
    ConstraintMatchDisabled,

    /// The backend score differs from a from-scratch recalculation.
    #[error("score corruption: {backend} backend calculated {actual} but recalculation gives {expected}")]
    ScoreCorruption {
        backend: &'static str,
        expected: String,
        actual: String,
    },

    /// A variable name or handle does not exist on the entity descriptor.
    #[error("entity {entity} has no variable {variable}")]
    UnknownVariable {
        entity: &'static str,
        variable: String,
    },

    /// A descriptor index is out of range.
    #[error("no {kind} descriptor at index {index}")]
    UnknownDescriptor { kind: &'static str, index: usize },

    /// An entity or fact index is out of range for its collection.
    #[error("no {type_name} at index {index}")]
    UnknownObject { type_name: &'static str, index: usize },

    /// The domain model or the configuration cannot be used.
    #[error(transparent)]
    Domain(ScoreForgeError),
}

impl From<ScoreForgeError> for ScoreDirectorError {
    fn from(error: ScoreForgeError) -> Self {
        match error {
            ScoreForgeError::UnknownVariable { entity, variable } => {
                ScoreDirectorError::UnknownVariable { entity, variable }
            }
            ScoreForgeError::UnknownDescriptor { kind, index } => {
                ScoreDirectorError::UnknownDescriptor { kind, index }
            }
            ScoreForgeError::UnknownObject { type_name, index } => {
                ScoreDirectorError::UnknownObject { type_name, index }
            }
            other => ScoreDirectorError::Domain(other),
        }
    }
}

impl ScoreDirectorError {
    /// Returns true for errors that leave the director unusable.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, ScoreDirectorError::Protocol(_))
    }
}

/// Result type alias for score director operations.
pub type Result<T> = std::result::Result<T, ScoreDirectorError>;
