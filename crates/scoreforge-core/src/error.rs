//! Error types for ScoreForge domain configuration

use thiserror::Error;

/// Main error type for domain model and configuration problems.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScoreForgeError {
    /// Error in director or factory configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error in domain model definition
    #[error("Domain model error: {0}")]
    DomainModel(String),

    /// A variable name or index does not exist on the entity descriptor
    #[error("Entity '{entity}' has no variable '{variable}'")]
    UnknownVariable {
        entity: &'static str,
        variable: String,
    },

    /// A descriptor index is out of range
    #[error("No {kind} descriptor at index {index}")]
    UnknownDescriptor { kind: &'static str, index: usize },

    /// An entity or fact index is out of range for its collection
    #[error("No {type_name} at index {index}")]
    UnknownObject { type_name: &'static str, index: usize },
}

/// Result type alias for ScoreForge domain operations
pub type Result<T> = std::result::Result<T, ScoreForgeError>;
