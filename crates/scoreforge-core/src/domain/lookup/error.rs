use thiserror::Error;

use super::LookUpStrategyType;

/// Failure to map an external object onto the working solution.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookUpError {
    /// The score director was built without look-up support.
    #[error("look-up is not enabled on this score director")]
    Disabled,

    /// The object type has no identity under the configured strategy type.
    #[error("type {type_name} cannot be looked up with strategy type {strategy_type:?}")]
    UnsupportedType {
        type_name: &'static str,
        strategy_type: LookUpStrategyType,
    },

    /// Two distinct working objects share one identity.
    #[error("working {type_name} objects at indexes {first} and {second} have the same identity")]
    DuplicateId {
        type_name: &'static str,
        first: usize,
        second: usize,
    },

    /// No working object has the identity of the external object.
    #[error("no working {type_name} object matches the external object")]
    NotFound { type_name: &'static str },
}
