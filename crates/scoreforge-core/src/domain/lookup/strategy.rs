use super::LookUpKey;
use crate::error::ScoreForgeError;

/// Configured policy for deciding when two objects are "the same".
///
/// The policy is fixed per score director factory and is turned into one
/// [`LookUpStrategy`] per descriptor when a director is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LookUpStrategyType {
    /// Planning id if registered, otherwise the type is unsupported.
    #[default]
    PlanningIdOrNone,
    /// Planning id; building a director fails for any type without one.
    PlanningIdOrFailFast,
    /// Value equality if registered, otherwise the type is unsupported.
    Equality,
    /// Address identity of working objects.
    Reference,
    /// Planning id, else value equality, else address identity.
    Auto,
    /// No type supports look-up.
    None,
}

/// Effective identity of one object type.
#[derive(Debug, Clone, Copy)]
pub enum LookUpStrategy {
    PlanningId(LookUpKey),
    Equality(LookUpKey),
    Reference,
    None,
}

impl LookUpStrategy {
    /// Returns the key the look-up index is built with.
    pub fn key(&self) -> Option<LookUpKey> {
        match self {
            LookUpStrategy::PlanningId(key) | LookUpStrategy::Equality(key) => Some(*key),
            LookUpStrategy::Reference => Some(LookUpKey::reference()),
            LookUpStrategy::None => None,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, LookUpStrategy::None)
    }
}

impl LookUpStrategyType {
    /// Picks the strategy of one object type from the keys it registered.
    pub fn resolve(
        self,
        type_name: &'static str,
        planning_id: Option<LookUpKey>,
        equality: Option<LookUpKey>,
    ) -> Result<LookUpStrategy, ScoreForgeError> {
        let strategy = match self {
            LookUpStrategyType::PlanningIdOrNone => planning_id
                .map(LookUpStrategy::PlanningId)
                .unwrap_or(LookUpStrategy::None),
            LookUpStrategyType::PlanningIdOrFailFast => match planning_id {
                Some(key) => LookUpStrategy::PlanningId(key),
                None => {
                    return Err(ScoreForgeError::DomainModel(format!(
                        "{} has no planning id but the look-up strategy type is {:?}",
                        type_name, self
                    )))
                }
            },
            LookUpStrategyType::Equality => equality
                .map(LookUpStrategy::Equality)
                .unwrap_or(LookUpStrategy::None),
            LookUpStrategyType::Reference => LookUpStrategy::Reference,
            LookUpStrategyType::Auto => match (planning_id, equality) {
                (Some(key), _) => LookUpStrategy::PlanningId(key),
                (None, Some(key)) => LookUpStrategy::Equality(key),
                (None, None) => LookUpStrategy::Reference,
            },
            LookUpStrategyType::None => LookUpStrategy::None,
        };
        Ok(strategy)
    }
}
