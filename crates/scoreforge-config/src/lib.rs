//! Configuration system for ScoreForge.
//!
//! Load score director configuration from TOML or YAML to choose the
//! scoring backend, the environment mode and the look-up policy without
//! code changes.
//!
//! # Examples
//!
//! ```
//! use scoreforge_config::{EnvironmentMode, ScoreDirectorConfig, ScoreDirectorType};
//!
//! let config = ScoreDirectorConfig::from_toml_str(r#"
//!     score_director_type = "incremental"
//!     environment_mode = "fast_assert"
//!     constraint_match_enabled = true
//! "#).unwrap();
//!
//! assert_eq!(config.score_director_type, ScoreDirectorType::Incremental);
//! assert!(config.environment_mode.is_asserted());
//! assert!(config.look_up_enabled);
//! ```
//!
//! Use default config when file is missing:
//!
//! ```
//! use scoreforge_config::ScoreDirectorConfig;
//!
//! let config = ScoreDirectorConfig::load("score_director.toml").unwrap_or_default();
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use scoreforge_core::LookUpStrategyType;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Score director configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ScoreDirectorConfig {
    /// Which scoring backend the factory builds.
    #[serde(default)]
    pub score_director_type: ScoreDirectorType,

    /// Environment mode affecting assertions.
    #[serde(default)]
    pub environment_mode: EnvironmentMode,

    /// Whether built directors support look-up of working objects.
    #[serde(default = "default_true")]
    pub look_up_enabled: bool,

    /// Whether built directors record constraint matches, when the backend supports it.
    #[serde(default)]
    pub constraint_match_enabled: bool,

    /// How external objects are matched to working objects.
    #[serde(default)]
    pub look_up_strategy_type: LookUpStrategyType,

    /// Whether directors record a replayable journal of every notification.
    #[serde(default)]
    pub test_gen: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ScoreDirectorConfig {
    fn default() -> Self {
        Self {
            score_director_type: ScoreDirectorType::default(),
            environment_mode: EnvironmentMode::default(),
            look_up_enabled: true,
            constraint_match_enabled: false,
            look_up_strategy_type: LookUpStrategyType::default(),
            test_gen: false,
        }
    }
}

impl ScoreDirectorConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist, contains invalid TOML or fails
    /// [`validate`](Self::validate).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks combinations of settings that cannot work together.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.test_gen && self.score_director_type != ScoreDirectorType::RuleEngine {
            return Err(ConfigError::Invalid(format!(
                "test_gen requires score_director_type rule_engine, got {:?}",
                self.score_director_type
            )));
        }
        Ok(())
    }

    /// Sets the scoring backend.
    pub fn with_score_director_type(mut self, score_director_type: ScoreDirectorType) -> Self {
        self.score_director_type = score_director_type;
        self
    }

    /// Sets the environment mode.
    pub fn with_environment_mode(mut self, environment_mode: EnvironmentMode) -> Self {
        self.environment_mode = environment_mode;
        self
    }

    /// Sets the look-up strategy type.
    pub fn with_look_up_strategy_type(mut self, strategy_type: LookUpStrategyType) -> Self {
        self.look_up_strategy_type = strategy_type;
        self
    }

    /// Enables or disables constraint match recording.
    pub fn with_constraint_match_enabled(mut self, enabled: bool) -> Self {
        self.constraint_match_enabled = enabled;
        self
    }

    /// Enables or disables look-up.
    pub fn with_look_up_enabled(mut self, enabled: bool) -> Self {
        self.look_up_enabled = enabled;
        self
    }

    /// Enables or disables the replay journal.
    pub fn with_test_gen(mut self, enabled: bool) -> Self {
        self.test_gen = enabled;
        self
    }
}

/// Scoring backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreDirectorType {
    /// Full recomputation of the score on every calculation.
    #[default]
    Easy,

    /// User calculator updated by every before/after notification.
    Incremental,

    /// Built-in rule engine mirroring the working solution.
    RuleEngine,
}

/// Environment mode for score director behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentMode {
    /// Non-reproducible mode with minimal overhead.
    #[default]
    NonReproducible,

    /// Reproducible mode with deterministic behavior.
    Reproducible,

    /// Fast assert mode: every score is checked against recomputation.
    FastAssert,

    /// Full assert mode: fast assert checks plus consistency checks of the listener chain.
    FullAssert,
}

impl EnvironmentMode {
    /// Returns true if calculated scores are checked against a recomputed score.
    pub fn is_asserted(&self) -> bool {
        matches!(self, EnvironmentMode::FastAssert | EnvironmentMode::FullAssert)
    }

    /// Returns true if the most expensive assertions are enabled.
    pub fn is_fully_asserted(&self) -> bool {
        matches!(self, EnvironmentMode::FullAssert)
    }
}

#[cfg(test)]
mod tests;
