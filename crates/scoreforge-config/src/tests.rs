//! Tests for score director configuration.

use super::*;

#[test]
fn test_toml_parsing() {
    let toml = r#"
        score_director_type = "rule_engine"
        environment_mode = "full_assert"
        look_up_enabled = false
        constraint_match_enabled = true
        look_up_strategy_type = "planning_id_or_fail_fast"
        test_gen = true
    "#;

    let config = ScoreDirectorConfig::from_toml_str(toml).unwrap();
    assert_eq!(config.score_director_type, ScoreDirectorType::RuleEngine);
    assert_eq!(config.environment_mode, EnvironmentMode::FullAssert);
    assert!(!config.look_up_enabled);
    assert!(config.constraint_match_enabled);
    assert_eq!(
        config.look_up_strategy_type,
        LookUpStrategyType::PlanningIdOrFailFast
    );
    assert!(config.test_gen);
}

#[test]
fn test_yaml_parsing() {
    let yaml = r#"
        score_director_type: incremental
        environment_mode: reproducible
        look_up_strategy_type: auto
    "#;

    let config = ScoreDirectorConfig::from_yaml_str(yaml).unwrap();
    assert_eq!(config.score_director_type, ScoreDirectorType::Incremental);
    assert_eq!(config.environment_mode, EnvironmentMode::Reproducible);
    assert_eq!(config.look_up_strategy_type, LookUpStrategyType::Auto);
    assert!(config.look_up_enabled);
    assert!(!config.constraint_match_enabled);
}

#[test]
fn test_empty_config_uses_defaults() {
    let config = ScoreDirectorConfig::from_toml_str("").unwrap();
    assert_eq!(config, ScoreDirectorConfig::default());
    assert_eq!(config.score_director_type, ScoreDirectorType::Easy);
    assert_eq!(
        config.look_up_strategy_type,
        LookUpStrategyType::PlanningIdOrNone
    );
}

#[test]
fn test_test_gen_requires_rule_engine() {
    let result = ScoreDirectorConfig::from_toml_str("test_gen = true");
    assert!(matches!(result, Err(ConfigError::Invalid(_))));

    let config = ScoreDirectorConfig::new().with_test_gen(true);
    assert!(config.validate().is_err());
    assert!(config
        .with_score_director_type(ScoreDirectorType::RuleEngine)
        .validate()
        .is_ok());
}

#[test]
fn test_unknown_variant_is_rejected() {
    let result = ScoreDirectorConfig::from_toml_str(r#"score_director_type = "drools""#);
    assert!(matches!(result, Err(ConfigError::Toml(_))));
}

#[test]
fn test_builder() {
    let config = ScoreDirectorConfig::new()
        .with_score_director_type(ScoreDirectorType::Incremental)
        .with_environment_mode(EnvironmentMode::FastAssert)
        .with_look_up_strategy_type(LookUpStrategyType::Equality)
        .with_constraint_match_enabled(true)
        .with_look_up_enabled(false);

    assert!(config.environment_mode.is_asserted());
    assert!(!config.environment_mode.is_fully_asserted());
    assert!(config.constraint_match_enabled);
    assert!(!config.look_up_enabled);
}

#[test]
fn test_load_missing_file_is_io_error() {
    let result = ScoreDirectorConfig::load("/nonexistent/score_director.toml");
    assert!(matches!(result, Err(ConfigError::Io(_))));
}
