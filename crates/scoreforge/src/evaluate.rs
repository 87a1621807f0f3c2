//! One-shot scoring entry points that hide the director lifecycle.

use std::path::Path;

use scoreforge_config::{ConfigError, ScoreDirectorConfig};
use scoreforge_core::PlanningSolution;
use scoreforge_director::{ConstraintMatchTotal, InnerScoreDirectorFactory, Result, ScoreDirector};
use tracing::{debug, info};

/// Loads a score director config from a TOML file, falling back to defaults.
///
/// A file that exists but does not parse is an error; a missing file is not.
pub fn load_config(path: impl AsRef<Path>) -> std::result::Result<ScoreDirectorConfig, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        debug!(path = %path.display(), "No score director config, using defaults");
        return Ok(ScoreDirectorConfig::default());
    }
    let config = ScoreDirectorConfig::load(path)?;
    info!(
        path = %path.display(),
        score_director_type = ?config.score_director_type,
        environment_mode = ?config.environment_mode,
        "Loaded score director config"
    );
    Ok(config)
}

/// Scores `solution` with a fresh director and returns it with its score set.
pub fn evaluate_solution<S: PlanningSolution>(
    factory: &dyn InnerScoreDirectorFactory<S>,
    solution: S,
) -> Result<(S, S::Score)> {
    let mut director = factory.build_default()?;
    director.set_working_solution(solution)?;
    let score = director.calculate_score()?;
    let solution = director.clone_working_solution()?;
    director.dispose();
    Ok((solution, score))
}

/// Scores `solution` and breaks the score down per constraint.
///
/// Fails with `ConstraintMatchDisabled` unless the factory's backend can
/// explain its score.
pub fn explain_solution<S: PlanningSolution>(
    factory: &dyn InnerScoreDirectorFactory<S>,
    solution: S,
) -> Result<(S::Score, Vec<ConstraintMatchTotal<S::Score>>)> {
    let mut director = factory.build_score_director(false, true)?;
    director.set_working_solution(solution)?;
    let score = director.calculate_score()?;
    let totals = director.constraint_match_totals()?;
    director.dispose();
    Ok((score, totals))
}

#[cfg(test)]
mod tests {
    use scoreforge_config::{ScoreDirectorConfig, ScoreDirectorType};
    use scoreforge_core::{ConstraintRef, ImpactType, SimpleScore};
    use scoreforge_director::rule::{BiRule, ConstraintRuleBase};
    use scoreforge_director::{ScoreDirectorError, ScoreDirectorFactoryBuilder};
    use scoreforge_test::conflict::{
        calculate_conflicts, create_conflict_descriptor, ConflictSolution, ValueSlot,
    };

    use super::*;

    fn builder() -> ScoreDirectorFactoryBuilder<ConflictSolution> {
        ScoreDirectorFactoryBuilder::new(create_conflict_descriptor())
            .with_easy_calculator(calculate_conflicts)
            .with_rule_base(ConstraintRuleBase::new().with_bi_rule(BiRule::new::<ValueSlot, _>(
                ConstraintRef::new("conflict", "Equal values"),
                ImpactType::Penalty,
                |a, b| (a.value == b.value).then_some(SimpleScore::ONE),
            )))
    }

    #[test]
    fn test_evaluate_sets_score() {
        let factory = builder().build(&ScoreDirectorConfig::default()).unwrap();
        let (solution, score) =
            evaluate_solution(factory.as_ref(), ConflictSolution::with_values(&[3, 3, 3])).unwrap();
        assert_eq!(score, SimpleScore::of(-3));
        assert_eq!(solution.score, Some(score));
    }

    #[test]
    fn test_explain_with_rule_engine() {
        let config = ScoreDirectorConfig::new().with_score_director_type(ScoreDirectorType::RuleEngine);
        let factory = builder().build(&config).unwrap();
        let (score, totals) =
            explain_solution(factory.as_ref(), ConflictSolution::with_values(&[1, 1, 2])).unwrap();
        assert_eq!(score, SimpleScore::of(-1));
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].match_count(), 1);
    }

    #[test]
    fn test_explain_needs_explaining_backend() {
        let factory = builder().build(&ScoreDirectorConfig::default()).unwrap();
        let result = explain_solution(factory.as_ref(), ConflictSolution::with_values(&[1]));
        assert!(matches!(result, Err(ScoreDirectorError::ConstraintMatchDisabled)));
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let config = load_config("does/not/exist/score_director.toml").unwrap();
        assert_eq!(config, ScoreDirectorConfig::default());
    }
}
