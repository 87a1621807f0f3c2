//! Score director factories.

use std::sync::Arc;

use scoreforge_config::{EnvironmentMode, ScoreDirectorConfig, ScoreDirectorType};
use scoreforge_core::domain::{SolutionDescriptor, VariableListener};
use scoreforge_core::{LookUpManager, LookUpStrategyType, PlanningSolution, ScoreForgeError};
use tracing::debug;

use super::default::DefaultScoreDirector;
use super::listener_support::{check_registration, ListenerRegistration, VariableListenerSupport};
use super::test_gen::TestGenScoreDirectorFactory;
use super::traits::{InnerScoreDirector, ScoreDirector};
use crate::backend::{
    BackendKind, EasyScoreBackend, EasyScoreCalculator, IncrementalScoreBackend,
    IncrementalScoreCalculator, RuleEngineScoreBackend, ScoreBackend,
};
use crate::error::{Result, ScoreDirectorError};
use crate::rule::RuleBase;

pub type IncrementalSupplier<S> = Arc<dyn Fn() -> Box<dyn IncrementalScoreCalculator<S>> + Send + Sync>;
pub type ListenerSupplier<S> = Arc<dyn Fn() -> Box<dyn VariableListener<S>> + Send + Sync>;

enum BackendSupplier<S: PlanningSolution> {
    Easy(Arc<dyn EasyScoreCalculator<S>>),
    Incremental(IncrementalSupplier<S>),
    RuleEngine(Arc<dyn RuleBase<S::Score>>),
}

impl<S: PlanningSolution> BackendSupplier<S> {
    fn kind(&self) -> BackendKind {
        match self {
            BackendSupplier::Easy(_) => BackendKind::Easy,
            BackendSupplier::Incremental(_) => BackendKind::Incremental,
            BackendSupplier::RuleEngine(_) => BackendKind::RuleEngine,
        }
    }
}

struct ListenerSpec<S> {
    registration: ListenerRegistration,
    supplier: ListenerSupplier<S>,
}

/// Factory behind boxed directors, so wrapping factories can stand in.
pub trait InnerScoreDirectorFactory<S: PlanningSolution>: Send + Sync {
    fn build_score_director(
        &self,
        look_up_enabled: bool,
        constraint_match_enabled_preference: bool,
    ) -> Result<Box<dyn InnerScoreDirector<S>>>;

    /// Builds a director with the configured look-up and constraint match flags.
    fn build_default(&self) -> Result<Box<dyn InnerScoreDirector<S>>>;

    fn solution_descriptor(&self) -> &SolutionDescriptor;

    fn backend_kind(&self) -> BackendKind;
}

/// Builds [`DefaultScoreDirector`]s for one solution type and one backend.
///
/// # Example
///
/// ```
/// use scoreforge_core::SimpleScore;
/// use scoreforge_director::{ScoreDirector, ScoreDirectorFactory};
/// use scoreforge_test::conflict::{calculate_conflicts, create_conflict_descriptor, ConflictSolution};
///
/// let factory = ScoreDirectorFactory::<ConflictSolution>::easy(create_conflict_descriptor(), calculate_conflicts);
/// let mut director = factory.build_score_director(true, false).unwrap();
/// director.set_working_solution(ConflictSolution::with_values(&[1, 1, 2])).unwrap();
/// assert_eq!(director.calculate_score().unwrap(), SimpleScore::of(-1));
/// ```
pub struct ScoreDirectorFactory<S: PlanningSolution> {
    descriptor: Arc<SolutionDescriptor>,
    backend: BackendSupplier<S>,
    look_up_strategy_type: LookUpStrategyType,
    environment_mode: EnvironmentMode,
    assertion_calculator: Option<Arc<dyn EasyScoreCalculator<S>>>,
    listeners: Vec<ListenerSpec<S>>,
    default_look_up_enabled: bool,
    default_constraint_match_enabled: bool,
}

impl<S: PlanningSolution> ScoreDirectorFactory<S> {
    fn with_backend(descriptor: SolutionDescriptor, backend: BackendSupplier<S>) -> Self {
        Self {
            descriptor: Arc::new(descriptor),
            backend,
            look_up_strategy_type: LookUpStrategyType::default(),
            environment_mode: EnvironmentMode::default(),
            assertion_calculator: None,
            listeners: Vec::new(),
            default_look_up_enabled: true,
            default_constraint_match_enabled: true,
        }
    }

    /// Full recalculation with `calculator`.
    pub fn easy(descriptor: SolutionDescriptor, calculator: impl EasyScoreCalculator<S> + 'static) -> Self {
        Self::with_backend(descriptor, BackendSupplier::Easy(Arc::new(calculator)))
    }

    /// Delta calculation; `supplier` creates one calculator per director.
    pub fn incremental<F, C>(descriptor: SolutionDescriptor, supplier: F) -> Self
    where
        F: Fn() -> C + Send + Sync + 'static,
        C: IncrementalScoreCalculator<S> + 'static,
    {
        let supplier: IncrementalSupplier<S> =
            Arc::new(move || Box::new(supplier()) as Box<dyn IncrementalScoreCalculator<S>>);
        Self::with_backend(descriptor, BackendSupplier::Incremental(supplier))
    }

    /// Rule evaluation; every director opens its own session of `rule_base`.
    pub fn rule_engine(
        descriptor: SolutionDescriptor,
        rule_base: impl RuleBase<S::Score> + 'static,
    ) -> Self {
        Self::with_backend(descriptor, BackendSupplier::RuleEngine(Arc::new(rule_base)))
    }

    pub fn with_look_up_strategy_type(mut self, strategy_type: LookUpStrategyType) -> Self {
        self.look_up_strategy_type = strategy_type;
        self
    }

    pub fn with_environment_mode(mut self, environment_mode: EnvironmentMode) -> Self {
        self.environment_mode = environment_mode;
        self
    }

    /// Calculator the assertion modes compare every score with.
    ///
    /// Defaults to the easy calculator of an easy factory.
    pub fn with_assertion_calculator(mut self, calculator: impl EasyScoreCalculator<S> + 'static) -> Self {
        self.assertion_calculator = Some(Arc::new(calculator));
        self
    }

    /// Flags used by [`build_default`](InnerScoreDirectorFactory::build_default).
    pub fn with_defaults(mut self, look_up_enabled: bool, constraint_match_enabled: bool) -> Self {
        self.default_look_up_enabled = look_up_enabled;
        self.default_constraint_match_enabled = constraint_match_enabled;
        self
    }

    /// Appends a variable listener to the chain of every director.
    ///
    /// Fails on unknown variables and on registrations that close a cycle.
    pub fn with_variable_listener<F, L>(
        mut self,
        registration: ListenerRegistration,
        supplier: F,
    ) -> Result<Self>
    where
        F: Fn() -> L + Send + Sync + 'static,
        L: VariableListener<S> + 'static,
    {
        check_registration(
            &self.descriptor,
            self.listeners.iter().map(|l| &l.registration),
            &registration,
        )?;
        let supplier: ListenerSupplier<S> =
            Arc::new(move || Box::new(supplier()) as Box<dyn VariableListener<S>>);
        self.listeners.push(ListenerSpec {
            registration,
            supplier,
        });
        Ok(self)
    }

    pub fn look_up_strategy_type(&self) -> LookUpStrategyType {
        self.look_up_strategy_type
    }

    pub fn environment_mode(&self) -> EnvironmentMode {
        self.environment_mode
    }

    pub fn solution_descriptor(&self) -> &SolutionDescriptor {
        &self.descriptor
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// Returns the rule source texts; empty unless the backend is a rule engine.
    pub fn rule_sources(&self) -> Vec<String> {
        match &self.backend {
            BackendSupplier::RuleEngine(rule_base) => rule_base.rule_sources(),
            _ => Vec::new(),
        }
    }

    /// Builds a director.
    ///
    /// Constraint match is enabled only if preferred and supported by the
    /// backend.
    pub fn build_score_director(
        &self,
        look_up_enabled: bool,
        constraint_match_enabled_preference: bool,
    ) -> Result<DefaultScoreDirector<S>> {
        let backend: Box<dyn ScoreBackend<S>> = match &self.backend {
            BackendSupplier::Easy(calculator) => {
                Box::new(EasyScoreBackend::new(Arc::clone(calculator)))
            }
            BackendSupplier::Incremental(supplier) => {
                Box::new(IncrementalScoreBackend::new(supplier()))
            }
            BackendSupplier::RuleEngine(rule_base) => {
                if !self.descriptor.all_extractors_configured() {
                    return Err(ScoreForgeError::DomainModel(
                        "the rule engine needs an extractor on every descriptor".to_string(),
                    )
                    .into());
                }
                Box::new(RuleEngineScoreBackend::new(
                    Arc::clone(&self.descriptor),
                    Arc::clone(rule_base),
                ))
            }
        };

        let mut listeners = VariableListenerSupport::new();
        for spec in &self.listeners {
            listeners.register(&self.descriptor, spec.registration.clone(), (spec.supplier)())?;
        }

        let mut director = DefaultScoreDirector::new(Arc::clone(&self.descriptor), backend)
            .with_listeners(listeners)
            .with_constraint_match(constraint_match_enabled_preference);
        if look_up_enabled {
            director = director.with_look_up(LookUpManager::new(
                self.look_up_strategy_type,
                &self.descriptor,
            )?);
        }
        if self.environment_mode.is_asserted() {
            director = director.with_assertion(self.resolve_assertion_calculator()?, self.environment_mode);
        }

        debug!(
            backend = self.backend.kind().label(),
            look_up_enabled,
            constraint_match_enabled = director.is_constraint_match_enabled(),
            environment_mode = ?self.environment_mode,
            listeners = self.listeners.len(),
            "Built score director"
        );
        Ok(director)
    }

    /// Builds a director with the flags set by [`with_defaults`](Self::with_defaults).
    pub fn build_default(&self) -> Result<DefaultScoreDirector<S>> {
        self.build_score_director(
            self.default_look_up_enabled,
            self.default_constraint_match_enabled,
        )
    }

    /// Returns the calculator the assertion modes compare with.
    ///
    /// Fails for a non-easy backend without an assertion calculator, since
    /// the configured checks could not run.
    fn resolve_assertion_calculator(&self) -> Result<Arc<dyn EasyScoreCalculator<S>>> {
        if let Some(calculator) = &self.assertion_calculator {
            return Ok(Arc::clone(calculator));
        }
        match &self.backend {
            BackendSupplier::Easy(calculator) => Ok(Arc::clone(calculator)),
            _ => Err(ScoreForgeError::Config(format!(
                "environment mode {:?} needs an assertion calculator for the {} backend",
                self.environment_mode,
                self.backend.kind().label()
            ))
            .into()),
        }
    }

    pub(crate) fn default_flags(&self) -> (bool, bool) {
        (
            self.default_look_up_enabled,
            self.default_constraint_match_enabled,
        )
    }
}

impl<S: PlanningSolution> InnerScoreDirectorFactory<S> for ScoreDirectorFactory<S> {
    fn build_score_director(
        &self,
        look_up_enabled: bool,
        constraint_match_enabled_preference: bool,
    ) -> Result<Box<dyn InnerScoreDirector<S>>> {
        let director = ScoreDirectorFactory::build_score_director(
            self,
            look_up_enabled,
            constraint_match_enabled_preference,
        )?;
        Ok(Box::new(director))
    }

    fn build_default(&self) -> Result<Box<dyn InnerScoreDirector<S>>> {
        Ok(Box::new(ScoreDirectorFactory::build_default(self)?))
    }

    fn solution_descriptor(&self) -> &SolutionDescriptor {
        &self.descriptor
    }

    fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }
}

/// Assembles a factory from a [`ScoreDirectorConfig`].
///
/// Calculators for every backend can be supplied; the config picks one.
///
/// ```
/// use scoreforge_config::{ScoreDirectorConfig, ScoreDirectorType};
/// use scoreforge_core::SimpleScore;
/// use scoreforge_director::{InnerScoreDirectorFactory, ScoreDirector, ScoreDirectorFactoryBuilder};
/// use scoreforge_test::conflict::{calculate_conflicts, create_conflict_descriptor, ConflictSolution};
///
/// let config = ScoreDirectorConfig::from_toml_str(r#"
///     score_director_type = "easy"
///     environment_mode = "full_assert"
/// "#).unwrap();
/// let factory = ScoreDirectorFactoryBuilder::<ConflictSolution>::new(create_conflict_descriptor())
///     .with_easy_calculator(calculate_conflicts)
///     .build(&config)
///     .unwrap();
///
/// let mut director = factory.build_default().unwrap();
/// director.set_working_solution(ConflictSolution::with_values(&[2, 2])).unwrap();
/// assert_eq!(director.calculate_score().unwrap(), SimpleScore::of(-1));
/// ```
pub struct ScoreDirectorFactoryBuilder<S: PlanningSolution> {
    descriptor: SolutionDescriptor,
    easy: Option<Arc<dyn EasyScoreCalculator<S>>>,
    incremental: Option<IncrementalSupplier<S>>,
    rule_base: Option<Arc<dyn RuleBase<S::Score>>>,
    assertion: Option<Arc<dyn EasyScoreCalculator<S>>>,
    listeners: Vec<ListenerSpec<S>>,
}

impl<S: PlanningSolution> ScoreDirectorFactoryBuilder<S> {
    pub fn new(descriptor: SolutionDescriptor) -> Self {
        Self {
            descriptor,
            easy: None,
            incremental: None,
            rule_base: None,
            assertion: None,
            listeners: Vec::new(),
        }
    }

    pub fn with_easy_calculator(mut self, calculator: impl EasyScoreCalculator<S> + 'static) -> Self {
        self.easy = Some(Arc::new(calculator));
        self
    }

    pub fn with_incremental_calculator<F, C>(mut self, supplier: F) -> Self
    where
        F: Fn() -> C + Send + Sync + 'static,
        C: IncrementalScoreCalculator<S> + 'static,
    {
        self.incremental = Some(Arc::new(move || {
            Box::new(supplier()) as Box<dyn IncrementalScoreCalculator<S>>
        }));
        self
    }

    pub fn with_rule_base(mut self, rule_base: impl RuleBase<S::Score> + 'static) -> Self {
        self.rule_base = Some(Arc::new(rule_base));
        self
    }

    /// Calculator compared with in assertion modes; defaults to the easy calculator.
    pub fn with_assertion_calculator(mut self, calculator: impl EasyScoreCalculator<S> + 'static) -> Self {
        self.assertion = Some(Arc::new(calculator));
        self
    }

    pub fn with_variable_listener<F, L>(mut self, registration: ListenerRegistration, supplier: F) -> Self
    where
        F: Fn() -> L + Send + Sync + 'static,
        L: VariableListener<S> + 'static,
    {
        self.listeners.push(ListenerSpec {
            registration,
            supplier: Arc::new(move || Box::new(supplier()) as Box<dyn VariableListener<S>>),
        });
        self
    }

    /// Validates `config` against the supplied calculators and builds the factory.
    pub fn build(self, config: &ScoreDirectorConfig) -> Result<Box<dyn InnerScoreDirectorFactory<S>>> {
        config
            .validate()
            .map_err(|e| ScoreForgeError::Config(e.to_string()))?;
        let missing = |what: &str| {
            ScoreDirectorError::from(ScoreForgeError::Config(format!(
                "score director type {:?} needs {}",
                config.score_director_type, what
            )))
        };
        let backend = match config.score_director_type {
            ScoreDirectorType::Easy => BackendSupplier::Easy(
                self.easy.clone().ok_or_else(|| missing("an easy score calculator"))?,
            ),
            ScoreDirectorType::Incremental => BackendSupplier::Incremental(
                self.incremental
                    .ok_or_else(|| missing("an incremental score calculator"))?,
            ),
            ScoreDirectorType::RuleEngine => BackendSupplier::RuleEngine(
                self.rule_base.ok_or_else(|| missing("a rule base"))?,
            ),
        };

        let mut factory = ScoreDirectorFactory::with_backend(self.descriptor, backend)
            .with_look_up_strategy_type(config.look_up_strategy_type)
            .with_environment_mode(config.environment_mode)
            .with_defaults(config.look_up_enabled, config.constraint_match_enabled);
        factory.assertion_calculator = self.assertion.or(self.easy);
        if factory.environment_mode.is_asserted() {
            factory.resolve_assertion_calculator()?;
        }
        for spec in self.listeners {
            check_registration(
                &factory.descriptor,
                factory.listeners.iter().map(|l| &l.registration),
                &spec.registration,
            )?;
            factory.listeners.push(spec);
        }

        if config.test_gen {
            Ok(Box::new(TestGenScoreDirectorFactory::new(factory)?))
        } else {
            Ok(Box::new(factory))
        }
    }
}
