//! Diagnostic capture of the calls made on a rule-engine score director.
//!
//! A [`TestGenScoreDirector`] records the initial working solution, every
//! notification with a snapshot of the touched object, every trigger and
//! every score into a [`TestGenJournal`]. The journal renders to text for a
//! bug report and replays onto a fresh director to reproduce a failure.

use std::any::Any;

use scoreforge_core::domain::{BoxedObject, CollectionKind, EntityPosition, SolutionDescriptor, VariableId};
use scoreforge_core::{PlanningSolution, ScoreForgeError};
use tracing::{info, warn};

use super::default::DefaultScoreDirector;
use super::factory::{InnerScoreDirectorFactory, ScoreDirectorFactory};
use super::state::Notification;
use super::traits::{InnerScoreDirector, ScoreDirector};
use crate::backend::BackendKind;
use crate::constraint_match::ConstraintMatchTotal;
use crate::error::{Result, ScoreDirectorError};

/// One recorded call.
pub enum JournalEntry {
    Before(Notification),
    /// `snapshot` is the touched object right after the change; `None` for removals.
    After {
        notification: Notification,
        snapshot: Option<BoxedObject>,
    },
    Trigger,
    /// Display of the calculated score, or of the error.
    Score(String),
}

/// Recorded calls of one working solution.
pub struct TestGenJournal<S> {
    rule_sources: Vec<String>,
    initial: Option<S>,
    entries: Vec<JournalEntry>,
}

fn notify_before<S: PlanningSolution>(
    director: &mut dyn InnerScoreDirector<S>,
    notification: Notification,
) -> Result<()> {
    match notification {
        Notification::EntityAdded(p) => director.before_entity_added(p.descriptor_index, p.entity_index),
        Notification::VariableChanged {
            variable,
            entity_index,
        } => director.before_variable_changed_by_id(variable, entity_index),
        Notification::EntityRemoved(p) => {
            director.before_entity_removed(p.descriptor_index, p.entity_index)
        }
        Notification::ProblemFactAdded {
            descriptor_index,
            fact_index,
        } => director.before_problem_fact_added(descriptor_index, fact_index),
        Notification::ProblemFactRemoved {
            descriptor_index,
            fact_index,
        } => director.before_problem_fact_removed(descriptor_index, fact_index),
        Notification::ProblemPropertyChanged {
            descriptor_index,
            fact_index,
        } => director.before_problem_property_changed(descriptor_index, fact_index),
    }
}

fn notify_after<S: PlanningSolution>(
    director: &mut dyn InnerScoreDirector<S>,
    notification: Notification,
) -> Result<()> {
    match notification {
        Notification::EntityAdded(p) => director.after_entity_added(p.descriptor_index, p.entity_index),
        Notification::VariableChanged {
            variable,
            entity_index,
        } => director.after_variable_changed_by_id(variable, entity_index),
        Notification::EntityRemoved(p) => {
            director.after_entity_removed(p.descriptor_index, p.entity_index)
        }
        Notification::ProblemFactAdded {
            descriptor_index,
            fact_index,
        } => director.after_problem_fact_added(descriptor_index, fact_index),
        Notification::ProblemFactRemoved {
            descriptor_index,
            fact_index,
        } => director.after_problem_fact_removed(descriptor_index, fact_index),
        Notification::ProblemPropertyChanged {
            descriptor_index,
            fact_index,
        } => director.after_problem_property_changed(descriptor_index, fact_index),
    }
}

/// Performs on the working solution the change a recorded after call reports.
fn apply_change<S: PlanningSolution>(
    director: &mut dyn InnerScoreDirector<S>,
    notification: Notification,
    snapshot: Option<&(dyn Any + Send + Sync)>,
) -> Result<()> {
    let (kind, descriptor_index, index) = notification.target();
    let descriptor = director.solution_descriptor();
    let type_name = descriptor.collection_type_name(kind, descriptor_index)?;
    let extractor = descriptor.extractor(kind, descriptor_index)?.clone_box();
    let value = snapshot.and_then(|s| extractor.clone_boxed_value(s));
    let solution = director.working_solution_mut()? as &mut dyn Any;

    let applied = match notification {
        Notification::EntityAdded(_) | Notification::ProblemFactAdded { .. } => {
            value.is_some_and(|v| extractor.insert_entity_boxed(solution, index, v))
        }
        Notification::VariableChanged { .. } | Notification::ProblemPropertyChanged { .. } => {
            value.is_some_and(|v| extractor.replace_entity_boxed(solution, index, v))
        }
        Notification::EntityRemoved(_) | Notification::ProblemFactRemoved { .. } => {
            extractor.remove_entity(solution, index).is_some()
        }
    };
    if applied {
        Ok(())
    } else {
        Err(ScoreDirectorError::UnknownObject { type_name, index })
    }
}

impl<S: PlanningSolution> TestGenJournal<S> {
    fn new(rule_sources: Vec<String>) -> Self {
        Self {
            rule_sources,
            initial: None,
            entries: Vec::new(),
        }
    }

    fn start(&mut self, initial: S) {
        self.initial = Some(initial);
        self.entries.clear();
    }

    pub fn rule_sources(&self) -> &[String] {
        &self.rule_sources
    }

    pub fn initial_solution(&self) -> Option<&S> {
        self.initial.as_ref()
    }

    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    /// Number of recorded score calculations.
    pub fn score_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, JournalEntry::Score(_)))
            .count()
    }

    /// Renders the journal as text, objects by their `Debug` output.
    pub fn render(&self, descriptor: &SolutionDescriptor) -> String {
        let mut lines = vec!["rules:".to_string()];
        for source in &self.rule_sources {
            lines.extend(source.lines().map(|line| format!("    {}", line)));
        }

        lines.push(format!("initial {}:", descriptor.type_name));
        if let Some(initial) = &self.initial {
            let collections = [
                (CollectionKind::Entity, descriptor.entity_descriptor_count()),
                (CollectionKind::ProblemFact, descriptor.problem_fact_descriptor_count()),
            ];
            for (kind, descriptor_count) in collections {
                for descriptor_index in 0..descriptor_count {
                    let (Ok(type_name), Ok(extractor)) = (
                        descriptor.collection_type_name(kind, descriptor_index),
                        descriptor.extractor(kind, descriptor_index),
                    ) else {
                        continue;
                    };
                    let count = extractor.count(initial as &dyn Any).unwrap_or(0);
                    for index in 0..count {
                        let shown = extractor
                            .debug_entity(initial as &dyn Any, index)
                            .unwrap_or_default();
                        lines.push(format!("    {}[{}] = {}", type_name, index, shown));
                    }
                }
            }
        }

        lines.push("steps:".to_string());
        for entry in &self.entries {
            lines.push(match entry {
                JournalEntry::Before(notification) => format!("    before {}", notification),
                JournalEntry::After {
                    notification,
                    snapshot,
                } => {
                    let (kind, descriptor_index, _) = notification.target();
                    let shown = snapshot.as_deref().and_then(|value| {
                        descriptor
                            .extractor(kind, descriptor_index)
                            .ok()?
                            .debug_value(value)
                    });
                    match shown {
                        Some(shown) => format!("    after {} => {}", notification, shown),
                        None => format!("    after {}", notification),
                    }
                }
                JournalEntry::Trigger => "    trigger variable listeners".to_string(),
                JournalEntry::Score(score) => format!("    score {}", score),
            });
        }
        lines.join("\n")
    }

    /// Repeats the recorded calls on `director` and returns its scores.
    ///
    /// Fails with the first error the director reports, which is how a
    /// recorded corruption reproduces.
    pub fn replay(&self, director: &mut dyn InnerScoreDirector<S>) -> Result<Vec<S::Score>> {
        let initial = self.initial.clone().ok_or_else(|| {
            ScoreDirectorError::Protocol("the journal holds no working solution".to_string())
        })?;
        director.set_working_solution(initial)?;

        let mut scores = Vec::new();
        for entry in &self.entries {
            match entry {
                JournalEntry::Before(notification) => notify_before(director, *notification)?,
                JournalEntry::After {
                    notification,
                    snapshot,
                } => {
                    apply_change(director, *notification, snapshot.as_deref())?;
                    notify_after(director, *notification)?;
                }
                JournalEntry::Trigger => director.trigger_variable_listeners()?,
                JournalEntry::Score(_) => scores.push(director.calculate_score()?),
            }
        }
        Ok(scores)
    }
}

/// Default score director that records a [`TestGenJournal`].
pub struct TestGenScoreDirector<S: PlanningSolution> {
    inner: DefaultScoreDirector<S>,
    journal: TestGenJournal<S>,
}

impl<S: PlanningSolution> TestGenScoreDirector<S> {
    pub fn journal(&self) -> &TestGenJournal<S> {
        &self.journal
    }

    pub fn render_journal(&self) -> String {
        self.journal.render(self.inner.solution_descriptor())
    }

    pub fn inner(&self) -> &DefaultScoreDirector<S> {
        &self.inner
    }

    fn before(&mut self, notification: Notification) -> Result<()> {
        notify_before(&mut self.inner, notification)?;
        self.journal.entries.push(JournalEntry::Before(notification));
        Ok(())
    }

    fn after(&mut self, notification: Notification) -> Result<()> {
        notify_after(&mut self.inner, notification)?;
        let snapshot = if notification.is_removal() {
            None
        } else {
            let (kind, descriptor_index, index) = notification.target();
            let descriptor = self.inner.solution_descriptor();
            self.inner.working_solution().ok().and_then(|solution| {
                descriptor
                    .extractor(kind, descriptor_index)
                    .ok()?
                    .clone_entity_boxed(solution as &dyn Any, index)
            })
        };
        self.journal.entries.push(JournalEntry::After {
            notification,
            snapshot,
        });
        Ok(())
    }

    fn variable(&self, descriptor_index: usize, variable_name: &str) -> Result<VariableId> {
        Ok(self
            .inner
            .solution_descriptor()
            .variable_id(descriptor_index, variable_name)?)
    }
}

impl<S: PlanningSolution> ScoreDirector<S> for TestGenScoreDirector<S> {
    fn set_working_solution(&mut self, solution: S) -> Result<()> {
        let initial = solution.clone();
        self.inner.set_working_solution(solution)?;
        self.journal.start(initial);
        info!(rules = self.journal.rule_sources.len(), "Test-gen journal capture started");
        Ok(())
    }

    fn working_solution(&self) -> Result<&S> {
        self.inner.working_solution()
    }

    fn working_solution_mut(&mut self) -> Result<&mut S> {
        self.inner.working_solution_mut()
    }

    fn clone_working_solution(&self) -> Result<S> {
        self.inner.clone_working_solution()
    }

    fn solution_descriptor(&self) -> &SolutionDescriptor {
        self.inner.solution_descriptor()
    }

    fn calculate_score(&mut self) -> Result<S::Score> {
        let result = self.inner.calculate_score();
        let shown = match &result {
            Ok(score) => score.to_string(),
            Err(error) => format!("error: {}", error),
        };
        self.journal.entries.push(JournalEntry::Score(shown));
        if let Err(error @ ScoreDirectorError::ScoreCorruption { .. }) = &result {
            warn!(error = %error, journal = %self.render_journal(), "Score corruption captured");
        }
        result
    }

    fn is_constraint_match_enabled(&self) -> bool {
        self.inner.is_constraint_match_enabled()
    }

    fn constraint_match_totals(&self) -> Result<Vec<ConstraintMatchTotal<S::Score>>> {
        self.inner.constraint_match_totals()
    }

    fn before_entity_added(&mut self, descriptor_index: usize, entity_index: usize) -> Result<()> {
        self.before(Notification::EntityAdded(EntityPosition::new(descriptor_index, entity_index)))
    }

    fn after_entity_added(&mut self, descriptor_index: usize, entity_index: usize) -> Result<()> {
        self.after(Notification::EntityAdded(EntityPosition::new(descriptor_index, entity_index)))
    }

    fn before_variable_changed(
        &mut self,
        descriptor_index: usize,
        entity_index: usize,
        variable_name: &str,
    ) -> Result<()> {
        let variable = self.variable(descriptor_index, variable_name)?;
        self.before_variable_changed_by_id(variable, entity_index)
    }

    fn after_variable_changed(
        &mut self,
        descriptor_index: usize,
        entity_index: usize,
        variable_name: &str,
    ) -> Result<()> {
        let variable = self.variable(descriptor_index, variable_name)?;
        self.after_variable_changed_by_id(variable, entity_index)
    }

    fn before_entity_removed(&mut self, descriptor_index: usize, entity_index: usize) -> Result<()> {
        self.before(Notification::EntityRemoved(EntityPosition::new(descriptor_index, entity_index)))
    }

    fn after_entity_removed(&mut self, descriptor_index: usize, entity_index: usize) -> Result<()> {
        self.after(Notification::EntityRemoved(EntityPosition::new(descriptor_index, entity_index)))
    }

    fn trigger_variable_listeners(&mut self) -> Result<()> {
        self.inner.trigger_variable_listeners()?;
        self.journal.entries.push(JournalEntry::Trigger);
        Ok(())
    }

    fn before_problem_fact_added(&mut self, descriptor_index: usize, fact_index: usize) -> Result<()> {
        self.before(Notification::ProblemFactAdded {
            descriptor_index,
            fact_index,
        })
    }

    fn after_problem_fact_added(&mut self, descriptor_index: usize, fact_index: usize) -> Result<()> {
        self.after(Notification::ProblemFactAdded {
            descriptor_index,
            fact_index,
        })
    }

    fn before_problem_fact_removed(&mut self, descriptor_index: usize, fact_index: usize) -> Result<()> {
        self.before(Notification::ProblemFactRemoved {
            descriptor_index,
            fact_index,
        })
    }

    fn after_problem_fact_removed(&mut self, descriptor_index: usize, fact_index: usize) -> Result<()> {
        self.after(Notification::ProblemFactRemoved {
            descriptor_index,
            fact_index,
        })
    }

    fn before_problem_property_changed(
        &mut self,
        descriptor_index: usize,
        fact_index: usize,
    ) -> Result<()> {
        self.before(Notification::ProblemPropertyChanged {
            descriptor_index,
            fact_index,
        })
    }

    fn after_problem_property_changed(
        &mut self,
        descriptor_index: usize,
        fact_index: usize,
    ) -> Result<()> {
        self.after(Notification::ProblemPropertyChanged {
            descriptor_index,
            fact_index,
        })
    }

    fn look_up_erased(&self, external: &dyn Any, type_name: &'static str) -> Result<&dyn Any> {
        self.inner.look_up_erased(external, type_name)
    }

    fn look_up_erased_mut(
        &mut self,
        external: &dyn Any,
        type_name: &'static str,
    ) -> Result<&mut dyn Any> {
        self.inner.look_up_erased_mut(external, type_name)
    }

    fn is_incremental(&self) -> bool {
        self.inner.is_incremental()
    }

    fn dispose(&mut self) {
        self.inner.dispose();
    }
}

impl<S: PlanningSolution> InnerScoreDirector<S> for TestGenScoreDirector<S> {
    fn before_variable_changed_by_id(
        &mut self,
        variable: VariableId,
        entity_index: usize,
    ) -> Result<()> {
        self.before(Notification::VariableChanged {
            variable,
            entity_index,
        })
    }

    fn after_variable_changed_by_id(
        &mut self,
        variable: VariableId,
        entity_index: usize,
    ) -> Result<()> {
        self.after(Notification::VariableChanged {
            variable,
            entity_index,
        })
    }

    fn calculation_count(&self) -> u64 {
        self.inner.calculation_count()
    }

    fn backend_kind(&self) -> BackendKind {
        self.inner.backend_kind()
    }
}

/// Factory wrapping a rule-engine factory whose directors record a journal.
///
/// The rule sources are captured once, when the factory is created.
pub struct TestGenScoreDirectorFactory<S: PlanningSolution> {
    inner: ScoreDirectorFactory<S>,
    rule_sources: Vec<String>,
}

impl<S: PlanningSolution> TestGenScoreDirectorFactory<S> {
    /// Fails unless `inner` uses the rule engine backend.
    pub fn new(inner: ScoreDirectorFactory<S>) -> Result<Self> {
        if inner.backend_kind() != BackendKind::RuleEngine {
            return Err(ScoreForgeError::Config(format!(
                "test generation needs the rule_engine backend, not {}",
                inner.backend_kind().label()
            ))
            .into());
        }
        let rule_sources = inner.rule_sources();
        info!(rules = rule_sources.len(), "Captured rule sources for test generation");
        Ok(Self {
            inner,
            rule_sources,
        })
    }

    pub fn rule_sources(&self) -> &[String] {
        &self.rule_sources
    }

    pub fn build_score_director(
        &self,
        look_up_enabled: bool,
        constraint_match_enabled_preference: bool,
    ) -> Result<TestGenScoreDirector<S>> {
        let inner = self
            .inner
            .build_score_director(look_up_enabled, constraint_match_enabled_preference)?;
        Ok(TestGenScoreDirector {
            inner,
            journal: TestGenJournal::new(self.rule_sources.clone()),
        })
    }

    /// Builds a director that replays onto the same configuration without recording.
    pub fn build_replay_director(&self) -> Result<DefaultScoreDirector<S>> {
        self.inner.build_default()
    }
}

impl<S: PlanningSolution> InnerScoreDirectorFactory<S> for TestGenScoreDirectorFactory<S> {
    fn build_score_director(
        &self,
        look_up_enabled: bool,
        constraint_match_enabled_preference: bool,
    ) -> Result<Box<dyn InnerScoreDirector<S>>> {
        let director = TestGenScoreDirectorFactory::build_score_director(
            self,
            look_up_enabled,
            constraint_match_enabled_preference,
        )?;
        Ok(Box::new(director))
    }

    fn build_default(&self) -> Result<Box<dyn InnerScoreDirector<S>>> {
        let (look_up_enabled, constraint_match_enabled) = self.inner.default_flags();
        InnerScoreDirectorFactory::build_score_director(self, look_up_enabled, constraint_match_enabled)
    }

    fn solution_descriptor(&self) -> &SolutionDescriptor {
        self.inner.solution_descriptor()
    }

    fn backend_kind(&self) -> BackendKind {
        BackendKind::RuleEngine
    }
}
