use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use scoreforge_config::{EnvironmentMode, ScoreDirectorConfig, ScoreDirectorType};
use scoreforge_core::domain::{
    EntityPosition, ShadowContext, VariableId, VariableListener, VariableNotification,
};
use scoreforge_core::{
    ConstraintRef, ImpactType, LookUpError, LookUpStrategyType, ScoreForgeError, SimpleScore,
};
use scoreforge_test::chain::{
    calculate_gaps, create_chain_descriptor, ChainSolution, Job, NextJobListener, NEXT_VARIABLE,
    ORDER_VARIABLE,
};
use scoreforge_test::conflict::{
    calculate_conflicts, create_conflict_descriptor, ConflictSolution, Forbidden, ValueSlot,
    VALUE_VARIABLE,
};

use super::*;
use crate::backend::{BackendKind, IncrementalScoreCalculator};
use crate::error::ScoreDirectorError;
use crate::rule::{BiRule, ConstraintRuleBase, JoinRule};

/// Incremental counterpart of `calculate_conflicts`.
#[derive(Default)]
struct ConflictCounter {
    slot_counts: HashMap<i64, i64>,
    forbidden_counts: HashMap<i64, i64>,
    conflicts: i64,
    // Deliberately wrong: variable changes are not tracked.
    ignore_changes: bool,
}

impl ConflictCounter {
    fn stale() -> Self {
        Self {
            ignore_changes: true,
            ..Self::default()
        }
    }

    fn insert(&mut self, value: i64) {
        let forbidden = self.forbidden_counts.get(&value).copied().unwrap_or(0);
        let count = self.slot_counts.entry(value).or_insert(0);
        self.conflicts += *count + forbidden;
        *count += 1;
    }

    fn retract(&mut self, value: i64) {
        let forbidden = self.forbidden_counts.get(&value).copied().unwrap_or(0);
        let count = self.slot_counts.entry(value).or_insert(0);
        *count -= 1;
        self.conflicts -= *count + forbidden;
    }
}

impl IncrementalScoreCalculator<ConflictSolution> for ConflictCounter {
    fn reset_working_solution(&mut self, solution: &ConflictSolution, _constraint_match_enabled: bool) {
        self.slot_counts.clear();
        self.forbidden_counts.clear();
        self.conflicts = 0;
        for forbidden in &solution.forbidden {
            *self.forbidden_counts.entry(forbidden.value).or_insert(0) += 1;
        }
        for slot in &solution.slots {
            self.insert(slot.value);
        }
    }

    fn after_entity_added(&mut self, solution: &ConflictSolution, entity: EntityPosition) {
        if let Some(slot) = solution.slots.get(entity.entity_index) {
            self.insert(slot.value);
        }
    }

    fn before_variable_changed(&mut self, solution: &ConflictSolution, _variable: VariableId, entity_index: usize) {
        if self.ignore_changes {
            return;
        }
        if let Some(slot) = solution.slots.get(entity_index) {
            self.retract(slot.value);
        }
    }

    fn after_variable_changed(&mut self, solution: &ConflictSolution, _variable: VariableId, entity_index: usize) {
        if self.ignore_changes {
            return;
        }
        if let Some(slot) = solution.slots.get(entity_index) {
            self.insert(slot.value);
        }
    }

    fn before_entity_removed(&mut self, solution: &ConflictSolution, entity: EntityPosition) {
        if let Some(slot) = solution.slots.get(entity.entity_index) {
            self.retract(slot.value);
        }
    }

    fn calculate_score(&mut self) -> SimpleScore {
        SimpleScore::of(-self.conflicts)
    }
}

fn conflict_rule_base() -> ConstraintRuleBase<SimpleScore> {
    ConstraintRuleBase::new()
        .with_bi_rule(BiRule::new::<ValueSlot, _>(
            ConstraintRef::new("conflict", "Equal values"),
            ImpactType::Penalty,
            |a, b| (a.value == b.value).then_some(SimpleScore::ONE),
        ))
        .with_join_rule(JoinRule::new::<ValueSlot, Forbidden, _>(
            ConstraintRef::new("conflict", "Forbidden value"),
            ImpactType::Penalty,
            |slot, forbidden| (slot.value == forbidden.value).then_some(SimpleScore::ONE),
        ))
}

fn easy_factory() -> ScoreDirectorFactory<ConflictSolution> {
    ScoreDirectorFactory::easy(create_conflict_descriptor(), calculate_conflicts)
}

fn incremental_factory() -> ScoreDirectorFactory<ConflictSolution> {
    ScoreDirectorFactory::incremental(create_conflict_descriptor(), ConflictCounter::default)
}

fn rule_factory() -> ScoreDirectorFactory<ConflictSolution> {
    ScoreDirectorFactory::rule_engine(create_conflict_descriptor(), conflict_rule_base())
}

fn all_factories() -> Vec<ScoreDirectorFactory<ConflictSolution>> {
    vec![easy_factory(), incremental_factory(), rule_factory()]
}

fn director_with(
    factory: &ScoreDirectorFactory<ConflictSolution>,
    values: &[i64],
) -> DefaultScoreDirector<ConflictSolution> {
    let mut director = factory.build_default().unwrap();
    director
        .set_working_solution(ConflictSolution::with_values(values))
        .unwrap();
    director
}

fn set_value(director: &mut DefaultScoreDirector<ConflictSolution>, index: usize, value: i64) {
    director.before_variable_changed(0, index, "value").unwrap();
    director.working_solution_mut().unwrap().slots[index].value = value;
    director.after_variable_changed(0, index, "value").unwrap();
}

fn score(value: i64) -> SimpleScore {
    SimpleScore::of(value)
}

#[test]
fn test_value_change_scenario_on_every_backend() {
    for factory in all_factories() {
        let kind = factory.backend_kind();
        let mut director = director_with(&factory, &[1, 1, 2]);
        assert_eq!(director.calculate_score().unwrap(), score(-1), "{:?}", kind);

        set_value(&mut director, 1, 3);
        assert_eq!(director.calculate_score().unwrap(), score(0), "{:?}", kind);

        set_value(&mut director, 1, 1);
        assert_eq!(director.calculate_score().unwrap(), score(-1), "{:?}", kind);
    }
}

#[test]
fn test_backends_agree_on_entity_add_and_remove() {
    for factory in all_factories() {
        let kind = factory.backend_kind();
        let mut director = director_with(&factory, &[1, 2, 1]);

        director.before_entity_added(0, 1).unwrap();
        director
            .working_solution_mut()
            .unwrap()
            .slots
            .insert(1, ValueSlot::new(3, 2));
        director.after_entity_added(0, 1).unwrap();
        assert_eq!(director.calculate_score().unwrap(), score(-2), "{:?}", kind);

        director.before_entity_removed(0, 0).unwrap();
        director.working_solution_mut().unwrap().slots.remove(0);
        director.after_entity_removed(0, 0).unwrap();
        assert_eq!(director.calculate_score().unwrap(), score(-1), "{:?}", kind);

        // Positions shifted after the removal: [2, 2, 1].
        set_value(&mut director, 2, 2);
        let expected = calculate_conflicts(director.working_solution().unwrap());
        assert_eq!(director.calculate_score().unwrap(), expected, "{:?}", kind);
        assert_eq!(expected, score(-3));
    }
}

#[test]
fn test_incremental_backends_report_incremental() {
    assert!(!director_with(&easy_factory(), &[1]).is_incremental());
    assert!(director_with(&incremental_factory(), &[1]).is_incremental());
    assert!(director_with(&rule_factory(), &[1]).is_incremental());
    assert_eq!(director_with(&rule_factory(), &[1]).backend_kind(), BackendKind::RuleEngine);
}

#[test]
fn test_calculate_score_is_idempotent() {
    for factory in all_factories() {
        let mut director = director_with(&factory, &[4, 4, 4]);
        let first = director.calculate_score().unwrap();
        let second = director.calculate_score().unwrap();
        assert_eq!(first, second);
        assert_eq!(first, score(-3));
        assert_eq!(director.calculation_count(), 1);
    }
}

#[test]
fn test_score_is_written_to_working_solution() {
    let mut director = director_with(&easy_factory(), &[1, 1]);
    director.calculate_score().unwrap();
    assert_eq!(director.working_solution().unwrap().score, Some(score(-1)));
}

#[test]
fn test_facade_matches_manual_bracketing() {
    for factory in all_factories() {
        let mut manual = director_with(&factory, &[1, 1, 2]);
        set_value(&mut manual, 0, 2);
        manual.trigger_variable_listeners().unwrap();

        let mut facade = director_with(&factory, &[1, 1, 2]);
        facade
            .change_variable_facade(VALUE_VARIABLE, 0, &mut |s: &mut ConflictSolution| {
                s.slots[0].value = 2;
            })
            .unwrap();

        let mut typed = director_with(&factory, &[1, 1, 2]);
        typed
            .change_entity_variable(0, 0, "value", |slot: &mut ValueSlot| slot.value = 2)
            .unwrap();

        let expected = manual.calculate_score().unwrap();
        assert_eq!(expected, score(-1));
        assert_eq!(facade.calculate_score().unwrap(), expected);
        assert_eq!(typed.calculate_score().unwrap(), expected);
        assert_eq!(facade.working_solution().unwrap().values(), vec![2, 1, 2]);
    }
}

#[test]
fn test_change_entity_variable_checks_type() {
    let mut director = director_with(&easy_factory(), &[1, 2]);
    let result = director.change_entity_variable(0, 0, "value", |job: &mut Job| job.order = 1);
    assert!(matches!(result, Err(ScoreDirectorError::UnknownObject { .. })));
    assert!(!director.is_corrupted());
    assert_eq!(director.pending_notification(), None);
}

#[test]
fn test_scopes_send_after_notifications() {
    let mut director = director_with(&incremental_factory(), &[1, 2]);

    let mut scope = director.variable_change_scope(0, 1, "value").unwrap();
    scope.working_solution_mut().unwrap().slots[1].value = 1;
    scope.finish().unwrap();
    assert_eq!(director.calculate_score().unwrap(), score(-1));

    {
        let mut scope = director.entity_removed_scope(0, 0).unwrap();
        scope.working_solution_mut().unwrap().slots.remove(0);
    }
    assert_eq!(director.pending_notification(), None);
    assert_eq!(director.calculate_score().unwrap(), score(0));
}

#[test]
fn test_problem_fact_changes() {
    for factory in all_factories() {
        let kind = factory.backend_kind();
        let mut director = director_with(&factory, &[1, 2, 3]);
        assert_eq!(director.calculate_score().unwrap(), score(0));

        director.before_problem_fact_added(0, 0).unwrap();
        director
            .working_solution_mut()
            .unwrap()
            .forbidden
            .push(Forbidden { value: 2 });
        director.after_problem_fact_added(0, 0).unwrap();
        assert_eq!(director.calculate_score().unwrap(), score(-1), "{:?}", kind);

        director.before_problem_property_changed(0, 0).unwrap();
        director.working_solution_mut().unwrap().forbidden[0].value = 9;
        director.after_problem_property_changed(0, 0).unwrap();
        assert_eq!(director.calculate_score().unwrap(), score(0), "{:?}", kind);

        // A slot change must see the changed fact.
        set_value(&mut director, 0, 9);
        assert_eq!(director.calculate_score().unwrap(), score(-1), "{:?}", kind);

        director.before_problem_fact_removed(0, 0).unwrap();
        director.working_solution_mut().unwrap().forbidden.remove(0);
        director.after_problem_fact_removed(0, 0).unwrap();
        assert_eq!(director.calculate_score().unwrap(), score(0), "{:?}", kind);
    }
}

#[test]
fn test_backends_agree_on_fact_changes() {
    let mut scores = Vec::new();
    for factory in all_factories() {
        let kind = factory.backend_kind();
        let mut director = director_with(&factory, &[1, 1, 2]);
        let mut trace = vec![director.calculate_score().unwrap()];

        director.before_problem_fact_added(0, 0).unwrap();
        director
            .working_solution_mut()
            .unwrap()
            .forbidden
            .push(Forbidden { value: 1 });
        director.after_problem_fact_added(0, 0).unwrap();
        trace.push(director.calculate_score().unwrap());

        director.before_problem_fact_added(0, 1).unwrap();
        director
            .working_solution_mut()
            .unwrap()
            .forbidden
            .push(Forbidden { value: 5 });
        director.after_problem_fact_added(0, 1).unwrap();
        trace.push(director.calculate_score().unwrap());

        director.before_problem_property_changed(0, 0).unwrap();
        director.working_solution_mut().unwrap().forbidden[0].value = 2;
        director.after_problem_property_changed(0, 0).unwrap();
        trace.push(director.calculate_score().unwrap());

        set_value(&mut director, 0, 5);
        trace.push(director.calculate_score().unwrap());

        director.before_problem_fact_removed(0, 0).unwrap();
        director.working_solution_mut().unwrap().forbidden.remove(0);
        director.after_problem_fact_removed(0, 0).unwrap();
        trace.push(director.calculate_score().unwrap());

        // The remaining fact shifted to index 0.
        director.before_problem_property_changed(0, 0).unwrap();
        director.working_solution_mut().unwrap().forbidden[0].value = 9;
        director.after_problem_property_changed(0, 0).unwrap();
        trace.push(director.calculate_score().unwrap());

        assert_eq!(
            trace.last().copied(),
            Some(calculate_conflicts(director.working_solution().unwrap())),
            "{:?}",
            kind
        );
        scores.push((kind, trace));
    }

    let expected = vec![score(-1), score(-3), score(-3), score(-2), score(-2), score(-1), score(0)];
    for (kind, trace) in scores {
        assert_eq!(trace, expected, "{:?}", kind);
    }
}

#[test]
fn test_look_up_by_planning_id() {
    let mut director = director_with(&easy_factory(), &[5, 6, 7]);
    let external = ValueSlot::new(1, 99);

    let working = director.look_up_working_object(Some(&external)).unwrap();
    assert_eq!(working, Some(&ValueSlot::new(1, 6)));

    let none: Option<&ValueSlot> = None;
    assert_eq!(director.look_up_working_object(none).unwrap(), None);

    if let Some(slot) = director.look_up_working_object_mut(Some(&external)).unwrap() {
        slot.value = 8;
    }
    assert_eq!(director.working_solution().unwrap().values(), vec![5, 8, 7]);
}

#[test]
fn test_look_up_errors() {
    let director = director_with(&easy_factory(), &[5, 6]);

    let missing = director.look_up_working_object(Some(&ValueSlot::new(42, 5)));
    assert!(matches!(
        missing,
        Err(ScoreDirectorError::LookUp(LookUpError::NotFound { .. }))
    ));

    let unsupported = director.look_up_working_object(Some(&Forbidden { value: 5 }));
    assert!(matches!(
        unsupported,
        Err(ScoreDirectorError::LookUp(LookUpError::UnsupportedType { .. }))
    ));

    let mut disabled = easy_factory().build_score_director(false, false).unwrap();
    disabled
        .set_working_solution(ConflictSolution::with_values(&[5]))
        .unwrap();
    let result = disabled.look_up_working_object(Some(&ValueSlot::new(0, 5)));
    assert!(matches!(
        result,
        Err(ScoreDirectorError::LookUp(LookUpError::Disabled))
    ));
}

#[test]
fn test_look_up_by_equality_sees_added_facts() {
    let factory = easy_factory().with_look_up_strategy_type(LookUpStrategyType::Equality);
    let mut director = director_with(&factory, &[1]);
    let external = Forbidden { value: 4 };
    assert!(director.look_up_working_object(Some(&external)).is_err());

    director.before_problem_fact_added(0, 0).unwrap();
    director
        .working_solution_mut()
        .unwrap()
        .forbidden
        .push(Forbidden { value: 4 });
    director.after_problem_fact_added(0, 0).unwrap();

    let working = director.look_up_working_object(Some(&external)).unwrap();
    assert_eq!(working, Some(&Forbidden { value: 4 }));
}

#[test]
fn test_look_up_after_entity_added() {
    let mut director = director_with(&easy_factory(), &[1, 2]);
    director.look_up_working_object(Some(&ValueSlot::new(0, 0))).unwrap();

    director.before_entity_added(0, 0).unwrap();
    director
        .working_solution_mut()
        .unwrap()
        .slots
        .insert(0, ValueSlot::new(10, 3));
    director.after_entity_added(0, 0).unwrap();

    let working = director.look_up_working_object(Some(&ValueSlot::new(10, 0))).unwrap();
    assert_eq!(working, Some(&ValueSlot::new(10, 3)));
    let shifted = director.look_up_working_object(Some(&ValueSlot::new(1, 0))).unwrap();
    assert_eq!(shifted, Some(&ValueSlot::new(1, 2)));
}

#[test]
fn test_rule_engine_explains_score() {
    let mut director = rule_factory().build_score_director(true, true).unwrap();
    assert!(director.is_constraint_match_enabled());
    director
        .set_working_solution(ConflictSolution::with_values(&[1, 1, 2, 2, 2]))
        .unwrap();
    assert_eq!(director.calculate_score().unwrap(), score(-4));

    let totals = director.constraint_match_totals().unwrap();
    assert_eq!(totals.len(), 1);
    assert_eq!(totals[0].constraint_ref.full_name(), "conflict/Equal values");
    assert_eq!(totals[0].match_count(), 4);
    assert_eq!(totals[0].score, score(-4));

    set_value(&mut director, 0, 5);
    director.calculate_score().unwrap();
    let totals = director.constraint_match_totals().unwrap();
    assert_eq!(totals[0].match_count(), 3);
}

#[test]
fn test_explanation_is_gated() {
    let mut disabled = rule_factory().build_score_director(true, false).unwrap();
    disabled
        .set_working_solution(ConflictSolution::with_values(&[1, 1]))
        .unwrap();
    disabled.calculate_score().unwrap();
    assert!(!disabled.is_constraint_match_enabled());
    assert!(matches!(
        disabled.constraint_match_totals(),
        Err(ScoreDirectorError::ConstraintMatchDisabled)
    ));

    // Plain calculators cannot explain their score, whatever the preference.
    for factory in [easy_factory(), incremental_factory()] {
        let mut director = factory.build_score_director(true, true).unwrap();
        director
            .set_working_solution(ConflictSolution::with_values(&[1, 1]))
            .unwrap();
        assert!(!director.is_constraint_match_enabled());
        assert!(matches!(
            director.constraint_match_totals(),
            Err(ScoreDirectorError::ConstraintMatchDisabled)
        ));
    }
}

fn chain_factory() -> ScoreDirectorFactory<ChainSolution> {
    ScoreDirectorFactory::easy(create_chain_descriptor(), calculate_gaps)
        .with_variable_listener(
            ListenerRegistration::new(vec![ORDER_VARIABLE], vec![NEXT_VARIABLE]),
            NextJobListener::default,
        )
        .unwrap()
}

fn chain_director(orders: &[i64]) -> DefaultScoreDirector<ChainSolution> {
    let mut director = chain_factory().build_default().unwrap();
    director
        .set_working_solution(ChainSolution::with_orders(orders))
        .unwrap();
    director
}

#[test]
fn test_listener_updates_shadow_after_removal() {
    let mut director = chain_director(&[10, 20, 30]);
    assert_eq!(director.calculate_score().unwrap(), score(-200));

    director.before_entity_removed(0, 1).unwrap();
    director.working_solution_mut().unwrap().jobs.remove(1);
    director.after_entity_removed(0, 1).unwrap();
    director.trigger_variable_listeners().unwrap();

    let solution = director.working_solution().unwrap();
    assert_eq!(solution.job(1).and_then(|j| j.next), Some(3));
    assert_eq!(solution.job(3).and_then(|j| j.next), None);
    assert_eq!(director.calculate_score().unwrap(), score(-400));
}

#[test]
fn test_listener_runs_before_score_calculation() {
    let mut director = chain_director(&[10, 20, 30]);
    director.before_variable_changed(0, 2, "order").unwrap();
    director.working_solution_mut().unwrap().jobs[2].order = 15;
    director.after_variable_changed(0, 2, "order").unwrap();
    assert!(director.listener_support().has_pending());

    // 10 -> 15 -> 20
    assert_eq!(director.calculate_score().unwrap(), score(-50));
    assert!(!director.listener_support().has_pending());
    assert_eq!(
        director.working_solution().unwrap().next_ids(),
        vec![Some(3), None, Some(2)]
    );
}

#[test]
fn test_listener_sees_added_entity() {
    let mut director = chain_director(&[10, 30]);
    director.before_entity_added(0, 2).unwrap();
    director.working_solution_mut().unwrap().jobs.push(Job::new(3, 20));
    director.after_entity_added(0, 2).unwrap();
    director.trigger_variable_listeners().unwrap();

    assert_eq!(
        director.working_solution().unwrap().next_ids(),
        vec![Some(3), None, Some(2)]
    );
    assert_eq!(director.calculate_score().unwrap(), score(-200));
}

type PositionLog = Arc<Mutex<Vec<(VariableNotification, usize, Option<usize>)>>>;

/// Records each deferred notification with the id of the job it addresses.
struct PositionRecorder {
    log: PositionLog,
    unique: bool,
}

impl PositionRecorder {
    fn record(
        &self,
        kind: VariableNotification,
        ctx: &mut dyn ShadowContext<ChainSolution>,
        entity: EntityPosition,
    ) -> Result<(), ScoreForgeError> {
        let id = ctx.working_solution().jobs.get(entity.entity_index).map(|j| j.id);
        if let Ok(mut log) = self.log.lock() {
            log.push((kind, entity.entity_index, id));
        }
        Ok(())
    }
}

impl VariableListener<ChainSolution> for PositionRecorder {
    fn after_entity_added(
        &mut self,
        ctx: &mut dyn ShadowContext<ChainSolution>,
        entity: EntityPosition,
    ) -> Result<(), ScoreForgeError> {
        self.record(VariableNotification::EntityAdded, ctx, entity)
    }

    fn after_variable_changed(
        &mut self,
        ctx: &mut dyn ShadowContext<ChainSolution>,
        entity: EntityPosition,
    ) -> Result<(), ScoreForgeError> {
        self.record(VariableNotification::VariableChanged, ctx, entity)
    }

    fn after_entity_removed(
        &mut self,
        ctx: &mut dyn ShadowContext<ChainSolution>,
        entity: EntityPosition,
    ) -> Result<(), ScoreForgeError> {
        self.record(VariableNotification::EntityRemoved, ctx, entity)
    }

    fn requires_unique_entity_events(&self) -> bool {
        self.unique
    }
}

fn recording_director(orders: &[i64], unique: bool) -> (DefaultScoreDirector<ChainSolution>, PositionLog) {
    let log = PositionLog::default();
    let shared = Arc::clone(&log);
    let factory = ScoreDirectorFactory::easy(create_chain_descriptor(), calculate_gaps)
        .with_variable_listener(
            ListenerRegistration::new(vec![ORDER_VARIABLE], Vec::new()),
            move || PositionRecorder {
                log: Arc::clone(&shared),
                unique,
            },
        )
        .unwrap();
    let mut director = factory.build_default().unwrap();
    director
        .set_working_solution(ChainSolution::with_orders(orders))
        .unwrap();
    (director, log)
}

fn set_order(director: &mut DefaultScoreDirector<ChainSolution>, index: usize, order: i64) {
    director.before_variable_changed(0, index, "order").unwrap();
    director.working_solution_mut().unwrap().jobs[index].order = order;
    director.after_variable_changed(0, index, "order").unwrap();
}

fn drain(log: &PositionLog) -> Vec<(VariableNotification, usize, Option<usize>)> {
    std::mem::take(&mut *log.lock().unwrap())
}

#[test]
fn test_queued_change_shifts_on_insert_before_it() {
    let (mut director, log) = recording_director(&[10, 20, 30], true);
    set_order(&mut director, 2, 35);
    set_order(&mut director, 2, 40);

    director.before_entity_added(0, 0).unwrap();
    director.working_solution_mut().unwrap().jobs.insert(0, Job::new(4, 5));
    director.after_entity_added(0, 0).unwrap();
    director.trigger_variable_listeners().unwrap();

    // Job 3 moved from index 2 to index 3 and is reported once.
    assert_eq!(
        drain(&log),
        vec![
            (VariableNotification::VariableChanged, 3, Some(3)),
            (VariableNotification::EntityAdded, 0, Some(4)),
        ]
    );
}

#[test]
fn test_queued_change_shifts_on_remove_before_it() {
    let (mut director, log) = recording_director(&[10, 20, 30], true);
    set_order(&mut director, 2, 35);

    director.before_entity_removed(0, 0).unwrap();
    director.working_solution_mut().unwrap().jobs.remove(0);
    director.after_entity_removed(0, 0).unwrap();
    director.trigger_variable_listeners().unwrap();

    assert_eq!(
        drain(&log),
        vec![
            (VariableNotification::VariableChanged, 1, Some(3)),
            (VariableNotification::EntityRemoved, 0, Some(2)),
        ]
    );
}

#[test]
fn test_removal_drops_queued_change_of_removed_entity() {
    let (mut director, log) = recording_director(&[10, 20, 30], true);
    set_order(&mut director, 1, 25);
    set_order(&mut director, 2, 35);

    director.before_entity_removed(0, 1).unwrap();
    director.working_solution_mut().unwrap().jobs.remove(1);
    director.after_entity_removed(0, 1).unwrap();
    director.trigger_variable_listeners().unwrap();

    assert_eq!(
        drain(&log),
        vec![
            (VariableNotification::VariableChanged, 1, Some(3)),
            (VariableNotification::EntityRemoved, 1, Some(3)),
        ]
    );
}

#[test]
fn test_repeated_changes_reach_non_unique_listener_every_time() {
    let (mut director, log) = recording_director(&[10, 20], false);
    set_order(&mut director, 0, 11);
    set_order(&mut director, 0, 12);
    director.calculate_score().unwrap();

    assert_eq!(
        drain(&log),
        vec![
            (VariableNotification::VariableChanged, 0, Some(1)),
            (VariableNotification::VariableChanged, 0, Some(1)),
        ]
    );
    director.trigger_variable_listeners().unwrap();
    assert!(drain(&log).is_empty());
}

#[test]
fn test_listener_registration_is_checked() {
    let cycle = chain_factory().with_variable_listener(
        ListenerRegistration::new(vec![NEXT_VARIABLE], vec![NEXT_VARIABLE]),
        NextJobListener::default,
    );
    assert!(matches!(cycle, Err(ScoreDirectorError::Domain(_))));

    let writes_genuine = ScoreDirectorFactory::easy(create_chain_descriptor(), calculate_gaps)
        .with_variable_listener(
            ListenerRegistration::new(vec![ORDER_VARIABLE], vec![ORDER_VARIABLE]),
            NextJobListener::default,
        );
    assert!(matches!(writes_genuine, Err(ScoreDirectorError::Domain(_))));

    let by_name = ListenerRegistration::by_name(&create_chain_descriptor(), 0, &["order"], &["next"]);
    assert_eq!(
        by_name.unwrap(),
        ListenerRegistration::new(vec![ORDER_VARIABLE], vec![NEXT_VARIABLE])
    );
}

#[test]
fn test_calculate_before_working_solution_fails() {
    let mut director = easy_factory().build_default().unwrap();
    assert!(matches!(
        director.calculate_score(),
        Err(ScoreDirectorError::Protocol(_))
    ));
    assert!(director.working_solution().is_err());
    assert!(!director.is_corrupted());
}

#[test]
fn test_double_before_corrupts() {
    let mut director = director_with(&easy_factory(), &[1, 2]);
    director.before_entity_removed(0, 0).unwrap();
    let error = director.before_entity_removed(0, 1).unwrap_err();
    assert!(error.is_protocol_violation());
    assert!(director.is_corrupted());
    assert!(matches!(
        director.calculate_score(),
        Err(ScoreDirectorError::Protocol(_))
    ));
}

#[test]
fn test_after_without_before_corrupts() {
    let mut director = director_with(&incremental_factory(), &[1, 2]);
    let error = director.after_variable_changed(0, 0, "value").unwrap_err();
    assert!(error.is_protocol_violation());
    assert!(director.is_corrupted());
}

#[test]
fn test_mismatched_after_corrupts() {
    let mut director = director_with(&easy_factory(), &[1, 2]);
    director.before_variable_changed(0, 0, "value").unwrap();
    assert!(director.after_variable_changed(0, 1, "value").is_err());
    assert!(director.is_corrupted());
}

#[test]
fn test_calculate_inside_bracket_corrupts() {
    let mut director = director_with(&rule_factory(), &[1, 2]);
    director.before_variable_changed(0, 0, "value").unwrap();
    assert!(matches!(
        director.calculate_score(),
        Err(ScoreDirectorError::Protocol(_))
    ));
    assert!(director.is_corrupted());
}

#[test]
fn test_invalid_arguments_do_not_corrupt() {
    let mut director = director_with(&easy_factory(), &[1, 2]);
    assert!(matches!(
        director.before_variable_changed(0, 0, "colour"),
        Err(ScoreDirectorError::UnknownVariable { .. })
    ));
    assert!(matches!(
        director.before_entity_removed(0, 7),
        Err(ScoreDirectorError::UnknownObject { .. })
    ));
    assert!(matches!(
        director.before_entity_added(3, 0),
        Err(ScoreDirectorError::UnknownDescriptor { .. })
    ));
    assert!(!director.is_corrupted());
    assert_eq!(director.calculate_score().unwrap(), score(0));
}

#[test]
fn test_dispose_is_idempotent_and_final() {
    for factory in all_factories() {
        let mut director = director_with(&factory, &[1, 1]);
        director.calculate_score().unwrap();
        director.dispose();
        director.dispose();
        assert!(director.is_disposed());
        assert!(director.working_solution().is_err());
        assert!(matches!(
            director.set_working_solution(ConflictSolution::with_values(&[1])),
            Err(ScoreDirectorError::Protocol(_))
        ));
        assert!(matches!(
            director.constraint_match_totals(),
            Err(ScoreDirectorError::Protocol(_))
        ));
    }

    let mut explaining = rule_factory().build_score_director(true, true).unwrap();
    explaining
        .set_working_solution(ConflictSolution::with_values(&[1, 1]))
        .unwrap();
    explaining.calculate_score().unwrap();
    explaining.dispose();
    assert!(matches!(
        explaining.constraint_match_totals(),
        Err(ScoreDirectorError::Protocol(_))
    ));
}

#[test]
fn test_working_solution_can_be_replaced() {
    let mut director = director_with(&incremental_factory(), &[1, 1]);
    assert_eq!(director.calculate_score().unwrap(), score(-1));
    director
        .set_working_solution(ConflictSolution::with_values(&[3, 3, 3]))
        .unwrap();
    assert_eq!(director.calculate_score().unwrap(), score(-3));
    assert_eq!(director.clone_working_solution().unwrap().values(), vec![3, 3, 3]);
}

#[test]
fn test_fast_assert_detects_stale_calculator() {
    let factory = ScoreDirectorFactory::incremental(create_conflict_descriptor(), ConflictCounter::stale)
        .with_assertion_calculator(calculate_conflicts)
        .with_environment_mode(EnvironmentMode::FastAssert);
    let mut director = director_with(&factory, &[1, 1, 2]);
    assert_eq!(director.calculate_score().unwrap(), score(-1));

    set_value(&mut director, 1, 3);
    let error = director.calculate_score().unwrap_err();
    assert!(matches!(
        error,
        ScoreDirectorError::ScoreCorruption { backend: "incremental", .. }
    ));
    assert!(director.is_corrupted());
}

#[test]
fn test_stale_calculator_goes_unnoticed_without_assertions() {
    let factory = ScoreDirectorFactory::incremental(create_conflict_descriptor(), ConflictCounter::stale)
        .with_assertion_calculator(calculate_conflicts);
    let mut director = director_with(&factory, &[1, 1, 2]);
    set_value(&mut director, 1, 3);
    assert_eq!(director.calculate_score().unwrap(), score(-1));
}

#[test]
fn test_assertion_mode_needs_a_calculator() {
    for mode in [EnvironmentMode::FastAssert, EnvironmentMode::FullAssert] {
        let factory = ScoreDirectorFactory::incremental(create_conflict_descriptor(), ConflictCounter::stale)
            .with_environment_mode(mode);
        assert!(matches!(
            factory.build_default(),
            Err(ScoreDirectorError::Domain(ScoreForgeError::Config(_)))
        ));

        let factory = rule_factory().with_environment_mode(mode);
        assert!(matches!(
            factory.build_score_director(true, false),
            Err(ScoreDirectorError::Domain(ScoreForgeError::Config(_)))
        ));
    }

    // An easy factory checks against its own calculator.
    let factory = easy_factory().with_environment_mode(EnvironmentMode::FastAssert);
    let mut director = director_with(&factory, &[1, 1]);
    assert_eq!(director.calculate_score().unwrap(), score(-1));
}

#[test]
fn test_builder_rejects_assertion_mode_without_calculator() {
    let config = ScoreDirectorConfig::new()
        .with_score_director_type(ScoreDirectorType::Incremental)
        .with_environment_mode(EnvironmentMode::FastAssert);
    let result = ScoreDirectorFactoryBuilder::<ConflictSolution>::new(create_conflict_descriptor())
        .with_incremental_calculator(ConflictCounter::stale)
        .build(&config);
    assert!(matches!(result, Err(ScoreDirectorError::Domain(_))));

    // The easy calculator doubles as the assertion calculator.
    let factory = ScoreDirectorFactoryBuilder::<ConflictSolution>::new(create_conflict_descriptor())
        .with_easy_calculator(calculate_conflicts)
        .with_incremental_calculator(ConflictCounter::stale)
        .build(&config)
        .unwrap();
    let mut director = factory.build_default().unwrap();
    director
        .set_working_solution(ConflictSolution::with_values(&[1, 1, 2]))
        .unwrap();
    director
        .change_variable_facade(VALUE_VARIABLE, 1, &mut |s: &mut ConflictSolution| {
            s.slots[1].value = 3;
        })
        .unwrap();
    assert!(matches!(
        director.calculate_score(),
        Err(ScoreDirectorError::ScoreCorruption { .. })
    ));
}

#[test]
fn test_builder_picks_backend_from_config() {
    let builder = || {
        ScoreDirectorFactoryBuilder::new(create_conflict_descriptor())
            .with_easy_calculator(calculate_conflicts)
            .with_incremental_calculator(ConflictCounter::default)
            .with_rule_base(conflict_rule_base())
    };
    for (score_director_type, kind) in [
        (ScoreDirectorType::Easy, BackendKind::Easy),
        (ScoreDirectorType::Incremental, BackendKind::Incremental),
        (ScoreDirectorType::RuleEngine, BackendKind::RuleEngine),
    ] {
        let config = ScoreDirectorConfig::new().with_score_director_type(score_director_type);
        let factory = builder().build(&config).unwrap();
        assert_eq!(factory.backend_kind(), kind);

        let mut director = factory.build_default().unwrap();
        director
            .set_working_solution(ConflictSolution::with_values(&[2, 2, 2]))
            .unwrap();
        assert_eq!(director.calculate_score().unwrap(), score(-3));
    }
}

#[test]
fn test_builder_rejects_missing_backend() {
    let config = ScoreDirectorConfig::new().with_score_director_type(ScoreDirectorType::Incremental);
    let result = ScoreDirectorFactoryBuilder::<ConflictSolution>::new(create_conflict_descriptor())
        .with_easy_calculator(calculate_conflicts)
        .build(&config);
    assert!(matches!(result, Err(ScoreDirectorError::Domain(_))));

    let config = ScoreDirectorConfig::new().with_test_gen(true);
    let result = ScoreDirectorFactoryBuilder::<ConflictSolution>::new(create_conflict_descriptor())
        .with_easy_calculator(calculate_conflicts)
        .build(&config);
    assert!(matches!(result, Err(ScoreDirectorError::Domain(_))));
}

#[test]
fn test_builder_applies_config_flags() {
    let config = ScoreDirectorConfig::new()
        .with_score_director_type(ScoreDirectorType::RuleEngine)
        .with_constraint_match_enabled(true)
        .with_look_up_enabled(false);
    let factory = ScoreDirectorFactoryBuilder::<ConflictSolution>::new(create_conflict_descriptor())
        .with_rule_base(conflict_rule_base())
        .build(&config)
        .unwrap();
    let mut director = factory.build_default().unwrap();
    director
        .set_working_solution(ConflictSolution::with_values(&[1, 1]))
        .unwrap();
    assert!(director.is_constraint_match_enabled());
    assert!(director
        .look_up_erased(&ValueSlot::new(0, 1), "ValueSlot")
        .is_err());
}

#[test]
fn test_test_gen_needs_rule_engine() {
    assert!(TestGenScoreDirectorFactory::new(easy_factory()).is_err());
    assert!(TestGenScoreDirectorFactory::new(incremental_factory()).is_err());
}

fn record_session() -> TestGenScoreDirector<ConflictSolution> {
    let factory = TestGenScoreDirectorFactory::new(rule_factory()).unwrap();
    let mut director = factory.build_score_director(true, false).unwrap();
    director
        .set_working_solution(ConflictSolution::with_values(&[1, 1, 2]))
        .unwrap();
    assert_eq!(director.calculate_score().unwrap(), score(-1));

    director.before_variable_changed(0, 1, "value").unwrap();
    director.working_solution_mut().unwrap().slots[1].value = 2;
    director.after_variable_changed(0, 1, "value").unwrap();
    assert_eq!(director.calculate_score().unwrap(), score(-1));

    director.before_entity_added(0, 3).unwrap();
    director
        .working_solution_mut()
        .unwrap()
        .slots
        .push(ValueSlot::new(3, 2));
    director.after_entity_added(0, 3).unwrap();
    assert_eq!(director.calculate_score().unwrap(), score(-3));

    director.before_entity_removed(0, 0).unwrap();
    director.working_solution_mut().unwrap().slots.remove(0);
    director.after_entity_removed(0, 0).unwrap();
    assert_eq!(director.calculate_score().unwrap(), score(-3));
    director
}

#[test]
fn test_test_gen_records_journal() {
    let director = record_session();
    let journal = director.journal();
    assert_eq!(journal.score_count(), 4);
    assert_eq!(journal.rule_sources().len(), 2);
    assert_eq!(journal.initial_solution().map(|s| s.values()), Some(vec![1, 1, 2]));

    let text = director.render_journal();
    assert!(text.contains("rule \"conflict/Equal values\""));
    assert!(text.contains("Join<ValueSlot, Forbidden>"));
    assert!(text.contains("ValueSlot[0] = ValueSlot { id: 0, value: 1 }"));
    assert!(text.contains("before variable #0 changed (0, 1)"));
    assert!(text.contains("after entity added (0, 3) => ValueSlot { id: 3, value: 2 }"));
    assert!(text.contains("score -3"));
}

#[test]
fn test_test_gen_journal_replays() {
    let director = record_session();
    let factory = TestGenScoreDirectorFactory::new(rule_factory()).unwrap();
    let mut replay = factory.build_replay_director().unwrap();
    let scores = director.journal().replay(&mut replay).unwrap();
    assert_eq!(scores, vec![score(-1), score(-1), score(-3), score(-3)]);
    assert_eq!(replay.working_solution().unwrap().values(), vec![2, 2, 2]);

    // Any backend replays the same calls.
    let mut easy = easy_factory().build_default().unwrap();
    assert_eq!(director.journal().replay(&mut easy).unwrap(), scores);
}

#[test]
fn test_test_gen_from_config() {
    let config = ScoreDirectorConfig::from_toml_str(
        r#"
            score_director_type = "rule_engine"
            test_gen = true
        "#,
    )
    .unwrap();
    let factory = ScoreDirectorFactoryBuilder::<ConflictSolution>::new(create_conflict_descriptor())
        .with_rule_base(conflict_rule_base())
        .build(&config)
        .unwrap();
    let mut director = factory.build_default().unwrap();
    director
        .set_working_solution(ConflictSolution::with_values(&[3, 3]))
        .unwrap();
    assert_eq!(director.calculate_score().unwrap(), score(-1));
}
