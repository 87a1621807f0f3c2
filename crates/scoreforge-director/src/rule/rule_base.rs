//! Constraint rules and the built-in rule base.

use std::any::{type_name, Any, TypeId};
use std::fmt::Debug;
use std::sync::Arc;

use scoreforge_core::{ConstraintRef, ImpactType, Score};

use super::session::ConstraintRuleSession;
use super::{RuleBase, RuleSession};

type UniMatcher<Sc> = Arc<dyn Fn(&dyn Any) -> Option<Sc> + Send + Sync>;
type BiMatcher<Sc> = Arc<dyn Fn(&dyn Any, &dyn Any) -> Option<Sc> + Send + Sync>;

fn describe<E: Debug + 'static>(object: &dyn Any) -> String {
    object
        .downcast_ref::<E>()
        .map(|e| format!("{:?}", e))
        .unwrap_or_default()
}

fn short_type_name<E>() -> &'static str {
    let full = type_name::<E>();
    full.rsplit("::").next().unwrap_or(full)
}

/// Rule over every single object of one type.
///
/// The weigher returns the weight of a match, or `None` if the object does
/// not match. The impact type gives the sign.
#[derive(Clone)]
pub struct UniRule<Sc: Score> {
    pub(super) constraint_ref: ConstraintRef,
    pub(super) impact: ImpactType,
    pub(super) type_id: TypeId,
    pub(super) type_name: &'static str,
    matcher: UniMatcher<Sc>,
    pub(super) describe: fn(&dyn Any) -> String,
}

impl<Sc: Score> UniRule<Sc> {
    pub fn new<E, F>(constraint_ref: ConstraintRef, impact: ImpactType, weigher: F) -> Self
    where
        E: Debug + 'static,
        F: Fn(&E) -> Option<Sc> + Send + Sync + 'static,
    {
        Self {
            constraint_ref,
            impact,
            type_id: TypeId::of::<E>(),
            type_name: short_type_name::<E>(),
            matcher: Arc::new(move |object| object.downcast_ref::<E>().and_then(&weigher)),
            describe: describe::<E>,
        }
    }

    /// Returns the signed score of a match, or `None`.
    pub(super) fn evaluate(&self, object: &dyn Any) -> Option<Sc> {
        (self.matcher)(object).map(|weight| self.impact.apply(weight))
    }
}

/// Rule over every unordered pair of distinct objects of one type.
///
/// Each pair is evaluated once, so the weigher should be symmetric.
#[derive(Clone)]
pub struct BiRule<Sc: Score> {
    pub(super) constraint_ref: ConstraintRef,
    pub(super) impact: ImpactType,
    pub(super) type_id: TypeId,
    pub(super) type_name: &'static str,
    matcher: BiMatcher<Sc>,
    pub(super) describe: fn(&dyn Any) -> String,
}

impl<Sc: Score> BiRule<Sc> {
    pub fn new<E, F>(constraint_ref: ConstraintRef, impact: ImpactType, weigher: F) -> Self
    where
        E: Debug + 'static,
        F: Fn(&E, &E) -> Option<Sc> + Send + Sync + 'static,
    {
        Self {
            constraint_ref,
            impact,
            type_id: TypeId::of::<E>(),
            type_name: short_type_name::<E>(),
            matcher: Arc::new(move |a, b| match (a.downcast_ref::<E>(), b.downcast_ref::<E>()) {
                (Some(a), Some(b)) => weigher(a, b),
                _ => None,
            }),
            describe: describe::<E>,
        }
    }

    pub(super) fn evaluate(&self, a: &dyn Any, b: &dyn Any) -> Option<Sc> {
        (self.matcher)(a, b).map(|weight| self.impact.apply(weight))
    }
}

/// Rule over every pair of a left object of type `A` and a right object of
/// type `B`, typically an entity joined with a problem fact.
///
/// The pair is ordered: the weigher always receives the left object first.
#[derive(Clone)]
pub struct JoinRule<Sc: Score> {
    pub(super) constraint_ref: ConstraintRef,
    pub(super) impact: ImpactType,
    pub(super) left_type_id: TypeId,
    pub(super) right_type_id: TypeId,
    left_type_name: &'static str,
    right_type_name: &'static str,
    matcher: BiMatcher<Sc>,
    describe_left: fn(&dyn Any) -> String,
    describe_right: fn(&dyn Any) -> String,
}

impl<Sc: Score> JoinRule<Sc> {
    pub fn new<A, B, F>(constraint_ref: ConstraintRef, impact: ImpactType, weigher: F) -> Self
    where
        A: Debug + 'static,
        B: Debug + 'static,
        F: Fn(&A, &B) -> Option<Sc> + Send + Sync + 'static,
    {
        Self {
            constraint_ref,
            impact,
            left_type_id: TypeId::of::<A>(),
            right_type_id: TypeId::of::<B>(),
            left_type_name: short_type_name::<A>(),
            right_type_name: short_type_name::<B>(),
            matcher: Arc::new(move |a, b| match (a.downcast_ref::<A>(), b.downcast_ref::<B>()) {
                (Some(a), Some(b)) => weigher(a, b),
                _ => None,
            }),
            describe_left: describe::<A>,
            describe_right: describe::<B>,
        }
    }

    pub(super) fn evaluate(&self, left: &dyn Any, right: &dyn Any) -> Option<Sc> {
        (self.matcher)(left, right).map(|weight| self.impact.apply(weight))
    }
}

#[derive(Clone)]
pub(super) enum Rule<Sc: Score> {
    Uni(UniRule<Sc>),
    Bi(BiRule<Sc>),
    Join(JoinRule<Sc>),
}

impl<Sc: Score> Rule<Sc> {
    pub(super) fn constraint_ref(&self) -> &ConstraintRef {
        match self {
            Rule::Uni(rule) => &rule.constraint_ref,
            Rule::Bi(rule) => &rule.constraint_ref,
            Rule::Join(rule) => &rule.constraint_ref,
        }
    }

    /// Returns the formatter of the object at `slot` of a match.
    pub(super) fn describe(&self, slot: usize) -> fn(&dyn Any) -> String {
        match self {
            Rule::Uni(rule) => rule.describe,
            Rule::Bi(rule) => rule.describe,
            Rule::Join(rule) if slot == 0 => rule.describe_left,
            Rule::Join(rule) => rule.describe_right,
        }
    }

    fn source(&self) -> String {
        let (constraint_ref, pattern, impact) = match self {
            Rule::Uni(rule) => (
                &rule.constraint_ref,
                format!("Uni<{}>", rule.type_name),
                rule.impact,
            ),
            Rule::Bi(rule) => (
                &rule.constraint_ref,
                format!("Bi<{}>", rule.type_name),
                rule.impact,
            ),
            Rule::Join(rule) => (
                &rule.constraint_ref,
                format!("Join<{}, {}>", rule.left_type_name, rule.right_type_name),
                rule.impact,
            ),
        };
        let action = match impact {
            ImpactType::Penalty => "penalize",
            ImpactType::Reward => "reward",
        };
        format!(
            "rule \"{}\"\n    when\n        {}\n    then\n        {}\nend",
            constraint_ref.full_name(),
            pattern,
            action
        )
    }
}

/// Rule base built from [`UniRule`]s, [`BiRule`]s and [`JoinRule`]s.
///
/// # Example
///
/// ```
/// use scoreforge_core::{ConstraintRef, ImpactType, SimpleScore};
/// use scoreforge_director::rule::{BiRule, ConstraintRuleBase, RuleBase, UniRule};
///
/// let rule_base = ConstraintRuleBase::new()
///     .with_uni_rule(UniRule::new::<i64, _>(
///         ConstraintRef::new("demo", "Negative"),
///         ImpactType::Penalty,
///         |v| (*v < 0).then_some(SimpleScore::ONE),
///     ))
///     .with_bi_rule(BiRule::new::<i64, _>(
///         ConstraintRef::new("demo", "Equal"),
///         ImpactType::Penalty,
///         |a, b| (a == b).then_some(SimpleScore::ONE),
///     ));
///
/// let sources = rule_base.rule_sources();
/// assert_eq!(sources.len(), 2);
/// assert!(sources[1].starts_with("rule \"demo/Equal\""));
/// ```
pub struct ConstraintRuleBase<Sc: Score> {
    rules: Arc<Vec<Rule<Sc>>>,
}

impl<Sc: Score> Default for ConstraintRuleBase<Sc> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Sc: Score> ConstraintRuleBase<Sc> {
    pub fn new() -> Self {
        Self {
            rules: Arc::new(Vec::new()),
        }
    }

    pub fn with_uni_rule(mut self, rule: UniRule<Sc>) -> Self {
        Arc::make_mut(&mut self.rules).push(Rule::Uni(rule));
        self
    }

    pub fn with_bi_rule(mut self, rule: BiRule<Sc>) -> Self {
        Arc::make_mut(&mut self.rules).push(Rule::Bi(rule));
        self
    }

    pub fn with_join_rule(mut self, rule: JoinRule<Sc>) -> Self {
        Arc::make_mut(&mut self.rules).push(Rule::Join(rule));
        self
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

impl<Sc: Score> RuleBase<Sc> for ConstraintRuleBase<Sc> {
    fn new_session(&self, constraint_match_enabled: bool) -> Box<dyn RuleSession<Sc>> {
        Box::new(ConstraintRuleSession::new(
            Arc::clone(&self.rules),
            constraint_match_enabled,
        ))
    }

    fn rule_sources(&self) -> Vec<String> {
        self.rules.iter().map(Rule::source).collect()
    }
}
