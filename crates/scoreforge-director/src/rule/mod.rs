//! Rule engine behind the rule-engine backend.
//!
//! A [`RuleBase`] is compiled once per factory and opens one [`RuleSession`]
//! per working solution. The session keeps a working memory that mirrors the
//! entities and facts of the solution; the backend inserts, updates and
//! retracts objects from the director hooks and fires the agenda lazily when
//! a score is requested.

mod rule_base;
mod session;


pub use rule_base::{BiRule, ConstraintRuleBase, JoinRule, UniRule};
pub use session::{ConstraintRuleSession, FactHandle};

use scoreforge_core::domain::{BoxedObject, CollectionKind};
use scoreforge_core::Score;

use crate::constraint_match::ConstraintMatchTotal;

/// Compiled set of rules.
pub trait RuleBase<Sc: Score>: Send + Sync {
    /// Opens an empty session.
    fn new_session(&self, constraint_match_enabled: bool) -> Box<dyn RuleSession<Sc>>;

    /// Returns the source text of every rule, in rule order.
    fn rule_sources(&self) -> Vec<String>;
}

/// Working memory of one rule evaluation.
///
/// Objects are addressed like in the working solution: by collection kind,
/// descriptor index and position. Inserting at a position shifts later
/// objects of the same collection up by one; retracting shifts them down.
pub trait RuleSession<Sc: Score>: Send {
    fn insert(&mut self, kind: CollectionKind, descriptor_index: usize, index: usize, object: BoxedObject);

    /// Replaces the object at a position with its new state.
    fn update(&mut self, kind: CollectionKind, descriptor_index: usize, index: usize, object: BoxedObject);

    fn retract(&mut self, kind: CollectionKind, descriptor_index: usize, index: usize);

    /// Evaluates every pending activation and returns the session score.
    fn fire_all_rules(&mut self) -> Sc;

    /// Returns the matches of the last firing; empty unless enabled.
    fn constraint_match_totals(&self) -> Vec<ConstraintMatchTotal<Sc>>;

    /// Releases the working memory.
    fn dispose(&mut self);
}
