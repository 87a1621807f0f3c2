//! Working memory and agenda of the built-in rule engine.

use std::any::{Any, TypeId};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use scoreforge_core::domain::{BoxedObject, CollectionKind};
use scoreforge_core::Score;
use smallvec::{smallvec, SmallVec};

use super::rule_base::Rule;
use super::RuleSession;
use crate::constraint_match::{
    ConstraintJustification, ConstraintMatchRecorder, ConstraintMatchTotal, MatchId,
};

/// Handle of one object in the working memory.
///
/// Handles are never reused within a session, so their order is the
/// insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FactHandle(u64);

struct WorkingObject {
    type_id: TypeId,
    object: BoxedObject,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MatchKey {
    rule: usize,
    handles: SmallVec<[FactHandle; 2]>,
}

struct RuleMatch<Sc: Score> {
    score: Sc,
    recorded: Option<MatchId>,
}

/// Session of a [`ConstraintRuleBase`](super::ConstraintRuleBase).
///
/// Matches are kept between firings. Inserting or updating an object
/// retracts every match it takes part in and schedules it; firing evaluates
/// only the scheduled objects against the rest of the working memory.
pub struct ConstraintRuleSession<Sc: Score> {
    rules: Arc<Vec<Rule<Sc>>>,
    objects: HashMap<FactHandle, WorkingObject>,
    positions: HashMap<(CollectionKind, usize), Vec<FactHandle>>,
    by_type: HashMap<TypeId, BTreeSet<FactHandle>>,
    matches: HashMap<MatchKey, RuleMatch<Sc>>,
    involvement: HashMap<FactHandle, HashSet<MatchKey>>,
    agenda: BTreeSet<FactHandle>,
    total: Sc,
    recorder: Option<ConstraintMatchRecorder<Sc>>,
    next_handle: u64,
}

impl<Sc: Score> ConstraintRuleSession<Sc> {
    pub(super) fn new(rules: Arc<Vec<Rule<Sc>>>, constraint_match_enabled: bool) -> Self {
        Self {
            rules,
            objects: HashMap::new(),
            positions: HashMap::new(),
            by_type: HashMap::new(),
            matches: HashMap::new(),
            involvement: HashMap::new(),
            agenda: BTreeSet::new(),
            total: Sc::zero(),
            recorder: constraint_match_enabled.then(ConstraintMatchRecorder::new),
            next_handle: 0,
        }
    }

    /// Returns the number of objects in the working memory.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Returns the number of live matches.
    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    fn handle_at(&self, kind: CollectionKind, descriptor_index: usize, index: usize) -> Option<FactHandle> {
        self.positions
            .get(&(kind, descriptor_index))
            .and_then(|slots| slots.get(index))
            .copied()
    }

    fn retract_matches(&mut self, handle: FactHandle) {
        let Some(keys) = self.involvement.remove(&handle) else {
            return;
        };
        for key in keys {
            if let Some(removed) = self.matches.remove(&key) {
                self.total = self.total - removed.score;
                if let (Some(recorder), Some(id)) = (self.recorder.as_mut(), removed.recorded) {
                    recorder.remove_match(id);
                }
            }
            for other in key.handles.iter().filter(|&&h| h != handle) {
                if let Some(set) = self.involvement.get_mut(other) {
                    set.remove(&key);
                }
            }
        }
    }

    fn add_match(&mut self, key: MatchKey, score: Sc) {
        let recorded = match self.recorder.as_mut() {
            Some(recorder) => {
                let rule = &self.rules[key.rule];
                let objects = key
                    .handles
                    .iter()
                    .enumerate()
                    .filter_map(|(slot, h)| self.objects.get(h).map(|w| (slot, w)))
                    .map(|(slot, w)| rule.describe(slot)(w.object.as_ref()))
                    .collect();
                Some(recorder.add_match(
                    rule.constraint_ref().clone(),
                    ConstraintJustification::new(objects),
                    score,
                ))
            }
            None => None,
        };
        self.total = self.total + score;
        for handle in &key.handles {
            self.involvement
                .entry(*handle)
                .or_default()
                .insert(key.clone());
        }
        self.matches.insert(key, RuleMatch { score, recorded });
    }

    fn evaluate(&mut self, handle: FactHandle) {
        let Some(type_id) = self.objects.get(&handle).map(|w| w.type_id) else {
            return;
        };
        let rules = Arc::clone(&self.rules);
        for (rule_index, rule) in rules.iter().enumerate() {
            match rule {
                Rule::Uni(uni) if uni.type_id == type_id => {
                    let key = MatchKey {
                        rule: rule_index,
                        handles: smallvec![handle],
                    };
                    if self.matches.contains_key(&key) {
                        continue;
                    }
                    let score = self
                        .objects
                        .get(&handle)
                        .and_then(|w| uni.evaluate(w.object.as_ref()));
                    if let Some(score) = score {
                        self.add_match(key, score);
                    }
                }
                Rule::Bi(bi) if bi.type_id == type_id => {
                    let partners: Vec<FactHandle> = self.partners(type_id, handle).collect();
                    for partner in partners {
                        let (first, second) = if partner < handle {
                            (partner, handle)
                        } else {
                            (handle, partner)
                        };
                        let key = MatchKey {
                            rule: rule_index,
                            handles: smallvec![first, second],
                        };
                        if self.matches.contains_key(&key) {
                            continue;
                        }
                        let score = match (self.objects.get(&first), self.objects.get(&second)) {
                            (Some(a), Some(b)) => bi.evaluate(a.object.as_ref(), b.object.as_ref()),
                            _ => None,
                        };
                        if let Some(score) = score {
                            self.add_match(key, score);
                        }
                    }
                }
                Rule::Join(join) if join.left_type_id == type_id || join.right_type_id == type_id => {
                    let mut pairs = Vec::new();
                    if join.left_type_id == type_id {
                        pairs.extend(self.partners(join.right_type_id, handle).map(|right| (handle, right)));
                    }
                    if join.right_type_id == type_id {
                        pairs.extend(self.partners(join.left_type_id, handle).map(|left| (left, handle)));
                    }
                    for (left, right) in pairs {
                        let key = MatchKey {
                            rule: rule_index,
                            handles: smallvec![left, right],
                        };
                        if self.matches.contains_key(&key) {
                            continue;
                        }
                        let score = match (self.objects.get(&left), self.objects.get(&right)) {
                            (Some(a), Some(b)) => join.evaluate(a.object.as_ref(), b.object.as_ref()),
                            _ => None,
                        };
                        if let Some(score) = score {
                            self.add_match(key, score);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    /// Handles of `type_id` in the working memory, other than `handle`.
    fn partners(&self, type_id: TypeId, handle: FactHandle) -> impl Iterator<Item = FactHandle> + '_ {
        self.by_type
            .get(&type_id)
            .into_iter()
            .flat_map(|set| set.iter().copied())
            .filter(move |&h| h != handle)
    }
}

impl<Sc: Score> RuleSession<Sc> for ConstraintRuleSession<Sc> {
    fn insert(&mut self, kind: CollectionKind, descriptor_index: usize, index: usize, object: BoxedObject) {
        let handle = FactHandle(self.next_handle);
        self.next_handle += 1;
        let type_id = (*object).type_id();
        self.objects.insert(handle, WorkingObject { type_id, object });
        self.by_type.entry(type_id).or_default().insert(handle);
        let slots = self.positions.entry((kind, descriptor_index)).or_default();
        let index = index.min(slots.len());
        slots.insert(index, handle);
        self.agenda.insert(handle);
    }

    fn update(&mut self, kind: CollectionKind, descriptor_index: usize, index: usize, object: BoxedObject) {
        let Some(handle) = self.handle_at(kind, descriptor_index, index) else {
            return;
        };
        self.retract_matches(handle);
        if let Some(working) = self.objects.get_mut(&handle) {
            working.object = object;
        }
        self.agenda.insert(handle);
    }

    fn retract(&mut self, kind: CollectionKind, descriptor_index: usize, index: usize) {
        let Some(slots) = self.positions.get_mut(&(kind, descriptor_index)) else {
            return;
        };
        if index >= slots.len() {
            return;
        }
        let handle = slots.remove(index);
        self.retract_matches(handle);
        self.agenda.remove(&handle);
        if let Some(working) = self.objects.remove(&handle) {
            if let Some(set) = self.by_type.get_mut(&working.type_id) {
                set.remove(&handle);
            }
        }
    }

    fn fire_all_rules(&mut self) -> Sc {
        let agenda = std::mem::take(&mut self.agenda);
        for handle in agenda {
            self.evaluate(handle);
        }
        self.total
    }

    fn constraint_match_totals(&self) -> Vec<ConstraintMatchTotal<Sc>> {
        self.recorder
            .as_ref()
            .map(ConstraintMatchRecorder::totals)
            .unwrap_or_default()
    }

    fn dispose(&mut self) {
        self.objects.clear();
        self.positions.clear();
        self.by_type.clear();
        self.matches.clear();
        self.involvement.clear();
        self.agenda.clear();
        self.total = Sc::zero();
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.clear();
        }
    }
}
