use std::collections::BTreeMap;
use std::fmt::Debug;

use scoreforge_core::{ConstraintRef, Score};

/// Justification for why a constraint matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintJustification {
    /// Display form of every object involved in the match.
    pub objects: Vec<String>,
    /// Human-readable description of why the constraint matched.
    pub description: String,
}

impl ConstraintJustification {
    /// Creates a justification from object displays, joining them as description.
    pub fn new(objects: Vec<String>) -> Self {
        let description = if objects.is_empty() {
            "No objects".to_string()
        } else {
            objects.join(", ")
        };
        Self {
            objects,
            description,
        }
    }

    /// Creates a justification from the `Debug` form of each object.
    pub fn of<T: Debug>(objects: &[&T]) -> Self {
        Self::new(objects.iter().map(|o| format!("{:?}", o)).collect())
    }

    /// Creates a justification with a custom description.
    pub fn with_description(objects: Vec<String>, description: String) -> Self {
        Self {
            objects,
            description,
        }
    }
}

/// One firing of one constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintMatch<Sc: Score> {
    /// Reference to the constraint that matched.
    pub constraint_ref: ConstraintRef,
    /// Score impact of this match.
    pub score: Sc,
    /// Objects involved in the match.
    pub justification: ConstraintJustification,
}

/// All matches of one constraint and their summed score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintMatchTotal<Sc: Score> {
    pub constraint_ref: ConstraintRef,
    pub score: Sc,
    pub matches: Vec<ConstraintMatch<Sc>>,
}

impl<Sc: Score> ConstraintMatchTotal<Sc> {
    pub fn match_count(&self) -> usize {
        self.matches.len()
    }
}

/// Handle of a recorded match, used to remove it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MatchId(u64);

/// Live set of constraint matches of one working solution.
#[derive(Debug, Clone)]
pub struct ConstraintMatchRecorder<Sc: Score> {
    next_id: u64,
    matches: BTreeMap<MatchId, ConstraintMatch<Sc>>,
}

impl<Sc: Score> Default for ConstraintMatchRecorder<Sc> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Sc: Score> ConstraintMatchRecorder<Sc> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            matches: BTreeMap::new(),
        }
    }

    /// Records a match and returns its handle.
    pub fn add_match(
        &mut self,
        constraint_ref: ConstraintRef,
        justification: ConstraintJustification,
        score: Sc,
    ) -> MatchId {
        let id = MatchId(self.next_id);
        self.next_id += 1;
        self.matches.insert(
            id,
            ConstraintMatch {
                constraint_ref,
                score,
                justification,
            },
        );
        id
    }

    /// Removes a match; returns `None` if it was already removed.
    pub fn remove_match(&mut self, id: MatchId) -> Option<ConstraintMatch<Sc>> {
        self.matches.remove(&id)
    }

    /// Removes every match.
    pub fn clear(&mut self) {
        self.matches.clear();
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Sum of the scores of all live matches.
    pub fn total_score(&self) -> Sc {
        self.matches
            .values()
            .fold(Sc::zero(), |total, m| total + m.score)
    }

    /// Aggregates live matches per constraint, sorted by constraint name.
    ///
    /// Matches within a total keep the order in which they were recorded.
    pub fn totals(&self) -> Vec<ConstraintMatchTotal<Sc>> {
        let mut totals: BTreeMap<String, ConstraintMatchTotal<Sc>> = BTreeMap::new();
        for m in self.matches.values() {
            let total = totals
                .entry(m.constraint_ref.full_name())
                .or_insert_with(|| ConstraintMatchTotal {
                    constraint_ref: m.constraint_ref.clone(),
                    score: Sc::zero(),
                    matches: Vec::new(),
                });
            total.score = total.score + m.score;
            total.matches.push(m.clone());
        }
        totals.into_values().collect()
    }
}
