use scoreforge_core::{ConstraintRef, HardSoftScore};

use super::*;

fn overlap() -> ConstraintRef {
    ConstraintRef::new("roster", "overlap")
}

fn preference() -> ConstraintRef {
    ConstraintRef::new("roster", "preference")
}

#[test]
fn test_totals_are_grouped_and_sorted() {
    let mut recorder = ConstraintMatchRecorder::new();
    recorder.add_match(
        preference(),
        ConstraintJustification::new(vec!["Ann".to_string()]),
        HardSoftScore::of_soft(-2),
    );
    recorder.add_match(
        overlap(),
        ConstraintJustification::new(vec!["Ann".to_string(), "Bob".to_string()]),
        HardSoftScore::of_hard(-1),
    );
    recorder.add_match(
        overlap(),
        ConstraintJustification::new(vec!["Bob".to_string(), "Cid".to_string()]),
        HardSoftScore::of_hard(-1),
    );

    let totals = recorder.totals();
    assert_eq!(totals.len(), 2);
    assert_eq!(totals[0].constraint_ref, overlap());
    assert_eq!(totals[0].score, HardSoftScore::of_hard(-2));
    assert_eq!(totals[0].match_count(), 2);
    assert_eq!(totals[0].matches[0].justification.description, "Ann, Bob");
    assert_eq!(totals[1].score, HardSoftScore::of_soft(-2));
    assert_eq!(recorder.total_score(), HardSoftScore::of(-2, -2));
}

#[test]
fn test_remove_match_updates_totals() {
    let mut recorder = ConstraintMatchRecorder::new();
    let first = recorder.add_match(
        overlap(),
        ConstraintJustification::of(&[&1, &2]),
        HardSoftScore::of_hard(-1),
    );
    recorder.add_match(
        overlap(),
        ConstraintJustification::of(&[&2, &3]),
        HardSoftScore::of_hard(-1),
    );

    assert!(recorder.remove_match(first).is_some());
    assert!(recorder.remove_match(first).is_none());
    assert_eq!(recorder.len(), 1);
    assert_eq!(recorder.totals()[0].matches[0].justification.objects, vec!["2", "3"]);

    recorder.clear();
    assert!(recorder.is_empty());
    assert!(recorder.totals().is_empty());
    assert_eq!(recorder.total_score(), HardSoftScore::ZERO);
}
