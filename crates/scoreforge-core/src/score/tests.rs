use super::*;

#[test]
fn test_running_total_returns_to_start() {
    let total = SimpleScore::of(-4);
    let delta = SimpleScore::of(3);
    assert_eq!(total + delta - delta, total);
    assert_eq!(SimpleScore::zero() + total, total);
    assert_eq!(-delta, SimpleScore::of(-3));
}

#[test]
fn test_simple_ordering_and_display() {
    assert!(SimpleScore::of(-1) > SimpleScore::of(-2));
    assert_eq!(SimpleScore::of(-2).max(SimpleScore::ZERO), SimpleScore::ZERO);
    assert_eq!(SimpleScore::from(7).value(), 7);
    assert_eq!(format!("{:?}", SimpleScore::of(-7)), "SimpleScore(-7)");
}

#[test]
fn test_hard_level_dominates() {
    assert!(HardSoftScore::of(0, -1000) > HardSoftScore::of(-1, 0));
    assert!(HardSoftScore::of(-1, -1) > HardSoftScore::of(-1, -2));
    assert_eq!(HardSoftScore::zero(), HardSoftScore::ZERO);
}

#[test]
fn test_hard_soft_levels_add_separately() {
    let penalty = HardSoftScore::of(-2, -10);
    let change = HardSoftScore::ONE_HARD + HardSoftScore::of_soft(4);
    assert_eq!(penalty + change, HardSoftScore::of(-1, -6));
    assert_eq!(penalty - change, HardSoftScore::of(-3, -14));
    assert_eq!(-change, HardSoftScore::of(-1, -4));
    assert_eq!((penalty.hard(), penalty.soft()), (-2, -10));
    assert_eq!(HardSoftScore::of(-1, 5).to_string(), "-1hard/5soft");
}
