use std::fmt;

/// Two-level score; any hard difference outweighs every soft difference.
///
/// Field order drives the derived ordering: `hard` first, `soft` as the
/// tie-breaker.
///
/// ```
/// use scoreforge_core::HardSoftScore;
///
/// assert!(HardSoftScore::of(0, -200) > HardSoftScore::of(-1, -100));
/// assert_eq!(HardSoftScore::of_hard(-1).to_string(), "-1hard/0soft");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HardSoftScore {
    hard: i64,
    soft: i64,
}

impl HardSoftScore {
    pub const ZERO: HardSoftScore = HardSoftScore { hard: 0, soft: 0 };
    pub const ONE_HARD: HardSoftScore = HardSoftScore { hard: 1, soft: 0 };
    pub const ONE_SOFT: HardSoftScore = HardSoftScore { hard: 0, soft: 1 };

    pub const fn of(hard: i64, soft: i64) -> Self {
        HardSoftScore { hard, soft }
    }

    pub const fn of_hard(hard: i64) -> Self {
        Self::of(hard, 0)
    }

    pub const fn of_soft(soft: i64) -> Self {
        Self::of(0, soft)
    }

    pub const fn hard(&self) -> i64 {
        self.hard
    }

    pub const fn soft(&self) -> i64 {
        self.soft
    }
}

score_levels!(HardSoftScore { hard, soft });

impl fmt::Debug for HardSoftScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HardSoftScore({}, {})", self.hard, self.soft)
    }
}

impl fmt::Display for HardSoftScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}hard/{}soft", self.hard, self.soft)
    }
}
