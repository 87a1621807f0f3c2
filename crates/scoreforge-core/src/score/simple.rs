use std::fmt;

/// Single-level integer score.
///
/// ```
/// use scoreforge_core::SimpleScore;
///
/// assert!(SimpleScore::of(-3) > SimpleScore::of(-5));
/// assert_eq!(SimpleScore::of(-3).to_string(), "-3");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimpleScore {
    value: i64,
}

impl SimpleScore {
    pub const ZERO: SimpleScore = SimpleScore { value: 0 };

    /// Weight of a single match.
    pub const ONE: SimpleScore = SimpleScore { value: 1 };

    #[inline]
    pub const fn of(value: i64) -> Self {
        SimpleScore { value }
    }

    #[inline]
    pub const fn value(&self) -> i64 {
        self.value
    }
}

score_levels!(SimpleScore { value });

impl fmt::Debug for SimpleScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SimpleScore({})", self.value)
    }
}

impl fmt::Display for SimpleScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl From<i64> for SimpleScore {
    fn from(value: i64) -> Self {
        SimpleScore::of(value)
    }
}
