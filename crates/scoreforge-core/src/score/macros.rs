/// Implements `Score` and level-wise `Add`, `Sub` and `Neg` for a score
/// struct whose levels are `i64` fields.
///
/// ```ignore
/// score_levels!(HardSoftScore { hard, soft });
/// ```
macro_rules! score_levels {
    ($score:ident { $($level:ident),+ }) => {
        impl $crate::score::Score for $score {
            #[inline]
            fn zero() -> Self {
                $score { $($level: 0),+ }
            }
        }

        impl std::ops::Add for $score {
            type Output = $score;

            #[inline]
            fn add(self, rhs: $score) -> $score {
                $score { $($level: self.$level + rhs.$level),+ }
            }
        }

        impl std::ops::Sub for $score {
            type Output = $score;

            #[inline]
            fn sub(self, rhs: $score) -> $score {
                $score { $($level: self.$level - rhs.$level),+ }
            }
        }

        impl std::ops::Neg for $score {
            type Output = $score;

            #[inline]
            fn neg(self) -> $score {
                $score { $($level: -self.$level),+ }
            }
        }
    };
}
