use std::fmt::{Debug, Display};
use std::ops::{Add, Neg, Sub};

/// Value a score director calculates for a working solution.
///
/// Higher is better. Incremental backends keep a running total, so
/// `total + delta - delta` must give back `total` exactly; integer levels
/// guarantee that.
pub trait Score:
    Copy
    + Debug
    + Display
    + Default
    + Send
    + Sync
    + Eq
    + Ord
    + Add<Output = Self>
    + Sub<Output = Self>
    + Neg<Output = Self>
    + 'static
{
    /// Identity of score accumulation.
    fn zero() -> Self;
}
