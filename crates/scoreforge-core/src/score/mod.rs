//! Score values.
//!
//! A score director treats a score as an opaque value it can order, add and
//! subtract. Backends accumulate signed match weights into it; assertion modes
//! compare two of them for equality.

#[macro_use]
mod macros;

mod hard_soft;
mod simple;
mod traits;

#[cfg(test)]
mod tests;

pub use hard_soft::HardSoftScore;
pub use simple::SimpleScore;
pub use traits::Score;
