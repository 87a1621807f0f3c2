//! Constraint match recording for score explanation.
//!
//! Only active when a director is built with constraint match enabled.
//! Backends add and remove individual matches as the working solution
//! changes; totals are aggregated per constraint on request.

mod recorder;

#[cfg(test)]
mod tests;

pub use recorder::{
    ConstraintJustification, ConstraintMatch, ConstraintMatchRecorder, ConstraintMatchTotal,
    MatchId,
};
