//! Variable listener infrastructure for shadow variable updates.
//!
//! Variable listeners are notified when the source variables they watch
//! change, and update the shadow variables derived from them.
//!
//! "Before" callbacks observe the solution immediately. "After" callbacks are
//! deferred until the score director triggers its listeners, and write
//! shadow variables through a [`ShadowContext`] so that every shadow write is
//! itself a bracketed variable change.

mod traits;

#[cfg(test)]
mod tests;

pub use traits::{ShadowContext, VariableListener, VariableNotification};
