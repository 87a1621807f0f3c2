//! Score directors.
//!
//! A director owns the working solution, brackets every change with
//! before/after notifications, runs shadow variable listeners and asks its
//! backend for the score.
//!
//! - [`DefaultScoreDirector`] - One backend plus listener and look-up support
//! - [`TestGenScoreDirector`] - Rule-engine director recording a replayable journal
//! - [`ScoreDirectorFactory`] - Builds directors of one configuration

mod default;
mod ext;
mod factory;
mod listener_support;
mod scope;
mod state;
mod test_gen;
mod traits;

#[cfg(test)]
mod tests;

pub use default::DefaultScoreDirector;
pub use ext::ScoreDirectorExt;
pub use factory::{
    IncrementalSupplier, InnerScoreDirectorFactory, ListenerSupplier, ScoreDirectorFactory,
    ScoreDirectorFactoryBuilder,
};
pub use listener_support::{check_registration, ListenerRegistration, VariableListenerSupport};
pub use scope::NotificationScope;
pub use state::Notification;
pub use test_gen::{JournalEntry, TestGenJournal, TestGenScoreDirector, TestGenScoreDirectorFactory};
pub use traits::{InnerScoreDirector, ScoreDirector};
