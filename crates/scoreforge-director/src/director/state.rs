//! Notification bookkeeping and lifecycle of a score director.

use std::fmt;

use scoreforge_core::domain::{CollectionKind, EntityPosition, VariableId};
use tracing::warn;

use crate::error::ScoreDirectorError;

/// One before/after notification pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Notification {
    EntityAdded(EntityPosition),
    VariableChanged {
        variable: VariableId,
        entity_index: usize,
    },
    EntityRemoved(EntityPosition),
    ProblemFactAdded {
        descriptor_index: usize,
        fact_index: usize,
    },
    ProblemFactRemoved {
        descriptor_index: usize,
        fact_index: usize,
    },
    ProblemPropertyChanged {
        descriptor_index: usize,
        fact_index: usize,
    },
}

impl Notification {
    /// Returns the collection and position of the object the notification is about.
    pub fn target(&self) -> (CollectionKind, usize, usize) {
        match *self {
            Notification::EntityAdded(p) | Notification::EntityRemoved(p) => {
                (CollectionKind::Entity, p.descriptor_index, p.entity_index)
            }
            Notification::VariableChanged {
                variable,
                entity_index,
            } => (CollectionKind::Entity, variable.descriptor_index, entity_index),
            Notification::ProblemFactAdded {
                descriptor_index,
                fact_index,
            }
            | Notification::ProblemFactRemoved {
                descriptor_index,
                fact_index,
            }
            | Notification::ProblemPropertyChanged {
                descriptor_index,
                fact_index,
            } => (CollectionKind::ProblemFact, descriptor_index, fact_index),
        }
    }

    /// Returns true for removals, after which the object no longer exists.
    pub fn is_removal(&self) -> bool {
        matches!(
            self,
            Notification::EntityRemoved(_) | Notification::ProblemFactRemoved { .. }
        )
    }

    /// Returns true for notifications about a problem fact.
    pub fn is_problem_fact(&self) -> bool {
        matches!(
            self,
            Notification::ProblemFactAdded { .. }
                | Notification::ProblemFactRemoved { .. }
                | Notification::ProblemPropertyChanged { .. }
        )
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::EntityAdded(p) => {
                write!(f, "entity added ({}, {})", p.descriptor_index, p.entity_index)
            }
            Notification::VariableChanged {
                variable,
                entity_index,
            } => write!(
                f,
                "variable #{} changed ({}, {})",
                variable.variable_index, variable.descriptor_index, entity_index
            ),
            Notification::EntityRemoved(p) => {
                write!(f, "entity removed ({}, {})", p.descriptor_index, p.entity_index)
            }
            Notification::ProblemFactAdded {
                descriptor_index,
                fact_index,
            } => write!(f, "problem fact added ({}, {})", descriptor_index, fact_index),
            Notification::ProblemFactRemoved {
                descriptor_index,
                fact_index,
            } => write!(f, "problem fact removed ({}, {})", descriptor_index, fact_index),
            Notification::ProblemPropertyChanged {
                descriptor_index,
                fact_index,
            } => write!(
                f,
                "problem property changed ({}, {})",
                descriptor_index, fact_index
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Lifecycle {
    Unconfigured,
    Ready,
    Disposed,
    Corrupted(String),
}

/// Enforces the before/after pairing and the director lifecycle.
///
/// Violations are reported as [`ScoreDirectorError::Protocol`] and, once the
/// director held a working solution, mark it corrupted for good.
#[derive(Debug)]
pub(crate) struct ProtocolState {
    lifecycle: Lifecycle,
    pending: Option<Notification>,
}

impl ProtocolState {
    pub(crate) fn new() -> Self {
        Self {
            lifecycle: Lifecycle::Unconfigured,
            pending: None,
        }
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.lifecycle == Lifecycle::Disposed
    }

    pub(crate) fn is_corrupted(&self) -> bool {
        matches!(self.lifecycle, Lifecycle::Corrupted(_))
    }

    pub(crate) fn pending(&self) -> Option<Notification> {
        self.pending
    }

    /// Fails unless a working solution is set and the director is healthy.
    pub(crate) fn ensure_ready(&self) -> Result<(), ScoreDirectorError> {
        match &self.lifecycle {
            Lifecycle::Ready => Ok(()),
            Lifecycle::Unconfigured => Err(ScoreDirectorError::Protocol(
                "no working solution has been set".to_string(),
            )),
            Lifecycle::Disposed => Err(ScoreDirectorError::Protocol(
                "score director is disposed".to_string(),
            )),
            Lifecycle::Corrupted(reason) => Err(ScoreDirectorError::Protocol(format!(
                "score director is corrupted: {}",
                reason
            ))),
        }
    }

    /// Fails if the director can never hold a working solution again.
    pub(crate) fn ensure_configurable(&mut self) -> Result<(), ScoreDirectorError> {
        match self.lifecycle {
            Lifecycle::Unconfigured => Ok(()),
            Lifecycle::Ready => self.require_idle("set_working_solution"),
            _ => self.ensure_ready(),
        }
    }

    pub(crate) fn mark_ready(&mut self) {
        self.lifecycle = Lifecycle::Ready;
        self.pending = None;
    }

    pub(crate) fn mark_disposed(&mut self) {
        self.lifecycle = Lifecycle::Disposed;
        self.pending = None;
    }

    /// Marks the director corrupted and returns the matching error.
    pub(crate) fn corrupt(&mut self, reason: String) -> ScoreDirectorError {
        warn!(reason = %reason, "Score director corrupted");
        self.lifecycle = Lifecycle::Corrupted(reason.clone());
        ScoreDirectorError::Protocol(reason)
    }

    /// Starts a notification pair.
    pub(crate) fn begin(&mut self, notification: Notification) -> Result<(), ScoreDirectorError> {
        self.ensure_ready()?;
        if let Some(pending) = self.pending {
            return Err(self.corrupt(format!(
                "before {} while before {} awaits its after call",
                notification, pending
            )));
        }
        self.pending = Some(notification);
        Ok(())
    }

    /// Completes the pending notification pair.
    pub(crate) fn end(&mut self, notification: Notification) -> Result<(), ScoreDirectorError> {
        self.ensure_ready()?;
        match self.pending.take() {
            Some(pending) if pending == notification => Ok(()),
            Some(pending) => Err(self.corrupt(format!(
                "after {} does not match before {}",
                notification, pending
            ))),
            None => Err(self.corrupt(format!("after {} without a before call", notification))),
        }
    }

    /// Fails if a notification pair is open.
    pub(crate) fn require_idle(&mut self, operation: &str) -> Result<(), ScoreDirectorError> {
        match self.pending {
            Some(pending) => Err(self.corrupt(format!(
                "{} called while before {} awaits its after call",
                operation, pending
            ))),
            None => Ok(()),
        }
    }
}
