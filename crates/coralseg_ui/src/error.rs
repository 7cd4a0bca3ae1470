//! Error types for the history and shortcut primitives.

use thiserror::Error;

/// Errors raised by [`HistoryStore`](crate::HistoryStore).
///
/// Empty stacks are never an error; `undo`/`redo` report them as `None`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    /// The snapshot handed to the store is malformed.
    #[error("Invalid record: {reason}")]
    InvalidRecord {
        /// What was wrong with the snapshot
        reason: String,
    },

    /// History capacity must be at least one snapshot.
    #[error("History capacity must be positive, got {capacity}")]
    InvalidCapacity {
        /// The rejected capacity
        capacity: usize,
    },
}

impl HistoryError {
    /// Shorthand for [`HistoryError::InvalidRecord`].
    pub fn invalid_record(reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            reason: reason.into(),
        }
    }
}

/// Errors raised while parsing shortcut definitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShortcutError {
    /// A key combination string could not be parsed.
    #[error("Invalid key combination '{combo}': {reason}")]
    InvalidKeyCombo {
        /// The offending input
        combo: String,
        /// Why it was rejected
        reason: String,
    },

    /// An interaction state tag did not name a known state.
    #[error("Unknown interaction state '{0}'")]
    UnknownState(String),
}
