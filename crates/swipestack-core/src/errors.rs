//! Unified error types for the card stack.
//!
//! Every error here is `Clone` so it can be stored as the controller's
//! `last_error`, broadcast to observers, and shared between joined load-more
//! callers.
//!
//! Taxonomy:
//! - [`SourceError`]: failures reported by the data source or feed
//! - [`PersistenceError`]: failures reported by a persistence bridge
//! - [`ConfigError`]: invalid configuration values
//! - [`StackError`]: what the controller surfaces as `last_error`

use serde::{Deserialize, Serialize};

/// Error reported by an external data source or event feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum SourceError {
    /// Network or transport failure
    #[error("Network error: {message}")]
    Network {
        /// Error message describing the network issue
        message: String,
    },

    /// The upstream rejected the request
    #[error("Rejected: {message}")]
    Rejected {
        /// Error message describing the rejection
        message: String,
    },

    /// Payload could not be decoded into cards
    #[error("Decode error: {message}")]
    Decode {
        /// Error message describing the decode failure
        message: String,
    },

    /// Anything else
    #[error("Source error: {message}")]
    Other {
        /// Error message
        message: String,
    },
}

impl SourceError {
    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a rejection error
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create an uncategorized error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}

/// Error reported by a tombstone persistence bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum PersistenceError {
    /// Storage read/write failed
    #[error("Storage error: {message}")]
    Storage {
        /// Error message describing the storage failure
        message: String,
    },

    /// Serialization/deserialization failed
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message describing the serialization failure
        message: String,
    },
}

impl PersistenceError {
    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }
}

/// Invalid configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// `max_visible` must be at least one
    #[error("max_visible must be greater than zero")]
    ZeroMaxVisible,

    /// `swipe_threshold` must lie strictly between 0 and 1
    #[error("swipe_threshold must be in (0, 1), got {value}")]
    SwipeThresholdOutOfRange {
        /// Rejected value
        value: f64,
    },

    /// Configuration text could not be parsed
    #[error("Failed to parse configuration: {message}")]
    Parse {
        /// Parser message
        message: String,
    },
}

/// Error surfaced by the stack controller as `last_error`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StackError {
    /// Initial batch could not be loaded
    #[error("Initial load failed: {0}")]
    Load(SourceError),

    /// The event feed could not be subscribed to
    #[error("Feed subscription failed: {0}")]
    Feed(SourceError),

    /// Reporting a swipe upstream failed; the swipe was rolled back
    #[error("Swipe report failed: {0}")]
    SwipeReport(SourceError),

    /// Reporting an undo upstream failed; the undo stays applied
    #[error("Undo report failed: {0}")]
    UndoReport(SourceError),

    /// Tombstone persistence failed
    #[error("Persistence error: {0}")]
    Persistence(PersistenceError),
}

impl StackError {
    /// Underlying source error, if this came from the data source or feed.
    #[must_use]
    pub fn source_error(&self) -> Option<&SourceError> {
        match self {
            Self::Load(e) | Self::Feed(e) | Self::SwipeReport(e) | Self::UndoReport(e) => Some(e),
            Self::Persistence(_) => None,
        }
    }

    /// Whether the failure came from reporting a user action upstream.
    #[must_use]
    pub fn is_report_failure(&self) -> bool {
        matches!(self, Self::SwipeReport(_) | Self::UndoReport(_))
    }
}

impl From<PersistenceError> for StackError {
    fn from(error: PersistenceError) -> Self {
        Self::Persistence(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_source_message() {
        let err = StackError::SwipeReport(SourceError::network("timeout"));
        assert_eq!(
            err.to_string(),
            "Swipe report failed: Network error: timeout"
        );
        assert!(err.is_report_failure());
        assert_eq!(err.source_error(), Some(&SourceError::network("timeout")));
    }

    #[test]
    fn persistence_errors_convert() {
        let err: StackError = PersistenceError::storage("disk full").into();
        assert!(!err.is_report_failure());
        assert!(err.source_error().is_none());
    }
}
