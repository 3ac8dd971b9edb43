//! Error taxonomy shared by every tracker.

use thiserror::Error;

/// Result type used across the tracker layers.
pub type TrackerResult<T> = Result<T, TrackerError>;

/// Failure of a user-triggered tracker action.
///
/// Each variant is terminal for the action that raised it only; none of them
/// leaves the collection partially mutated.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TrackerError {
    /// Required user input was missing or malformed. Nothing was changed.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The natural key (e.g. tracking number) is already tracked.
    #[error("already tracked: {0}")]
    Duplicate(String),

    /// A lookup, barcode or detail request found nothing.
    #[error("not found: {0}")]
    NotFound(String),

    /// A remote call failed (network, HTTP status or decoding).
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The change could not be written to storage.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl TrackerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn duplicate(key: impl Into<String>) -> Self {
        Self::Duplicate(key.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// True when the in-memory state was kept but durability is not guaranteed.
    pub fn is_persistence_warning(&self) -> bool {
        matches!(self, Self::Persistence(PersistenceError::Write { .. }))
    }
}

/// A failed outbound request, tagged with the operation that issued it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{operation} failed{}: {message}", status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
pub struct FetchError {
    pub operation: String,
    pub status: Option<u16>,
    pub message: String,
}

impl FetchError {
    /// Transport-level failure (DNS, connect, timeout).
    pub fn network(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            status: None,
            message: message.into(),
        }
    }

    /// Non-success HTTP status.
    pub fn status(operation: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            status: Some(status),
            message: message.into(),
        }
    }

    /// Response body could not be decoded.
    pub fn parse(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            status: None,
            message: format!("invalid response: {}", message.into()),
        }
    }
}

/// Storage failure for a collection.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// The collection could not be encoded; memory was left unchanged.
    #[error("failed to serialize collection `{key}`: {message}")]
    Serialize { key: String, message: String },

    /// Encoding succeeded but the write failed; memory holds the new state.
    #[error("changes to `{key}` are kept for this session but were not saved: {message}")]
    Write { key: String, message: String },
}
