//! Error types for the resource cache.

use relgraph_model::{NodeKey, Uri};
use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors that can occur in cache operations.
///
/// The error is `Clone` so a single in-flight fetch can fan the same
/// failure out to every waiter that joined it.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// State was requested for a node that was never registered.
    ///
    /// This is a programming error, not a recoverable condition.
    #[error("node {key} is not tracked")]
    NotTracked {
        /// The untracked node's key.
        key: NodeKey,
    },

    /// A navigation target could not be fetched.
    #[error("resource not found: {uri}")]
    ResourceNotFound {
        /// The URI that was requested.
        uri: Uri,
    },

    /// No item in the collection matched the selector.
    #[error("no item matching {selector}")]
    ItemNotFound {
        /// Description of the selector that failed.
        selector: String,
    },

    /// Named resolution asked for an attribute the caller populated
    /// with plain data. Caller data is never overwritten; this is a
    /// programming error.
    #[error("attribute '{name}' already holds caller data")]
    AttributeOccupied {
        /// The occupied attribute name.
        name: String,
    },

    /// Collaborator fetch or submit failure.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether a re-invocation could succeed.
        retryable: bool,
    },

    /// One or more operations failed during a sync.
    ///
    /// Successfully applied items are not rolled back; partial
    /// application is a defined outcome.
    #[error("sync failed for {} item(s)", .failures.len())]
    SyncAggregate {
        /// The per-item failures.
        failures: Vec<SyncFailure>,
    },
}

/// A single failed operation inside a sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncFailure {
    /// Identity of the item the operation targeted.
    pub uri: Uri,
    /// The operation that failed ("create", "update", or "delete").
    pub operation: &'static str,
    /// The failure message.
    pub message: String,
}

impl CacheError {
    /// Creates a not-found error for a URI.
    pub fn not_found(uri: impl Into<Uri>) -> Self {
        Self::ResourceNotFound { uri: uri.into() }
    }

    /// Creates an item-not-found error from a selector description.
    pub fn item_not_found(selector: impl Into<String>) -> Self {
        Self::ItemNotFound {
            selector: selector.into(),
        }
    }

    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Returns true if re-invoking the failed operation could succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            CacheError::Transport { retryable, .. } => *retryable,
            _ => false,
        }
    }

    /// Returns true if the error is the kind the `defaultRepresentation`
    /// fallback absorbs: the target was absent or unreachable.
    #[must_use]
    pub fn is_fetch_miss(&self) -> bool {
        matches!(
            self,
            CacheError::ResourceNotFound { .. } | CacheError::Transport { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_errors() {
        assert!(CacheError::transport_retryable("connection reset").is_retryable());
        assert!(!CacheError::transport_fatal("bad certificate").is_retryable());
        assert!(!CacheError::not_found("/r/1").is_retryable());
    }

    #[test]
    fn fallback_absorbs_misses_only() {
        assert!(CacheError::not_found("/r/1").is_fetch_miss());
        assert!(CacheError::transport_retryable("timeout").is_fetch_miss());
        assert!(!CacheError::item_not_found("/r/1").is_fetch_miss());
        assert!(!CacheError::AttributeOccupied { name: "name".into() }.is_fetch_miss());
    }

    #[test]
    fn error_display() {
        let err = CacheError::not_found("/todo/9");
        assert_eq!(err.to_string(), "resource not found: /todo/9");

        let err = CacheError::SyncAggregate {
            failures: vec![SyncFailure {
                uri: Uri::from("/r/1"),
                operation: "delete",
                message: "gone".into(),
            }],
        };
        assert!(err.to_string().contains("1 item(s)"));
    }
}
