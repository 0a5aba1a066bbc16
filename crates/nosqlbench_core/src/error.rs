//! Error types for nosqlbench core.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in store and contract operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// An operation was invoked before `init`.
    #[error("database not initialized: call init() first")]
    NotInitialized,

    /// `start_transaction` was called while the session already has one.
    #[error("transaction already active in this session")]
    TransactionAlreadyActive,

    /// A transaction boundary was used with no active transaction.
    ///
    /// Only raised when the store runs with strict boundaries.
    #[error("no active transaction in this session")]
    TransactionNotActive,

    /// The optimistic version check failed at commit.
    #[error("version conflict on {key}: expected version {expected}, found {actual}")]
    VersionConflict {
        /// The offending key, in `kind:id` form.
        key: String,
        /// Version captured by the transaction.
        expected: u64,
        /// Version currently committed (0 if the entity is absent).
        actual: u64,
    },

    /// The predicate operator, value and field type combination is unsupported.
    #[error("invalid query: {message}")]
    InvalidQuery {
        /// Description of the problem.
        message: String,
    },

    /// A key string or kind could not be parsed or encoded.
    #[error("invalid key: {message}")]
    InvalidKey {
        /// Description of the problem.
        message: String,
    },
}

impl CoreError {
    /// Creates a version conflict error.
    pub fn version_conflict(key: impl Into<String>, expected: u64, actual: u64) -> Self {
        Self::VersionConflict {
            key: key.into(),
            expected,
            actual,
        }
    }

    /// Creates an invalid query error.
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
        }
    }

    /// Creates an invalid key error.
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey {
            message: message.into(),
        }
    }

    /// Returns true if retrying the whole transaction may succeed.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_is_retryable() {
        let err = CoreError::version_conflict("Test:1", 1, 2);
        assert!(err.is_conflict());
        assert!(!CoreError::NotInitialized.is_conflict());
        assert!(!CoreError::invalid_query("x").is_conflict());
    }

    #[test]
    fn display_names_the_key() {
        let err = CoreError::version_conflict("Test:7", 3, 4);
        assert_eq!(
            err.to_string(),
            "version conflict on Test:7: expected version 3, found 4"
        );
    }
}
