// ABOUTME: Error taxonomy for sync and ping operations
// ABOUTME: Distinguishes configuration, connection, query, and timeout failures

/// Main error type for sync and ping operations.
///
/// Job-level errors (unknown job name, unreachable source) are returned as the
/// call's error. Per-target errors are carried inside that target's outcome
/// and never become the call's top-level error. Nothing in the core retries.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Invalid or unsupported configuration. Never retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Network or authentication failure establishing a database handle.
    /// Fatal for that one endpoint's current operation only.
    #[error("failed to connect to {label}: {message}")]
    Connection { label: String, message: String },

    /// A SELECT/INSERT/UPDATE/DELETE failed (missing table or column,
    /// unusable connection). Fatal for that one endpoint's current
    /// reconciliation or ping only.
    #[error("query failed on {label}: {message}")]
    Query { label: String, message: String },

    /// A ping exceeded its caller-supplied budget.
    #[error("ping operation timed out")]
    Timeout,
}

impl SyncError {
    pub(crate) fn connection(label: impl Into<String>, err: impl std::fmt::Display) -> Self {
        SyncError::Connection {
            label: label.into(),
            message: err.to_string(),
        }
    }

    pub(crate) fn query(label: impl Into<String>, err: impl std::fmt::Display) -> Self {
        SyncError::Query {
            label: label.into(),
            message: err.to_string(),
        }
    }
}

/// Result type alias for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
