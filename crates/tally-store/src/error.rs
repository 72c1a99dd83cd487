//! # Store Error Types
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  sqlx::Error / serde_json::Error / rejected write                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StoreError (this module) ← categorized, carries the path              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError (terminal) ← what the cashier sees                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Path is empty or has a forbidden segment.
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// Nothing stored at a path that must exist.
    #[error("Nothing stored at {path}")]
    NotFound { path: String },

    /// Stored value has the wrong shape (e.g. incrementing a string).
    #[error("Value at {path} is not {expected}")]
    TypeMismatch { path: String, expected: String },

    /// The store refused the write.
    #[error("Permission denied for {path}")]
    PermissionDenied { path: String },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// All pooled connections are busy.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// A stored document could not be converted to or from its type.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Internal store error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn not_found(path: impl Into<String>) -> Self {
        StoreError::NotFound { path: path.into() }
    }

    /// Whether retrying the same call could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::ConnectionFailed(_) | StoreError::PoolExhausted | StoreError::TransactionFailed(_)
        )
    }
}

/// ## Error Mapping
/// ```text
/// sqlx::Error::Database       → QueryFailed (message kept)
/// sqlx::Error::PoolTimedOut   → PoolExhausted
/// sqlx::Error::PoolClosed     → ConnectionFailed
/// Other                       → Internal
/// ```
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => StoreError::QueryFailed(db_err.message().to_string()),
            sqlx::Error::PoolTimedOut => StoreError::PoolExhausted,
            sqlx::Error::PoolClosed => StoreError::ConnectionFailed("Pool is closed".to_string()),
            _ => StoreError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::MigrationFailed(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = StoreError::TypeMismatch {
            path: "counters/invoices/b1".to_string(),
            expected: "an integer".to_string(),
        };
        assert_eq!(err.to_string(), "Value at counters/invoices/b1 is not an integer");
        assert_eq!(StoreError::not_found("settings").to_string(), "Nothing stored at settings");
    }

    #[test]
    fn test_sqlx_mapping() {
        assert!(matches!(StoreError::from(sqlx::Error::PoolTimedOut), StoreError::PoolExhausted));
        assert!(StoreError::from(sqlx::Error::PoolClosed).is_transient());
        assert!(!StoreError::not_found("x").is_transient());
    }

    #[test]
    fn test_serde_mapping() {
        let err = serde_json::from_str::<i64>("\"nope\"").unwrap_err();
        assert!(matches!(StoreError::from(err), StoreError::Serialization(_)));
    }
}
