//! Error types for the core library

use thiserror::Error;
use tokio_rusqlite::rusqlite::{self, ErrorCode};

use crate::task::{TaskId, ValidationError};

/// Every outcome a repository caller has to handle besides success.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Task not found: {0}")]
    NotFound(TaskId),

    /// The store detected a concurrent modification. Re-fetch and reapply.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    Database(tokio_rusqlite::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl Error {
    /// Whether the caller may retry the same operation after re-reading state.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Store failures the caller cannot fix by changing its input.
    pub fn is_store_failure(&self) -> bool {
        matches!(
            self,
            Self::Storage(_) | Self::Database(_) | Self::Migration(_)
        )
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        // Busy and locked mean another writer holds the row or the file.
        match err.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => {
                Self::Conflict(err.to_string())
            }
            _ => Self::Database(tokio_rusqlite::Error::Error(err)),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => Self::from(e),
            other => Self::Database(other),
        }
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => {
                Self::Database(tokio_rusqlite::Error::ConnectionClosed)
            }
            tokio_rusqlite::Error::Close(c) => Self::Database(tokio_rusqlite::Error::Close(c)),
            _ => Self::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_conflict_is_retryable() {
        assert!(Error::Conflict("row changed".to_string()).is_retryable());
        assert!(!Error::NotFound(1).is_retryable());
        assert!(!Error::Storage("disk full".to_string()).is_retryable());
        assert!(!Error::Cancelled.is_retryable());
    }

    #[test]
    fn test_busy_database_maps_to_conflict() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            Some("database is locked".to_string()),
        );

        assert!(matches!(Error::from(err), Error::Conflict(_)));
    }

    #[test]
    fn test_constraint_violation_is_store_failure() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CONSTRAINT),
            None,
        );

        let mapped = Error::from(err);
        assert!(mapped.is_store_failure());
        assert!(!mapped.is_retryable());
    }

    #[test]
    fn test_not_found_display() {
        assert_eq!(Error::NotFound(42).to_string(), "Task not found: 42");
    }
}
