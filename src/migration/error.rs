//! Migration-specific error types
//!
//! Malformed generator input is not an error here: it becomes a commented file plus
//! [`Diagnostic`](super::Diagnostic)s. Everything below aborts the current operation.

use crate::connection::ConnectionError;
use crate::executor::DbError;
use crate::transaction::TransactionError;
use std::path::PathBuf;
use thiserror::Error;

/// Migration-specific errors
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Filesystem failure while creating, listing or reading migration files
    #[error("{action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not open the database connection
    #[error("Error connecting to database: {0}")]
    Connection(#[from] ConnectionError),

    /// Bookkeeping query failed (schema creation, loading applied state)
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// A migration file failed while executing
    #[error("Error executing migration {file}: {source}")]
    ExecutionFailed {
        file: String,
        #[source]
        source: DbError,
    },

    /// A migration ran but could not be recorded in `gomig_migrations`
    #[error("Error recording migration {file}: {source}")]
    RecordFailed {
        file: String,
        #[source]
        source: DbError,
    },

    /// BEGIN/COMMIT around a migration failed
    #[error("Transaction error for migration {file}: {source}")]
    Transaction {
        file: String,
        #[source]
        source: TransactionError,
    },

    /// Stored bookkeeping row could not be interpreted
    #[error("Invalid migration record: {0}")]
    InvalidRecord(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl MigrationError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MigrationError::Io {
            action,
            path: path.into(),
            source,
        }
    }

    /// Name of the migration file the error is about, if any.
    pub fn file(&self) -> Option<&str> {
        match self {
            MigrationError::ExecutionFailed { file, .. }
            | MigrationError::RecordFailed { file, .. }
            | MigrationError::Transaction { file, .. } => Some(file),
            _ => None,
        }
    }
}
