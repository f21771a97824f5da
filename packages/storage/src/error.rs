// ABOUTME: Storage error type and its mapping onto the review error taxonomy
// ABOUTME: Row-not-found and version mismatches stay distinct from driver failures

use docket_core::ReviewError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Version conflict on {id}: expected {expected}, found {actual}")]
    Conflict {
        id: String,
        expected: i64,
        actual: i64,
    },
    #[error("Validation error: {0}")]
    Validation(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl StorageError {
    /// Map SQLite constraint violations to validation failures, keep everything else
    pub(crate) fn from_write(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if let Some(code) = db_err.code() {
                // SQLITE_CONSTRAINT_UNIQUE, SQLITE_CONSTRAINT_PRIMARYKEY, SQLITE_CONSTRAINT_CHECK
                if code == "2067" || code == "1555" || code == "275" {
                    return StorageError::Validation(db_err.message().to_string());
                }
            }
        }
        StorageError::Sqlx(err)
    }
}

impl From<StorageError> for ReviewError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(what) => ReviewError::NotFound(what),
            StorageError::Conflict {
                id,
                expected,
                actual,
            } => ReviewError::Conflict(format!(
                "{} was modified concurrently (expected version {}, found {})",
                id, expected, actual
            )),
            StorageError::Validation(msg) => ReviewError::ValidationFailed(msg),
            StorageError::Sqlx(sqlx::Error::RowNotFound) => {
                ReviewError::NotFound("row not found".to_string())
            }
            other => ReviewError::Unreachable(other.to_string()),
        }
    }
}
