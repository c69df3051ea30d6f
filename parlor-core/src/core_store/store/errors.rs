/*
    errors.rs - Error types for the store subsystem
*/

use thiserror::Error;

/// Errors that can occur in the store subsystem
#[derive(Debug, Error)]
pub enum StoreError {
    /// Connection pool exhausted or unavailable
    #[error("Connection pool error: {0}")]
    Pool(String),

    /// Underlying SQLite error
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Unique-name constraint violated
    #[error("Duplicate name: {0}")]
    DuplicateName(String),

    /// Entity not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

impl From<r2d2::Error> for StoreError {
    fn from(err: r2d2::Error) -> Self {
        StoreError::Pool(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}
