//! Database error types.

use chat_core::PersistenceError;
use thiserror::Error;

/// Errors that can occur during database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// SQLx error (connection, query, etc.)
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Migration error
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Record not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
}

impl From<DatabaseError> for PersistenceError {
    fn from(err: DatabaseError) -> Self {
        PersistenceError::Backend(err.to_string())
    }
}

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, DatabaseError>;
