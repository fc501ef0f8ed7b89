//! Database error types.

use thiserror::Error;

/// Database-specific errors.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to open or create the database.
    #[error("failed to open database: {0}")]
    Open(String),

    /// Every connection attempt failed.
    #[error("database unavailable after {attempts} attempt(s)")]
    Unavailable {
        /// Attempts made
        attempts: u32,
        /// Last failure
        #[source]
        source: Box<DatabaseError>,
    },

    /// Migration execution failed.
    #[error("migration failed: {0}")]
    Migration(String),

    /// A record could not be converted to its stored form.
    #[error("encode error: {0}")]
    Encode(String),

    /// Failed to decode a stored value.
    #[error("decode error: {0}")]
    Decode(String),

    /// Underlying `SQLx` error.
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Result type alias for database operations.
pub type Result<T> = std::result::Result<T, DatabaseError>;
