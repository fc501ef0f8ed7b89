//! `SQLite` connection management.
//!
//! Tasklink has exactly one writer per run, so the pool holds a single
//! connection.

use crate::error::{DatabaseError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;

const IN_MEMORY: &str = ":memory:";

/// Single-connection `SQLite` pool.
#[derive(Debug, Clone)]
pub struct TaskPool {
    pool: Pool<Sqlite>,
}

impl TaskPool {
    /// Open (creating if missing) the database at `path`.
    ///
    /// `:memory:` opens a private in-memory database.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let path_str = path.to_str().ok_or_else(|| {
            DatabaseError::Open("invalid database path: not valid UTF-8".to_string())
        })?;

        let connect_options = if path_str == IN_MEMORY {
            SqliteConnectOptions::from_str(IN_MEMORY)
                .map_err(|e| DatabaseError::Open(format!("invalid connection string: {e}")))?
        } else {
            SqliteConnectOptions::new().filename(path)
        }
        .create_if_missing(true)
        .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(connect_options)
            .await
            .map_err(|e| DatabaseError::Open(format!("{path_str}: {e}")))?;

        tracing::info!(path = %path_str, "Database pool created");
        Ok(Self { pool })
    }

    /// The underlying `SQLx` pool.
    #[must_use]
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Close the pool, waiting for the connection to shut down.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Database pool closed");
    }
}
