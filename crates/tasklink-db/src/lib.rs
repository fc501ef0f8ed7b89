//! Tasklink Database Layer
//!
//! `SQLite` storage for scraped marketplace tasks, accessed through `SQLx`
//! with embedded migrations.
//!
//! # Architecture
//!
//! - **Single writer**: one run, one connection; the pool never grows past one
//! - **Migrations**: embedded from `migrations/` and applied on open
//! - **Upsert**: one `INSERT .. ON CONFLICT` statement per task, keyed by task id
//! - **Batches**: per-record failures are counted, never fatal
//!
//! # Example
//!
//! ```ignore
//! use tasklink_db::{persist_batch, Database};
//!
//! let db = Database::open("tasklink.db").await?;
//! let summary = persist_batch(db.pool(), &records).await;
//! db.close().await;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod batch;
pub mod connection;
pub mod error;
pub mod migrations;
pub mod tasks;

pub use batch::{persist_batch, PersistSummary};
pub use connection::TaskPool;
pub use error::{DatabaseError, Result};
pub use tasks::{
    count_tasks, get_task, list_new_tasks, task_exists, upsert_task, PersistedTask, WriteOutcome,
};

use std::path::Path;
use tasklink_core::{DatabaseConfig, RetryPolicy};

/// Migrated task database.
#[derive(Debug)]
pub struct Database {
    pool: TaskPool,
}

impl Database {
    /// Open the database at `path` and apply pending migrations.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let pool = TaskPool::new(path).await?;
        if let Err(e) = migrations::run_migrations(pool.pool()).await {
            pool.close().await;
            return Err(e);
        }
        Ok(Self { pool })
    }

    /// Open the configured database, retrying with exponential backoff.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        Self::connect_with_retry(&config.path, RetryPolicy::from(config)).await
    }

    /// Open the database at `path`, retrying under `policy`.
    pub async fn connect_with_retry(path: impl AsRef<Path>, policy: RetryPolicy) -> Result<Self> {
        let path = path.as_ref();
        let mut attempt = 1;
        loop {
            match Self::open(path).await {
                Ok(db) => return Ok(db),
                Err(e) if policy.has_next(attempt) => {
                    let delay = policy.delay_for(attempt);
                    tracing::warn!(
                        attempt,
                        max_attempts = policy.max_attempts,
                        ?delay,
                        error = %e,
                        "Database connection failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(attempt, error = %e, "Database connection failed");
                    return Err(DatabaseError::Unavailable {
                        attempts: attempt,
                        source: Box::new(e),
                    });
                }
            }
        }
    }

    /// Current schema version.
    pub async fn get_schema_version(&self) -> Result<i64> {
        migrations::get_schema_version(self.pool.pool()).await
    }

    /// The underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Sqlite> {
        self.pool.pool()
    }

    /// Close the connection.
    pub async fn close(self) {
        self.pool.close().await;
    }
}
