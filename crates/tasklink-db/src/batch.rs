//! Best-effort batch persistence.

use crate::tasks::{upsert_task, WriteOutcome};
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};
use tasklink_core::TaskRecord;

/// Counts from one batch write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistSummary {
    /// Records handed in
    pub attempted: usize,
    /// Newly stored
    pub inserted: usize,
    /// Overwritten
    pub updated: usize,
    /// Write failed
    pub failed: usize,
}

impl PersistSummary {
    /// Records written successfully.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.inserted + self.updated
    }

    /// At least one record was attempted and none was written.
    #[must_use]
    pub fn all_failed(&self) -> bool {
        self.attempted > 0 && self.failed == self.attempted
    }

    fn record(&mut self, outcome: WriteOutcome) {
        match outcome {
            WriteOutcome::Inserted => self.inserted += 1,
            WriteOutcome::Updated => self.updated += 1,
        }
    }
}

/// Upsert every record, continuing past individual failures.
pub async fn persist_batch(pool: &Pool<Sqlite>, records: &[TaskRecord]) -> PersistSummary {
    let mut summary = PersistSummary {
        attempted: records.len(),
        ..PersistSummary::default()
    };

    for record in records {
        match upsert_task(pool, record).await {
            Ok(outcome) => {
                tracing::debug!(task_id = %record.task_id, ?outcome, "Task stored");
                summary.record(outcome);
            }
            Err(e) => {
                tracing::warn!(task_id = %record.task_id, error = %e, "Failed to store task");
                summary.failed += 1;
            }
        }
    }

    tracing::info!(
        attempted = summary.attempted,
        inserted = summary.inserted,
        updated = summary.updated,
        failed = summary.failed,
        "Persisted tasks"
    );
    summary
}
