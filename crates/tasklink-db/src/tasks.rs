//! Task storage with deduplicating upsert.
//!
//! Rows are keyed by the marketplace task id. The latest scrape always wins
//! for mutable fields; `is_new` stays true only until the second write of
//! the same id.

use crate::error::{DatabaseError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;
use tasklink_core::{TaskId, TaskRecord};

/// Result of one upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriteOutcome {
    /// First time this task id was stored
    Inserted,
    /// An existing row was overwritten
    Updated,
}

/// Stored counterpart of a [`TaskRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedTask {
    /// Latest scraped values
    pub record: TaskRecord,
    /// True only while the row has been written exactly once
    pub is_new: bool,
    /// First insert
    pub created_at: DateTime<Utc>,
    /// Last write
    pub updated_at: DateTime<Utc>,
}

/// Insert or overwrite a task in one statement.
pub async fn upsert_task(pool: &Pool<Sqlite>, record: &TaskRecord) -> Result<WriteOutcome> {
    let task_id = encode_id(record.task_id)?;
    let now = Utc::now().to_rfc3339();

    let is_new: bool = sqlx::query_scalar(
        "INSERT INTO tasks (task_id, domain, customer, customer_url, external_links,
                            title, time_passed, price, is_new, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?)
         ON CONFLICT(task_id) DO UPDATE SET
             domain = excluded.domain,
             customer = excluded.customer,
             customer_url = excluded.customer_url,
             external_links = excluded.external_links,
             title = excluded.title,
             time_passed = excluded.time_passed,
             price = excluded.price,
             is_new = 0,
             updated_at = excluded.updated_at
         RETURNING is_new",
    )
    .bind(task_id)
    .bind(&record.domain)
    .bind(&record.customer)
    .bind(&record.customer_url)
    .bind(i64::from(record.external_links))
    .bind(&record.title)
    .bind(&record.time_passed)
    .bind(record.price.to_string())
    .bind(&now)
    .bind(&now)
    .fetch_one(pool)
    .await?;

    Ok(if is_new {
        WriteOutcome::Inserted
    } else {
        WriteOutcome::Updated
    })
}

/// Whether a row exists for `task_id`.
pub async fn task_exists(pool: &Pool<Sqlite>, task_id: TaskId) -> Result<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM tasks WHERE task_id = ?)")
        .bind(encode_id(task_id)?)
        .fetch_one(pool)
        .await?;
    Ok(exists)
}

/// Fetch one stored task.
pub async fn get_task(pool: &Pool<Sqlite>, task_id: TaskId) -> Result<Option<PersistedTask>> {
    let row = sqlx::query("SELECT * FROM tasks WHERE task_id = ?")
        .bind(encode_id(task_id)?)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(decode_row).transpose()
}

/// Tasks stored for the first time and not seen again since, oldest first.
pub async fn list_new_tasks(pool: &Pool<Sqlite>) -> Result<Vec<PersistedTask>> {
    let rows = sqlx::query("SELECT * FROM tasks WHERE is_new = 1 ORDER BY created_at, task_id")
        .fetch_all(pool)
        .await?;

    rows.iter().map(decode_row).collect()
}

/// Number of stored tasks.
pub async fn count_tasks(pool: &Pool<Sqlite>) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tasks")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

fn encode_id(task_id: TaskId) -> Result<i64> {
    task_id
        .to_i64()
        .map_err(|e| DatabaseError::Encode(e.to_string()))
}

fn decode_timestamp(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>> {
    let raw: String = row.try_get(column)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::Decode(format!("{column} '{raw}': {e}")))
}

fn decode_row(row: &SqliteRow) -> Result<PersistedTask> {
    let task_id = TaskId::from_i64(row.try_get("task_id")?)
        .map_err(|e| DatabaseError::Decode(e.to_string()))?;

    let price_str: String = row.try_get("price")?;
    let price = Decimal::from_str(&price_str)
        .map_err(|e| DatabaseError::Decode(format!("price '{price_str}' for task {task_id}: {e}")))?;

    let external_links: i64 = row.try_get("external_links")?;
    let external_links = u32::try_from(external_links).map_err(|_| {
        DatabaseError::Decode(format!("external_links {external_links} for task {task_id}"))
    })?;

    Ok(PersistedTask {
        record: TaskRecord {
            task_id,
            domain: row.try_get("domain")?,
            customer: row.try_get("customer")?,
            customer_url: row.try_get("customer_url")?,
            external_links,
            title: row.try_get("title")?,
            time_passed: row.try_get("time_passed")?,
            price,
        },
        is_new: row.try_get("is_new")?,
        created_at: decode_timestamp(row, "created_at")?,
        updated_at: decode_timestamp(row, "updated_at")?,
    })
}
