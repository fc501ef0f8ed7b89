//! Shared types used across the Tasklink application.
//!
//! This module defines the task record that flows from the scraper into
//! storage, plus small helpers for handling login credentials.

use crate::error::TasklinkError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroizing;

/// Marketplace task identifier.
///
/// Stable across runs and unique per marketplace task; the deduplication key
/// for storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(u64);

impl TaskId {
    /// Wrap a raw identifier.
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the inner value.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }

    /// Convert to the signed representation used by `SQLite`.
    pub fn to_i64(self) -> Result<i64, TasklinkError> {
        i64::try_from(self.0).map_err(|_| {
            TasklinkError::Validation(format!("task id {} does not fit in a signed column", self.0))
        })
    }

    /// Convert back from the signed storage representation.
    pub fn from_i64(id: i64) -> Result<Self, TasklinkError> {
        u64::try_from(id)
            .map(Self)
            .map_err(|_| TasklinkError::Validation(format!("negative task id in storage: {id}")))
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One marketplace listing row.
///
/// Built fresh on every scrape and consumed once by the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Identity key
    pub task_id: TaskId,
    /// Target site domain
    pub domain: String,
    /// Customer display name
    pub customer: String,
    /// Customer profile link, empty if absent
    pub customer_url: String,
    /// Number of external links requested
    pub external_links: u32,
    /// Task title
    pub title: String,
    /// Elapsed-time label as shown on the page
    pub time_passed: String,
    /// Reward, exact decimal
    pub price: Decimal,
}

/// Login credentials for the marketplace.
///
/// The password is zeroized on drop and never printed by `Debug`.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: Zeroizing<String>,
}

impl Credentials {
    /// Create credentials from a login and password.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: Zeroizing::new(password.into()),
        }
    }

    /// The login e-mail.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    /// The login e-mail, masked for logging.
    #[must_use]
    pub fn masked_username(&self) -> String {
        mask_email(&self.username)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.masked_username())
            .field("password", &"***")
            .finish()
    }
}

/// Mask an e-mail address for safe logging.
///
/// `user@example.com` becomes `u***@example.com`; local parts of two
/// characters or fewer are fully starred.
#[must_use]
pub fn mask_email(email: &str) -> String {
    let Some((local, domain)) = email.split_once('@') else {
        return "***".to_string();
    };

    let len = local.chars().count();
    let masked_local = if len <= 2 {
        "*".repeat(len)
    } else {
        let first: String = local.chars().take(1).collect();
        format!("{first}{}", "*".repeat(len - 1))
    };

    format!("{masked_local}@{domain}")
}
