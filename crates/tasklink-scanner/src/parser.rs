//! Pure field parsers for listing cells.

use crate::error::{Result, RowError};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use tasklink_core::TaskId;

/// Price cell values meaning "no price".
const NO_PRICE: &[&str] = &["FREE", "N/A", "TBD", "-", "—"];

static CURRENCY_NOISE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)usd|eur|rub|руб\.?|р\.?|[$€£¥₽]|\s").expect("valid currency regex")
});

/// Decode HTML entities, collapse whitespace runs to one space and trim.
#[must_use]
pub fn sanitize_text(text: &str) -> String {
    html_escape::decode_html_entities(text)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a price cell into an exact decimal.
///
/// Total: sentinels, empty input and anything unparseable yield `0.00`.
#[must_use]
pub fn parse_price(text: &str) -> Decimal {
    let zero = Decimal::new(0, 2);

    let trimmed = text.trim();
    if trimmed.is_empty() || NO_PRICE.iter().any(|s| trimmed.eq_ignore_ascii_case(s)) {
        return zero;
    }

    let cleaned = CURRENCY_NOISE.replace_all(trimmed, "").replace(',', "");
    Decimal::from_str(&cleaned).unwrap_or(zero)
}

/// Extract the task id from a row id like `col_row_123456`.
pub fn extract_task_id(row_id: &str) -> Result<TaskId> {
    let segments: Vec<&str> = row_id.split('_').collect();
    if segments.len() < 3 {
        return Err(RowError::InvalidRowId(row_id.to_string()));
    }

    let digits = segments[segments.len() - 1];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RowError::InvalidRowId(row_id.to_string()));
    }

    digits
        .parse::<u64>()
        .map(TaskId::new)
        .map_err(|_| RowError::InvalidRowId(row_id.to_string()))
}

/// Parse a small count such as the external-link cell, `0` when missing or unparseable.
#[must_use]
pub fn parse_count(text: &str) -> u32 {
    sanitize_text(text).parse().unwrap_or(0)
}
