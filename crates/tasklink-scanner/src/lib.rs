//! Task listing extraction.
//!
//! [`parser`] holds the pure text-to-value functions; [`TaskListScraper`]
//! walks the listing table through a browser session and turns each row into
//! a [`tasklink_core::TaskRecord`]. Malformed rows are dropped one by one and
//! never abort the page.

pub mod error;
pub mod parser;
pub mod scraper;

pub use error::{Result, RowError};
pub use parser::{extract_task_id, parse_count, parse_price, sanitize_text};
pub use scraper::{TaskListScraper, TASK_ROW_SELECTOR};
