//! Task listing scraper.

use crate::error::{Result, RowError};
use crate::parser::{extract_task_id, parse_count, parse_price, sanitize_text};
use std::time::Duration;
use tasklink_browser::{BrowserSession, PageElement, WaitCondition};
use tasklink_core::{AppConfig, TaskRecord};
use url::Url;

/// Rows of the listing table, identified as `col_row_<task id>`.
pub const TASK_ROW_SELECTOR: &str = "tr[id^='col_row_']";

const MIN_CELLS: usize = 6;

/// Scrapes the single-page task listing.
#[derive(Debug, Clone)]
pub struct TaskListScraper {
    task_list_url: String,
    row_selector: String,
    wait_timeout: Duration,
}

impl TaskListScraper {
    /// Scraper for the listing at `task_list_url` with a 10 second row wait.
    pub fn new(task_list_url: impl Into<String>) -> Self {
        Self {
            task_list_url: task_list_url.into(),
            row_selector: TASK_ROW_SELECTOR.to_string(),
            wait_timeout: Duration::from_secs(10),
        }
    }

    /// Scraper configured from the marketplace and browser sections.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.marketplace.task_list_url).with_wait_timeout(config.browser.wait_timeout())
    }

    /// Override the row selector.
    #[must_use]
    pub fn with_row_selector(mut self, selector: impl Into<String>) -> Self {
        self.row_selector = selector.into();
        self
    }

    /// Override the bound on waiting for the first row.
    #[must_use]
    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    /// Listing page URL.
    #[must_use]
    pub fn task_list_url(&self) -> &str {
        &self.task_list_url
    }

    /// Navigate to the listing and parse every row.
    ///
    /// Never fails: navigation problems and an empty table yield an empty
    /// list, malformed rows are skipped.
    pub async fn scrape(&self, session: &dyn BrowserSession) -> Vec<TaskRecord> {
        tracing::info!(url = %self.task_list_url, "Scraping task list");

        if let Err(e) = session.navigate(&self.task_list_url).await {
            tracing::error!(error = %e, "Failed to open task list");
            return Vec::new();
        }

        let condition = WaitCondition::present(&self.row_selector);
        if let Err(e) = session.wait_until(&condition, self.wait_timeout).await {
            if e.is_timeout() {
                tracing::warn!(timeout = ?self.wait_timeout, "No task rows appeared");
            } else {
                tracing::error!(error = %e, "Failed waiting for task rows");
            }
            return Vec::new();
        }

        let rows = match session.find_elements(&self.row_selector).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!(error = %e, "Failed to enumerate task rows");
                return Vec::new();
            }
        };
        tracing::info!(rows = rows.len(), "Found task rows");

        let mut tasks = Vec::with_capacity(rows.len());
        for (index, row) in rows.iter().enumerate() {
            match self.parse_row(row.as_ref()).await {
                Ok(task) => {
                    tracing::debug!(
                        task_id = %task.task_id,
                        title = %task.title.chars().take(50).collect::<String>(),
                        "Parsed task"
                    );
                    tasks.push(task);
                }
                Err(e) => tracing::warn!(row = index, error = %e, "Skipping malformed row"),
            }
        }

        tracing::info!(parsed = tasks.len(), "Finished parsing task list");
        tasks
    }

    /// Build a record from one listing row.
    pub async fn parse_row(&self, row: &dyn PageElement) -> Result<TaskRecord> {
        let row_id = row
            .attribute("id")
            .await?
            .filter(|id| !id.is_empty())
            .ok_or(RowError::MissingRowId)?;
        let task_id = extract_task_id(&row_id)?;

        let cells = row.find_elements("td").await?;
        if cells.len() < MIN_CELLS {
            return Err(RowError::TooFewCells {
                task_id,
                found: cells.len(),
            });
        }

        let domain = link_or_cell_text(cells[0].as_ref()).await?;

        let (customer, customer_url) = match cells[1].find_element("a").await? {
            Some(link) => {
                let href = link.attribute("href").await?.unwrap_or_default();
                (sanitize_text(&link.text().await?), self.absolute_url(&href))
            }
            None => (sanitize_text(&cells[1].text().await?), String::new()),
        };

        let external_links = parse_count(&cells[2].text().await?);
        let title = link_or_cell_text(cells[3].as_ref()).await?;
        let time_passed = sanitize_text(&cells[4].text().await?);
        let price = parse_price(&sanitize_text(&cells[5].text().await?));

        Ok(TaskRecord {
            task_id,
            domain,
            customer,
            customer_url,
            external_links,
            title,
            time_passed,
            price,
        })
    }

    /// Resolve a possibly relative link against the listing page.
    fn absolute_url(&self, href: &str) -> String {
        if href.is_empty() {
            return String::new();
        }
        Url::parse(&self.task_list_url)
            .and_then(|base| base.join(href))
            .map_or_else(|_| href.to_string(), String::from)
    }
}

async fn link_or_cell_text(cell: &dyn PageElement) -> Result<String> {
    let text = match cell.find_element("a").await? {
        Some(link) => link.text().await?,
        None => cell.text().await?,
    };
    Ok(sanitize_text(&text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_url() {
        let scraper = TaskListScraper::new("https://gogetlinks.net/webTask/index");
        assert_eq!(
            scraper.absolute_url("/user/view/42"),
            "https://gogetlinks.net/user/view/42"
        );
        assert_eq!(
            scraper.absolute_url("https://other.test/c/1"),
            "https://other.test/c/1"
        );
        assert_eq!(scraper.absolute_url(""), "");
    }

    #[test]
    fn test_from_config() {
        let scraper = TaskListScraper::from_config(&AppConfig::default());
        assert_eq!(scraper.task_list_url(), "https://gogetlinks.net/webTask/index");
        assert_eq!(scraper.wait_timeout, Duration::from_secs(10));
    }
}
