use tasklink_browser::BrowserError;
use tasklink_core::TaskId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RowError {
    #[error("row has no id attribute")]
    MissingRowId,

    #[error("invalid row id format: {0}")]
    InvalidRowId(String),

    #[error("task {task_id}: expected 6+ cells, found {found}")]
    TooFewCells { task_id: TaskId, found: usize },

    #[error("browser error: {0}")]
    Browser(#[from] BrowserError),
}

pub type Result<T> = std::result::Result<T, RowError>;
