//! Run failures and the process exit contract.

use tasklink_auth::AuthError;
use tasklink_browser::BrowserError;
use tasklink_core::ConfigError;
use tasklink_db::DatabaseError;
use thiserror::Error;

/// Process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitStatus {
    /// Run completed
    Success = 0,
    /// Login failed
    AuthFailed = 1,
    /// Challenge could not be solved
    CaptchaFailed = 2,
    /// Configuration missing or invalid
    ConfigError = 3,
    /// Database unavailable or every write failed
    StorageError = 4,
    /// Browser session could not be acquired or broke
    BrowserError = 5,
    /// Anything else, including panics and interrupts
    Unexpected = 99,
}

impl ExitStatus {
    /// Numeric process exit code.
    #[must_use]
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl From<ExitStatus> for std::process::ExitCode {
    fn from(status: ExitStatus) -> Self {
        Self::from(status.code())
    }
}

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum RunError {
    /// Configuration could not be loaded or validated
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Log sinks could not be installed
    #[error("logging setup failed: {0}")]
    Logging(String),

    /// Database could not be opened
    #[error("storage error: {0}")]
    Storage(#[from] DatabaseError),

    /// Tasks were scraped but none could be stored
    #[error("storage error: all {attempted} task writes failed")]
    NothingPersisted {
        /// Records attempted
        attempted: usize,
    },

    /// Browser session failure outside the login flow
    #[error("browser error: {0}")]
    Browser(#[from] BrowserError),

    /// Login failed
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// Stopped by an interrupt before finishing
    #[error("interrupted by user")]
    Interrupted,

    /// Anything not covered above
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl RunError {
    /// Exit status for this failure.
    #[must_use]
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            Self::Config(_) | Self::Logging(_) => ExitStatus::ConfigError,
            Self::Storage(_) | Self::NothingPersisted { .. } => ExitStatus::StorageError,
            Self::Browser(_) | Self::Auth(AuthError::Session(_)) => ExitStatus::BrowserError,
            Self::Auth(e) if e.is_challenge_failure() => ExitStatus::CaptchaFailed,
            Self::Auth(_) => ExitStatus::AuthFailed,
            Self::Interrupted | Self::Unexpected(_) => ExitStatus::Unexpected,
        }
    }
}
