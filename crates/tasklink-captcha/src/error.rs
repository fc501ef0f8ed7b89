//! Error types for captcha solving.

use std::time::Duration;
use thiserror::Error;

/// Result alias for solver operations.
pub type Result<T> = std::result::Result<T, CaptchaError>;

/// A single request to the provider failed before a usable reply arrived.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Connection, TLS, timeout or body decoding failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered with a non-success status
    #[error("unexpected HTTP status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, possibly empty
        body: String,
    },

    /// HTTP client could not be constructed
    #[error("failed to create HTTP client: {0}")]
    Client(String),
}

/// Why a challenge could not be solved.
#[derive(Error, Debug)]
pub enum CaptchaError {
    /// Task creation failed on every attempt
    #[error("captcha service unavailable after {attempts} attempt(s): {source}")]
    SolverUnavailable {
        /// Attempts made
        attempts: u32,
        /// Last transport failure
        #[source]
        source: TransportError,
    },

    /// Provider answered with an error code or an unusable reply
    #[error("captcha provider rejected the task: {code}: {description}")]
    ProviderRejected {
        /// Provider error code
        code: String,
        /// Human readable description
        description: String,
    },

    /// No solution before the deadline
    #[error("captcha not solved within {0:?}")]
    SolveTimeout(Duration),
}

impl CaptchaError {
    pub(crate) fn rejected(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self::ProviderRejected {
            code: code.into(),
            description: description.into(),
        }
    }
}
