//! Tasklink Core - Foundation crate for the Tasklink marketplace scraper.
//!
//! This crate provides shared types, error handling, configuration management
//! and wait/retry policies that all other Tasklink crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths and env overrides
//! - [`types`] - Shared domain types (`TaskId`, `TaskRecord`, `Credentials`)
//! - [`policy`] - Poll and retry policies for bounded waiting
//! - [`context`] - Per-run context carrying the run id and tracing span
//!
//! # Example
//!
//! ```rust
//! use tasklink_core::{AppConfig, PollPolicy};
//!
//! let config = AppConfig::default();
//! let policy = PollPolicy::from(&config.captcha);
//! assert_eq!(policy.max_wait.as_secs(), 120);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod context;
pub mod error;
pub mod policy;
pub mod types;

// Re-export commonly used types
pub use config::{
    AppConfig, BrowserConfig, CaptchaConfig, DatabaseConfig, LoggingConfig, MarketplaceConfig,
    OutputConfig,
};
pub use context::RunContext;
pub use error::{ConfigError, ConfigResult, Result, TasklinkError};
pub use policy::{PollPolicy, RetryPolicy};
pub use types::{mask_email, Credentials, TaskId, TaskRecord};
