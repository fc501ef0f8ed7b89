//! Configuration management for Tasklink.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Credentials;
use directories::ProjectDirs;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

/// Main application configuration.
///
/// Loaded from the path given on the command line, `TASKLINK_CONFIG`, or
/// `~/.config/tasklink/config.toml` (or platform equivalent).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Marketplace account and page locations
    pub marketplace: MarketplaceConfig,
    /// Captcha solving service settings
    pub captcha: CaptchaConfig,
    /// Storage settings
    pub database: DatabaseConfig,
    /// Browser automation settings
    pub browser: BrowserConfig,
    /// Console output settings
    pub output: OutputConfig,
    /// Log sink settings
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from an explicit file.
    ///
    /// There is no fallback to defaults: credentials have none, so a missing
    /// file is an error.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
            });
        }

        tracing::debug!("Loading config from {}", path.display());
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `TASKLINK_USERNAME`: Override the marketplace login
    /// - `TASKLINK_PASSWORD`: Override the marketplace password
    /// - `TASKLINK_CAPTCHA_KEY`: Override the captcha API key
    /// - `TASKLINK_HEADLESS`: Override browser headless mode (true/false)
    /// - `TASKLINK_DB_PATH`: Override the database file
    pub fn load_with_env(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let mut config = Self::load_from(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply `TASKLINK_*` environment overrides in place.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("TASKLINK_USERNAME") {
            tracing::debug!("Override marketplace.username from env");
            self.marketplace.username = val;
        }

        if let Ok(val) = std::env::var("TASKLINK_PASSWORD") {
            tracing::debug!("Override marketplace.password from env");
            self.marketplace.password = val;
        }

        if let Ok(val) = std::env::var("TASKLINK_CAPTCHA_KEY") {
            tracing::debug!("Override captcha.api_key from env");
            self.captcha.api_key = val;
        }

        if let Ok(val) = std::env::var("TASKLINK_HEADLESS") {
            if let Ok(headless) = val.parse() {
                self.browser.headless = headless;
                tracing::debug!("Override browser.headless from env: {}", headless);
            }
        }

        if let Ok(val) = std::env::var("TASKLINK_DB_PATH") {
            tracing::debug!("Override database.path from env: {}", val);
            self.database.path = PathBuf::from(val);
        }
    }

    /// Validate required fields before any session work starts.
    pub fn validate(&self) -> ConfigResult<()> {
        static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
        static API_KEY_REGEX: OnceLock<Regex> = OnceLock::new();

        let email = EMAIL_REGEX.get_or_init(|| {
            Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid regex")
        });
        if !email.is_match(&self.marketplace.username) {
            return Err(ConfigError::invalid(
                "marketplace.username",
                format!(
                    "expected an e-mail address, got '{}'",
                    crate::types::mask_email(&self.marketplace.username)
                ),
            ));
        }

        if self.marketplace.password.is_empty() {
            return Err(ConfigError::invalid("marketplace.password", "must not be empty"));
        }

        let api_key =
            API_KEY_REGEX.get_or_init(|| Regex::new(r"^[a-fA-F0-9]{32}$").expect("valid regex"));
        if !api_key.is_match(&self.captcha.api_key) {
            return Err(ConfigError::invalid(
                "captcha.api_key",
                "expected 32 hex characters",
            ));
        }

        for (field, value) in [
            ("marketplace.home_url", &self.marketplace.home_url),
            ("marketplace.login_url", &self.marketplace.login_url),
            ("marketplace.task_list_url", &self.marketplace.task_list_url),
            ("captcha.api_url", &self.captcha.api_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| ConfigError::invalid(field, format!("invalid URL: {e}")))?;
        }

        for (field, value) in [
            ("captcha.timeout_secs", self.captcha.timeout_secs),
            ("captcha.poll_interval_secs", self.captcha.poll_interval_secs),
            ("captcha.request_timeout_secs", self.captcha.request_timeout_secs),
            ("browser.wait_timeout_secs", self.browser.wait_timeout_secs),
            ("browser.poll_interval_ms", self.browser.poll_interval_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::invalid(field, "must be greater than zero"));
            }
        }

        if self.captcha.create_attempts == 0 {
            return Err(ConfigError::invalid(
                "captcha.create_attempts",
                "must be greater than zero",
            ));
        }
        if self.database.connect_attempts == 0 {
            return Err(ConfigError::invalid(
                "database.connect_attempts",
                "must be greater than zero",
            ));
        }

        Ok(())
    }

    /// Build the login credentials from the marketplace section.
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials::new(
            self.marketplace.username.clone(),
            self.marketplace.password.clone(),
        )
    }

    /// Resolve the configuration file path.
    ///
    /// An explicit path wins, then `TASKLINK_CONFIG`, then the XDG location
    /// `~/.config/tasklink/config.toml`.
    pub fn resolve_path(explicit: Option<&Path>) -> ConfigResult<PathBuf> {
        if let Some(path) = explicit {
            return Ok(path.to_path_buf());
        }
        if let Ok(path) = std::env::var("TASKLINK_CONFIG") {
            return Ok(PathBuf::from(path));
        }
        Self::config_path()
    }

    /// Get the default path to the configuration file.
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("net", "tasklink", "tasklink").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// Marketplace account and page locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketplaceConfig {
    /// Login e-mail
    pub username: String,
    /// Login password
    pub password: String,
    /// Home page, where the sign-in modal lives
    pub home_url: String,
    /// Sign-in endpoint; reported to the captcha service as the page URL
    pub login_url: String,
    /// Task listing page
    pub task_list_url: String,
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            home_url: "https://gogetlinks.net".to_string(),
            login_url: "https://gogetlinks.net/user/signIn".to_string(),
            task_list_url: "https://gogetlinks.net/webTask/index".to_string(),
        }
    }
}

/// Captcha solving service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptchaConfig {
    /// Provider API key (32 hex characters)
    pub api_key: String,
    /// Provider API base URL
    pub api_url: String,
    /// Provider task type
    pub task_type: String,
    /// Overall solve deadline in seconds
    pub timeout_secs: u64,
    /// Delay between result polls in seconds
    pub poll_interval_secs: u64,
    /// Attempts for the create-task request
    pub create_attempts: u32,
    /// Fixed delay between create-task attempts in seconds
    pub create_retry_delay_secs: u64,
    /// Per-request HTTP timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: "https://api.anti-captcha.com".to_string(),
            task_type: "NoCaptchaTaskProxyless".to_string(),
            timeout_secs: 120,
            poll_interval_secs: 5,
            create_attempts: 3,
            create_retry_delay_secs: 10,
            request_timeout_secs: 30,
        }
    }
}

impl CaptchaConfig {
    /// Overall solve deadline.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Per-request HTTP timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` database file (or `:memory:`)
    pub path: PathBuf,
    /// Attempts to open the database before giving up
    pub connect_attempts: u32,
    /// Base backoff between attempts in seconds (doubles each attempt)
    pub connect_backoff_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("tasklink.db"),
            connect_attempts: 3,
            connect_backoff_secs: 2,
        }
    }
}

/// Browser automation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run browser in headless mode
    pub headless: bool,
    /// Browser window width
    pub window_width: u32,
    /// Browser window height
    pub window_height: u32,
    /// User agent presented to the marketplace
    pub user_agent: String,
    /// Attach to a running Chrome instead of launching one
    pub remote_debugging_url: Option<String>,
    /// Upper bound for every explicit element wait in seconds
    pub wait_timeout_secs: u64,
    /// Interval between element probes in milliseconds
    pub poll_interval_ms: u64,
    /// Pause after navigation so client-side rendering can finish
    pub settle_ms: u64,
    /// Pause after opening the sign-in modal
    pub modal_settle_ms: u64,
    /// Pause after submitting credentials before verifying
    pub post_submit_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            remote_debugging_url: None,
            wait_timeout_secs: 10,
            poll_interval_ms: 250,
            settle_ms: 2000,
            modal_settle_ms: 2000,
            post_submit_ms: 3000,
        }
    }
}

impl BrowserConfig {
    /// Upper bound for explicit element waits.
    #[must_use]
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }
}

/// Console output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Print the scraped tasks as a table after the run
    pub print_to_console: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            print_to_console: true,
        }
    }
}

/// Log sink settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log file path; rotated daily
    pub log_file: PathBuf,
    /// Default level filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from("tasklink.log"),
            log_level: "info".to_string(),
        }
    }
}
