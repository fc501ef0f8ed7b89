//! Poll and retry policies.
//!
//! Every wait in Tasklink is bounded. Components take these policies instead
//! of sleeping ad hoc, and all sleeping goes through `tokio::time` so tests can
//! drive them with a paused clock.

use crate::config::{BrowserConfig, CaptchaConfig, DatabaseConfig};
use std::time::Duration;

/// Bounded polling: probe every `interval` until `max_wait` elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay between probes
    pub interval: Duration,
    /// Upper bound on the whole wait
    pub max_wait: Duration,
}

impl PollPolicy {
    /// Create a new poll policy.
    #[must_use]
    pub fn new(interval: Duration, max_wait: Duration) -> Self {
        Self { interval, max_wait }
    }

    /// Same interval, different upper bound.
    #[must_use]
    pub fn with_max_wait(self, max_wait: Duration) -> Self {
        Self { max_wait, ..self }
    }

    /// Sleep duration for the next probe, never overshooting `remaining`.
    #[must_use]
    pub fn next_delay(&self, remaining: Duration) -> Duration {
        self.interval.min(remaining)
    }
}

impl From<&CaptchaConfig> for PollPolicy {
    fn from(config: &CaptchaConfig) -> Self {
        Self::new(
            Duration::from_secs(config.poll_interval_secs),
            config.timeout(),
        )
    }
}

impl From<&BrowserConfig> for PollPolicy {
    fn from(config: &BrowserConfig) -> Self {
        Self::new(
            Duration::from_millis(config.poll_interval_ms),
            Duration::from_secs(config.wait_timeout_secs),
        )
    }
}

/// Retry with a base delay multiplied by `backoff_factor` per failed attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay after the first failure
    pub delay: Duration,
    /// Multiplier applied per additional failure (1.0 = fixed delay)
    pub backoff_factor: f64,
}

impl RetryPolicy {
    /// Fixed delay between attempts.
    #[must_use]
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
            backoff_factor: 1.0,
        }
    }

    /// Delay doubling after each failure.
    #[must_use]
    pub fn exponential(max_attempts: u32, base: Duration) -> Self {
        Self {
            max_attempts,
            delay: base,
            backoff_factor: 2.0,
        }
    }

    /// Delay to wait after the given 1-based failed attempt.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        self.delay.mul_f64(self.backoff_factor.powi(exponent))
    }

    /// Whether another attempt follows the given 1-based attempt.
    #[must_use]
    pub fn has_next(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

impl From<&CaptchaConfig> for RetryPolicy {
    fn from(config: &CaptchaConfig) -> Self {
        Self::fixed(
            config.create_attempts,
            Duration::from_secs(config.create_retry_delay_secs),
        )
    }
}

impl From<&DatabaseConfig> for RetryPolicy {
    fn from(config: &DatabaseConfig) -> Self {
        Self::exponential(
            config.connect_attempts,
            Duration::from_secs(config.connect_backoff_secs),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_delay_is_capped_by_remaining() {
        let policy = PollPolicy::new(Duration::from_secs(5), Duration::from_secs(120));
        assert_eq!(policy.next_delay(Duration::from_secs(60)), Duration::from_secs(5));
        assert_eq!(policy.next_delay(Duration::from_secs(2)), Duration::from_secs(2));
    }

    #[test]
    fn test_fixed_retry_delay() {
        let policy = RetryPolicy::fixed(3, Duration::from_secs(10));
        assert_eq!(policy.delay_for(1), Duration::from_secs(10));
        assert_eq!(policy.delay_for(2), Duration::from_secs(10));
        assert!(policy.has_next(2));
        assert!(!policy.has_next(3));
    }

    #[test]
    fn test_exponential_retry_delay() {
        let policy = RetryPolicy::exponential(3, Duration::from_secs(2));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for(3), Duration::from_secs(8));
    }

    #[test]
    fn test_policies_from_config() {
        let captcha = CaptchaConfig::default();
        let poll = PollPolicy::from(&captcha);
        assert_eq!(poll.interval, Duration::from_secs(5));
        assert_eq!(poll.max_wait, Duration::from_secs(120));

        let retry = RetryPolicy::from(&captcha);
        assert_eq!(retry.max_attempts, 3);
        assert_eq!(retry.delay_for(2), Duration::from_secs(10));

        let browser = PollPolicy::from(&BrowserConfig::default());
        assert_eq!(browser.interval, Duration::from_millis(250));
        assert_eq!(browser.max_wait, Duration::from_secs(10));
    }
}
