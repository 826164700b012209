//! Configuration types for the apt backend.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for the apt backend, as read from the `[apt]` config section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AptConfig {
    /// Seconds apt-get waits for the dpkg lock before giving up
    pub lock_timeout_secs: u64,
    /// Attempts per apt-get invocation, including the first
    pub retry_attempts: u32,
    /// Delay before the first retry, doubled on each further attempt
    pub retry_base_delay_secs: u64,
}

impl Default for AptConfig {
    fn default() -> Self {
        Self {
            lock_timeout_secs: 60,
            retry_attempts: 3,
            retry_base_delay_secs: 5,
        }
    }
}

impl AptConfig {
    /// Retry policy derived from these settings.
    pub fn retry(&self) -> RetryConfig {
        RetryConfig::new(
            self.retry_attempts.max(1),
            Duration::from_secs(self.retry_base_delay_secs),
            2.0,
        )
    }
}

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts
    pub max_attempts: u32,
    /// Base delay between retries
    pub base_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_factor: f64,
    /// Maximum delay between retries
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(5),
            backoff_factor: 2.0,
            max_delay: Duration::from_secs(120),
        }
    }
}

impl RetryConfig {
    /// Create a new retry config with custom settings.
    pub fn new(max_attempts: u32, base_delay: Duration, backoff_factor: f64) -> Self {
        Self {
            max_attempts,
            base_delay,
            backoff_factor,
            max_delay: Duration::from_secs(120),
        }
    }

    /// Calculate the delay for a given attempt number (0-indexed).
    #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.base_delay.as_secs_f64() * self.backoff_factor.powi(attempt as i32);
        let capped = delay.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped)
    }
}
