use std::time::Duration;

use crate::config::Config;

/// Probe and reconnect timing for public page loads.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub probe_attempts: u32,
    pub probe_backoff_step: Duration,
    pub auto_retries: u32,
    pub auto_retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            probe_attempts: 3,
            probe_backoff_step: Duration::from_millis(1000),
            auto_retries: 1,
            auto_retry_delay: Duration::from_millis(2000),
        }
    }
}

impl From<&Config> for RetryPolicy {
    fn from(config: &Config) -> Self {
        Self {
            probe_attempts: config.probe_attempts.max(1),
            probe_backoff_step: Duration::from_millis(config.probe_backoff_ms),
            auto_retries: config.auto_retries,
            auto_retry_delay: Duration::from_millis(config.auto_retry_delay_ms),
        }
    }
}

impl RetryPolicy {
    /// Delay after the `failed_attempt`-th probe failure (1-based). Linear.
    pub fn probe_backoff(&self, failed_attempt: u32) -> Duration {
        self.probe_backoff_step * failed_attempt
    }

    pub fn total_attempts(&self) -> u32 {
        self.auto_retries + 1
    }
}
