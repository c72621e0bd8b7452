//! Retry configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::gateway::{DownloadError, DownloadErrorKind};

/// Upper bound on `max_attempts`: a probe failure is retried at most twice.
pub const MAX_ATTEMPTS_LIMIT: u32 = 3;

/// How transient download failures are retried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts, including the first one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Pause between attempts in milliseconds.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_delay_ms() -> u64 {
    500
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_ms: default_delay_ms(),
        }
    }
}

impl RetryConfig {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Whether `error` on attempt number `attempt` (1-based) warrants another try.
    ///
    /// Only probe failures are transient.
    pub fn should_retry(&self, error: &DownloadError, attempt: u32) -> bool {
        error.kind == DownloadErrorKind::ProbeFailure && attempt < self.max_attempts
    }
}
