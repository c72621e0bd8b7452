//! Configuration for progress aggregation.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Rate limits and smoothing for progress reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// Minimum interval between percent updates (milliseconds).
    #[serde(default = "default_percent_interval")]
    pub percent_interval_ms: u64,

    /// Minimum interval between status text updates (milliseconds).
    #[serde(default = "default_status_interval")]
    pub status_interval_ms: u64,

    /// Jumps larger than this many percentage points are averaged with the
    /// previous value.
    #[serde(default = "default_smoothing_threshold")]
    pub smoothing_threshold: u8,
}

fn default_percent_interval() -> u64 {
    100
}

fn default_status_interval() -> u64 {
    500
}

fn default_smoothing_threshold() -> u8 {
    20
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            percent_interval_ms: default_percent_interval(),
            status_interval_ms: default_status_interval(),
            smoothing_threshold: default_smoothing_threshold(),
        }
    }
}

impl ProgressConfig {
    pub fn percent_interval(&self) -> Duration {
        Duration::from_millis(self.percent_interval_ms)
    }

    pub fn status_interval(&self) -> Duration {
        Duration::from_millis(self.status_interval_ms)
    }

    /// Config with rate limiting disabled.
    pub fn unthrottled() -> Self {
        Self {
            percent_interval_ms: 0,
            status_interval_ms: 0,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProgressConfig::default();
        assert_eq!(config.percent_interval(), Duration::from_millis(100));
        assert_eq!(config.status_interval(), Duration::from_millis(500));
        assert_eq!(config.smoothing_threshold, 20);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ProgressConfig = toml::from_str("status_interval_ms = 1000").unwrap();
        assert_eq!(config.status_interval_ms, 1000);
        assert_eq!(config.percent_interval_ms, 100);
    }
}
