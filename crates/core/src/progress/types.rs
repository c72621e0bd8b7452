//! Progress event types.

use serde::{Deserialize, Serialize};

/// Phase reported by a raw progress event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawStatus {
    #[default]
    Downloading,
    /// Transfer finished; post-processing follows.
    Finished,
    /// Any other phase the service reports (e.g. "error").
    #[serde(other)]
    Other,
}

/// A progress event as reported by the extraction service.
///
/// Every field is optional; services report whatever they know.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawProgress {
    #[serde(default)]
    pub status: RawStatus,
    /// Preformatted percent, e.g. `" 42.3%"`, possibly with ANSI colors.
    #[serde(default, rename = "_percent_str")]
    pub percent_str: Option<String>,
    #[serde(default)]
    pub downloaded_bytes: Option<u64>,
    #[serde(default)]
    pub total_bytes: Option<u64>,
    #[serde(default)]
    pub total_bytes_estimate: Option<u64>,
    #[serde(default)]
    pub fragment_index: Option<u64>,
    #[serde(default)]
    pub fragment_count: Option<u64>,
    /// Transfer speed in bytes per second.
    #[serde(default)]
    pub speed: Option<f64>,
    /// Preformatted speed, e.g. `"1.20MiB/s"`.
    #[serde(default, rename = "_speed_str")]
    pub speed_str: Option<String>,
    /// Preformatted ETA as reported by the service.
    #[serde(default, rename = "_eta_str")]
    pub eta_str: Option<String>,
}

impl RawProgress {
    /// A downloading event with byte counters.
    pub fn bytes(downloaded: u64, total: Option<u64>) -> Self {
        Self {
            downloaded_bytes: Some(downloaded),
            total_bytes: total,
            ..Default::default()
        }
    }

    /// A downloading event with only a percent string.
    pub fn percent(percent_str: impl Into<String>) -> Self {
        Self {
            percent_str: Some(percent_str.into()),
            ..Default::default()
        }
    }

    /// A downloading event with only fragment counters.
    pub fn fragments(index: u64, count: u64) -> Self {
        Self {
            fragment_index: Some(index),
            fragment_count: Some(count),
            ..Default::default()
        }
    }

    /// The transfer-finished event.
    pub fn finished() -> Self {
        Self {
            status: RawStatus::Finished,
            ..Default::default()
        }
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    /// Known total size: exact if reported, else the estimate.
    pub fn known_total(&self) -> Option<u64> {
        self.total_bytes
            .filter(|t| *t > 0)
            .or(self.total_bytes_estimate.filter(|t| *t > 0))
    }
}

/// Aggregated progress for one job or batch item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// 0..=100, non-decreasing within one item.
    pub percent: u8,
    pub downloaded_bytes: u64,
    pub total_bytes: Option<u64>,
    pub speed_bytes_per_sec: Option<f64>,
    pub eta_seconds: Option<u64>,
    pub status_text: String,
}

impl ProgressSnapshot {
    /// The snapshot reported when a new item starts.
    pub fn zero(status_text: impl Into<String>) -> Self {
        Self {
            percent: 0,
            downloaded_bytes: 0,
            total_bytes: None,
            speed_bytes_per_sec: None,
            eta_seconds: None,
            status_text: status_text.into(),
        }
    }
}
