//! Raw event to snapshot aggregation.

use std::time::Instant;

use tracing::trace;

use super::config::ProgressConfig;
use super::display::{format_eta, format_speed, megabytes, strip_ansi};
use super::types::{ProgressSnapshot, RawProgress, RawStatus};

/// Status text reported once the transfer finished.
pub const PROCESSING_STATUS: &str = "Processing audio...";

/// What one raw event produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressUpdate {
    /// New snapshot, when the percent advanced and the percent interval allowed it.
    pub snapshot: Option<ProgressSnapshot>,
    /// Status line, when the status interval allowed it.
    pub status: Option<String>,
    /// The event marked the end of the transfer.
    pub finished: bool,
}

impl ProgressUpdate {
    pub fn is_empty(&self) -> bool {
        self.snapshot.is_none() && self.status.is_none()
    }
}

/// Converts raw progress events into monotonic, rate-limited snapshots.
///
/// One aggregator tracks one item at a time. Call [`reset`](Self::reset)
/// before reusing it for the next batch item.
#[derive(Debug, Clone)]
pub struct ProgressAggregator {
    config: ProgressConfig,
    last_percent: u8,
    last_percent_at: Option<Instant>,
    last_status_at: Option<Instant>,
}

impl ProgressAggregator {
    pub fn new(config: ProgressConfig) -> Self {
        Self {
            config,
            last_percent: 0,
            last_percent_at: None,
            last_status_at: None,
        }
    }

    /// Last percent reported for the current item.
    pub fn last_percent(&self) -> u8 {
        self.last_percent
    }

    /// Forgets the current item: percent back to zero, timers cleared.
    pub fn reset(&mut self) {
        self.last_percent = 0;
        self.last_percent_at = None;
        self.last_status_at = None;
    }

    pub fn observe(&mut self, raw: &RawProgress) -> ProgressUpdate {
        self.observe_at(raw, Instant::now())
    }

    /// Processes one raw event as if it arrived at `now`.
    pub fn observe_at(&mut self, raw: &RawProgress, now: Instant) -> ProgressUpdate {
        match raw.status {
            RawStatus::Finished => self.finish(raw, now),
            RawStatus::Downloading => self.advance(raw, now),
            RawStatus::Other => ProgressUpdate::default(),
        }
    }

    fn finish(&mut self, raw: &RawProgress, now: Instant) -> ProgressUpdate {
        self.last_percent = 100;
        self.last_percent_at = Some(now);
        self.last_status_at = Some(now);

        let downloaded = raw.downloaded_bytes.unwrap_or(0);
        ProgressUpdate {
            snapshot: Some(ProgressSnapshot {
                percent: 100,
                downloaded_bytes: downloaded,
                total_bytes: raw.known_total().or(Some(downloaded).filter(|d| *d > 0)),
                speed_bytes_per_sec: None,
                eta_seconds: None,
                status_text: PROCESSING_STATUS.to_string(),
            }),
            status: Some(PROCESSING_STATUS.to_string()),
            finished: true,
        }
    }

    fn advance(&mut self, raw: &RawProgress, now: Instant) -> ProgressUpdate {
        let derived = derive_percent(raw);
        let eta = compute_eta(raw);
        let status_text = status_line(raw, eta);
        let mut update = ProgressUpdate::default();

        if derived > self.last_percent
            && due(self.last_percent_at, now, self.config.percent_interval())
        {
            let applied = self.smooth(derived);
            trace!(derived, applied, "progress advanced");

            self.last_percent = applied;
            self.last_percent_at = Some(now);
            update.snapshot = Some(ProgressSnapshot {
                percent: applied,
                downloaded_bytes: raw.downloaded_bytes.unwrap_or(0),
                total_bytes: raw.known_total(),
                speed_bytes_per_sec: raw.speed.filter(|s| *s > 0.0),
                eta_seconds: eta.map(|e| e.round() as u64),
                status_text: status_text.clone(),
            });
        }

        if due(self.last_status_at, now, self.config.status_interval()) {
            self.last_status_at = Some(now);
            update.status = Some(status_text);
        }

        update
    }

    fn smooth(&self, derived: u8) -> u8 {
        let last = self.last_percent;
        if derived - last > self.config.smoothing_threshold {
            ((derived as u16 + last as u16) / 2) as u8
        } else {
            derived
        }
    }
}

impl Default for ProgressAggregator {
    fn default() -> Self {
        Self::new(ProgressConfig::default())
    }
}

fn due(last: Option<Instant>, now: Instant, interval: std::time::Duration) -> bool {
    match last {
        None => true,
        Some(at) => now.saturating_duration_since(at) >= interval,
    }
}

/// Percent from the best available source, clamped to 0..=100.
///
/// Priority: explicit percent string, byte counters, fragment counters.
fn derive_percent(raw: &RawProgress) -> u8 {
    let from_str = raw
        .percent_str
        .as_deref()
        .and_then(parse_percent)
        .filter(|p| *p > 0.0);

    let from_bytes = || match (raw.downloaded_bytes, raw.known_total()) {
        (Some(downloaded), Some(total)) => Some(downloaded as f64 / total as f64 * 100.0),
        _ => None,
    };

    let from_fragments = || match (raw.fragment_index, raw.fragment_count) {
        (Some(index), Some(count)) if count > 0 => Some(index as f64 / count as f64 * 100.0),
        _ => None,
    };

    let percent = from_str
        .or_else(from_bytes)
        .or_else(from_fragments)
        .unwrap_or(0.0);

    percent.clamp(0.0, 100.0) as u8
}

fn parse_percent(text: &str) -> Option<f64> {
    strip_ansi(text)
        .trim()
        .trim_end_matches('%')
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite())
}

/// Remaining seconds, only when speed, total and downloaded are all positive.
fn compute_eta(raw: &RawProgress) -> Option<f64> {
    let speed = raw.speed.filter(|s| *s > 0.0)?;
    let total = raw.known_total()?;
    let downloaded = raw.downloaded_bytes.filter(|d| *d > 0)?;
    Some(total.saturating_sub(downloaded) as f64 / speed)
}

fn status_line(raw: &RawProgress, eta: Option<f64>) -> String {
    let mut line = String::from("Downloading...");

    if let Some(downloaded) = raw.downloaded_bytes.filter(|d| *d > 0) {
        match raw.known_total() {
            Some(total) => line.push_str(&format!(
                " {:.1}MB / {:.1}MB",
                megabytes(downloaded),
                megabytes(total)
            )),
            None => line.push_str(&format!(" {:.1}MB", megabytes(downloaded))),
        }
    }

    let speed = raw
        .speed_str
        .as_deref()
        .map(|s| strip_ansi(s).trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| raw.speed.filter(|s| *s > 0.0).map(format_speed));
    if let Some(speed) = speed {
        line.push_str(&format!(" | Speed: {}", speed));
    }

    if let Some(eta) = eta.filter(|e| *e > 0.0) {
        line.push_str(&format!(" | ETA: {}", format_eta(eta)));
    }

    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn at(base: Instant, ms: u64) -> Instant {
        base + Duration::from_millis(ms)
    }

    #[test]
    fn test_percent_string_has_priority() {
        let raw = RawProgress {
            percent_str: Some("\x1b[0;94m 10.0%\x1b[0m".to_string()),
            downloaded_bytes: Some(50),
            total_bytes: Some(100),
            ..Default::default()
        };
        assert_eq!(derive_percent(&raw), 10);
    }

    #[test]
    fn test_falls_back_to_bytes_then_fragments() {
        assert_eq!(derive_percent(&RawProgress::bytes(25, Some(100))), 25);

        let estimate = RawProgress {
            downloaded_bytes: Some(30),
            total_bytes_estimate: Some(60),
            ..Default::default()
        };
        assert_eq!(derive_percent(&estimate), 50);

        assert_eq!(derive_percent(&RawProgress::fragments(3, 4)), 75);
        assert_eq!(derive_percent(&RawProgress::bytes(10, None)), 0);
        assert_eq!(derive_percent(&RawProgress::percent("N/A")), 0);
    }

    #[test]
    fn test_percent_is_clamped() {
        assert_eq!(derive_percent(&RawProgress::bytes(300, Some(100))), 100);
        assert_eq!(derive_percent(&RawProgress::percent("-5%")), 0);
    }

    #[test]
    fn test_no_update_without_percent() {
        let mut agg = ProgressAggregator::default();
        let update = agg.observe_at(&RawProgress::bytes(10, None), Instant::now());
        assert!(update.snapshot.is_none());
        assert_eq!(update.status.as_deref(), Some("Downloading... 0.0MB"));
    }

    #[test]
    fn test_monotonic_percent() {
        let mut agg = ProgressAggregator::new(ProgressConfig::unthrottled());
        let t0 = Instant::now();

        let first = agg.observe_at(&RawProgress::percent("15%"), t0);
        assert_eq!(first.snapshot.map(|s| s.percent), Some(15));

        let backwards = agg.observe_at(&RawProgress::percent("9%"), at(t0, 10));
        assert!(backwards.snapshot.is_none());
        assert_eq!(agg.last_percent(), 15);

        let equal = agg.observe_at(&RawProgress::percent("15%"), at(t0, 20));
        assert!(equal.snapshot.is_none());
    }

    #[test]
    fn test_large_jump_is_smoothed() {
        let mut agg = ProgressAggregator::new(ProgressConfig::unthrottled());
        let t0 = Instant::now();

        agg.observe_at(&RawProgress::percent("10%"), t0);
        let jump = agg.observe_at(&RawProgress::percent("60%"), at(t0, 1));
        assert_eq!(jump.snapshot.map(|s| s.percent), Some(35));

        let small = agg.observe_at(&RawProgress::percent("50%"), at(t0, 2));
        assert_eq!(small.snapshot.map(|s| s.percent), Some(50));
    }

    #[test]
    fn test_percent_rate_limit() {
        let mut agg = ProgressAggregator::default();
        let t0 = Instant::now();

        assert!(agg.observe_at(&RawProgress::percent("5%"), t0).snapshot.is_some());
        assert!(agg
            .observe_at(&RawProgress::percent("6%"), at(t0, 50))
            .snapshot
            .is_none());
        let later = agg.observe_at(&RawProgress::percent("7%"), at(t0, 100));
        assert_eq!(later.snapshot.map(|s| s.percent), Some(7));
    }

    #[test]
    fn test_status_rate_limit_is_looser() {
        let mut agg = ProgressAggregator::default();
        let t0 = Instant::now();

        assert!(agg.observe_at(&RawProgress::percent("1%"), t0).status.is_some());

        let mid = agg.observe_at(&RawProgress::percent("2%"), at(t0, 200));
        assert!(mid.snapshot.is_some());
        assert!(mid.status.is_none());

        let late = agg.observe_at(&RawProgress::percent("3%"), at(t0, 500));
        assert!(late.status.is_some());
    }

    #[test]
    fn test_finished_forces_full_percent() {
        let mut agg = ProgressAggregator::default();
        let t0 = Instant::now();
        agg.observe_at(&RawProgress::percent("10%"), t0);

        let update = agg.observe_at(&RawProgress::finished(), at(t0, 1));
        assert!(update.finished);
        assert_eq!(update.snapshot.map(|s| s.percent), Some(100));
        assert_eq!(update.status.as_deref(), Some(PROCESSING_STATUS));
    }

    #[test]
    fn test_reset_clears_percent_and_timers() {
        let mut agg = ProgressAggregator::default();
        let t0 = Instant::now();
        agg.observe_at(&RawProgress::percent("80%"), t0);
        agg.reset();
        assert_eq!(agg.last_percent(), 0);

        // Immediately eligible again, and lower than the previous item.
        let update = agg.observe_at(&RawProgress::percent("4%"), at(t0, 1));
        assert_eq!(update.snapshot.map(|s| s.percent), Some(4));
    }

    #[test]
    fn test_status_line_with_all_parts() {
        let raw = RawProgress {
            downloaded_bytes: Some(1024 * 1024),
            total_bytes: Some(3 * 1024 * 1024),
            speed: Some(1024.0 * 1024.0),
            speed_str: Some("\x1b[0;32m1.00MiB/s\x1b[0m".to_string()),
            ..Default::default()
        };
        let eta = compute_eta(&raw);
        assert_eq!(eta, Some(2.0));
        assert_eq!(
            status_line(&raw, eta),
            "Downloading... 1.0MB / 3.0MB | Speed: 1.00MiB/s | ETA: 2s"
        );
    }

    #[test]
    fn test_eta_requires_all_counters() {
        assert!(compute_eta(&RawProgress::bytes(10, Some(100))).is_none());
        assert!(compute_eta(&RawProgress::bytes(0, Some(100)).with_speed(5.0)).is_none());
        assert!(compute_eta(&RawProgress::bytes(10, None).with_speed(5.0)).is_none());
    }

    #[test]
    fn test_snapshot_carries_counters() {
        let mut agg = ProgressAggregator::default();
        let raw = RawProgress::bytes(50, Some(200)).with_speed(10.0);
        let snapshot = agg.observe_at(&raw, Instant::now()).snapshot.unwrap();
        assert_eq!(snapshot.percent, 25);
        assert_eq!(snapshot.downloaded_bytes, 50);
        assert_eq!(snapshot.total_bytes, Some(200));
        assert_eq!(snapshot.eta_seconds, Some(15));
    }
}
