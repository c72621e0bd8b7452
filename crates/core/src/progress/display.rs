//! Human-readable formatting for progress lines.

use once_cell::sync::Lazy;
use regex_lite::Regex;

static ANSI_ESCAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x1b\[[0-9;]*m").expect("valid ANSI pattern"));

const MEBIBYTE: f64 = 1024.0 * 1024.0;

/// Removes ANSI color escapes.
pub fn strip_ansi(text: &str) -> String {
    ANSI_ESCAPE.replace_all(text, "").into_owned()
}

/// Formats a remaining-time estimate.
///
/// Under a second: `<1s`. Under a minute: `42s`. Under an hour: `MM:SS`.
/// Otherwise `HH:MM:SS`.
pub fn format_eta(seconds: f64) -> String {
    if seconds < 1.0 {
        return "<1s".to_string();
    }

    let total = seconds.round() as u64;
    if total < 60 {
        return format!("{}s", total);
    }

    let minutes = total / 60;
    let secs = total % 60;
    if minutes < 60 {
        return format!("{:02}:{:02}", minutes, secs);
    }

    format!("{:02}:{:02}:{:02}", minutes / 60, minutes % 60, secs)
}

/// Formats a media duration as `MM:SS` or `HH:MM:SS`.
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

pub(crate) fn megabytes(bytes: u64) -> f64 {
    bytes as f64 / MEBIBYTE
}

pub(crate) fn format_speed(bytes_per_sec: f64) -> String {
    if bytes_per_sec >= MEBIBYTE {
        format!("{:.2}MiB/s", bytes_per_sec / MEBIBYTE)
    } else {
        format!("{:.2}KiB/s", bytes_per_sec / 1024.0)
    }
}
