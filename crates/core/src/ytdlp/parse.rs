//! Parsers for yt-dlp output.

use serde::Deserialize;
use std::path::PathBuf;

use crate::gateway::{MediaKind, MediaMetadata, PlaylistEntry, ServiceError};
use crate::progress::{RawProgress, RawStatus};

/// Prefix of progress lines produced by our `--progress-template`.
pub const PROGRESS_PREFIX: &str = "[tonegrab] ";
/// Prefix of the line printed with the final file path.
pub const FILE_PREFIX: &str = "[tonegrab-file] ";

#[derive(Debug, Deserialize)]
struct InfoJson {
    #[serde(rename = "_type", default)]
    kind: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    uploader: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    webpage_url: Option<String>,
    #[serde(default)]
    entries: Option<Vec<Option<EntryJson>>>,
}

#[derive(Debug, Deserialize)]
struct EntryJson {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    webpage_url: Option<String>,
}

/// Parses the output of `yt-dlp -J`.
///
/// Unavailable playlist entries (reported as `null`) are kept as `None`
/// so positions stay stable.
pub fn parse_metadata(json: &str) -> Result<MediaMetadata, ServiceError> {
    let info: InfoJson = serde_json::from_str(json)
        .map_err(|e| ServiceError::new(format!("invalid metadata from yt-dlp: {}", e)))?;

    let is_playlist = info.kind.as_deref() == Some("playlist") || info.entries.is_some();
    let entries = info
        .entries
        .unwrap_or_default()
        .into_iter()
        .map(|entry| {
            entry.map(|e| PlaylistEntry {
                id: e.id.unwrap_or_default(),
                title: e.title,
                url: e.url,
                webpage_url: e.webpage_url,
            })
        })
        .collect();

    Ok(MediaMetadata {
        kind: if is_playlist {
            MediaKind::Playlist
        } else {
            MediaKind::Video
        },
        id: info.id.unwrap_or_default(),
        title: info.title,
        uploader: info.uploader,
        duration_secs: info.duration,
        webpage_url: info.webpage_url,
        entries,
    })
}

/// Progress dictionary as yt-dlp serializes it. Counters may be floats.
#[derive(Debug, Deserialize)]
struct ProgressJson {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    downloaded_bytes: Option<f64>,
    #[serde(default)]
    total_bytes: Option<f64>,
    #[serde(default)]
    total_bytes_estimate: Option<f64>,
    #[serde(default)]
    fragment_index: Option<f64>,
    #[serde(default)]
    fragment_count: Option<f64>,
    #[serde(default)]
    speed: Option<f64>,
    #[serde(default, rename = "_percent_str")]
    percent_str: Option<String>,
    #[serde(default, rename = "_speed_str")]
    speed_str: Option<String>,
    #[serde(default, rename = "_eta_str")]
    eta_str: Option<String>,
}

fn counter(value: Option<f64>) -> Option<u64> {
    value.filter(|v| v.is_finite() && *v >= 0.0).map(|v| v as u64)
}

impl From<ProgressJson> for RawProgress {
    fn from(p: ProgressJson) -> Self {
        let status = match p.status.as_deref() {
            Some("downloading") | None => RawStatus::Downloading,
            Some("finished") => RawStatus::Finished,
            Some(_) => RawStatus::Other,
        };
        RawProgress {
            status,
            percent_str: p.percent_str,
            downloaded_bytes: counter(p.downloaded_bytes),
            total_bytes: counter(p.total_bytes),
            total_bytes_estimate: counter(p.total_bytes_estimate),
            fragment_index: counter(p.fragment_index),
            fragment_count: counter(p.fragment_count),
            speed: p.speed.filter(|s| s.is_finite()),
            speed_str: p.speed_str,
            eta_str: p.eta_str,
        }
    }
}

/// One classified stdout line of a download run.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputLine {
    Progress(RawProgress),
    File(PathBuf),
    Other,
}

/// Classifies a stdout line of a download run.
pub fn parse_output_line(line: &str) -> OutputLine {
    let line = line.trim_end_matches(['\r', '\n']);

    if let Some(json) = line.strip_prefix(PROGRESS_PREFIX) {
        return match serde_json::from_str::<ProgressJson>(json) {
            Ok(progress) => OutputLine::Progress(progress.into()),
            Err(_) => OutputLine::Other,
        };
    }

    match line.strip_prefix(FILE_PREFIX).map(str::trim) {
        Some(path) if !path.is_empty() => OutputLine::File(PathBuf::from(path)),
        _ => OutputLine::Other,
    }
}

/// Collects the `ERROR:` lines of yt-dlp's stderr into one message.
pub(crate) fn error_message(stderr: &[String]) -> Option<String> {
    let errors: Vec<&str> = stderr
        .iter()
        .filter_map(|line| line.trim().strip_prefix("ERROR:"))
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    if errors.is_empty() {
        None
    } else {
        Some(errors.join("; "))
    }
}
