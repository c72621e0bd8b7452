//! Metadata types returned by extraction backends.

use serde::{Deserialize, Serialize};

/// Whether a URL points at one item or at a collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    #[default]
    Video,
    Playlist,
}

/// One entry of a resolved playlist.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaylistEntry {
    /// Backend identifier; may be empty if the backend reported none.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    /// Direct URL, which some backends report as a bare id.
    #[serde(default)]
    pub url: Option<String>,
    /// Full page URL.
    #[serde(default)]
    pub webpage_url: Option<String>,
}

/// Metadata for a URL, resolved without downloading anything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaMetadata {
    pub kind: MediaKind,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub duration_secs: Option<f64>,
    #[serde(default)]
    pub webpage_url: Option<String>,
    /// Ordered entries; empty for single items. Unavailable entries are `None`.
    #[serde(default)]
    pub entries: Vec<Option<PlaylistEntry>>,
}

impl MediaMetadata {
    pub fn is_playlist(&self) -> bool {
        self.kind == MediaKind::Playlist
    }
}

/// Returned by a service progress sink to continue or stop a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressControl {
    Continue,
    /// Stop as soon as possible and fail with [`ServiceErrorCode::Aborted`].
    ///
    /// [`ServiceErrorCode::Aborted`]: super::ServiceErrorCode::Aborted
    Abort,
}
