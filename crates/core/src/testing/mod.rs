//! Testing utilities and mock implementations.
//!
//! This module provides a scriptable [`MockExtractionService`] and a
//! [`RecordingEvents`] sink, allowing full job lifecycle tests without
//! yt-dlp or network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use tonegrab_core::testing::{fixtures, MockExtractionService, RecordingEvents};
//!
//! let service = MockExtractionService::new();
//! service.set_metadata(url, fixtures::playlist_metadata(url, "Mix", 3)).await;
//! service.push_error(ServiceError::new("Invalid data found")).await;
//!
//! let events = Arc::new(RecordingEvents::new());
//! manager.start_batch(url, "mp3", "192", events.clone()).await;
//! events.wait_for_terminal(Duration::from_secs(5)).await;
//! ```

mod mock_service;
mod recording;

pub use mock_service::{MockExtractionService, MockOutcome};
pub use recording::{RecordedEvent, RecordingEvents};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::gateway::{MediaKind, MediaMetadata, PlaylistEntry};
    use crate::progress::RawProgress;

    /// Create single-video metadata with reasonable defaults (3:05 long).
    pub fn video_metadata(url: &str, title: &str) -> MediaMetadata {
        MediaMetadata {
            kind: MediaKind::Video,
            id: format!("vid-{}", title.to_lowercase().replace(' ', "-")),
            title: Some(title.to_string()),
            uploader: Some("Test Uploader".to_string()),
            duration_secs: Some(185.0),
            webpage_url: Some(url.to_string()),
            entries: Vec::new(),
        }
    }

    /// Create playlist metadata with `count` entries titled `Song 1..=count`.
    pub fn playlist_metadata(url: &str, title: &str, count: usize) -> MediaMetadata {
        MediaMetadata {
            kind: MediaKind::Playlist,
            id: format!("pl-{}", title.to_lowercase().replace(' ', "-")),
            title: Some(title.to_string()),
            uploader: Some("Test Curator".to_string()),
            duration_secs: None,
            webpage_url: Some(url.to_string()),
            entries: (1..=count).map(|i| Some(playlist_entry(i))).collect(),
        }
    }

    /// Entry `i` of a fixture playlist.
    pub fn playlist_entry(i: usize) -> PlaylistEntry {
        PlaylistEntry {
            id: format!("item{}", i),
            title: Some(format!("Song {}", i)),
            url: Some(format!("https://www.youtube.com/watch?v=item{}", i)),
            webpage_url: None,
        }
    }

    /// URL of entry `i` of a fixture playlist.
    pub fn entry_url(i: usize) -> String {
        format!("https://www.youtube.com/watch?v=item{}", i)
    }

    /// A byte-counter progress script of `steps` events followed by `finished`.
    pub fn progress_script(steps: u64) -> Vec<RawProgress> {
        let total = 10 * 1024 * 1024;
        let mut script: Vec<RawProgress> = (1..=steps)
            .map(|i| RawProgress::bytes(total * i / steps.max(1), Some(total)).with_speed(1024.0 * 1024.0))
            .collect();
        script.push(RawProgress::finished());
        script
    }
}
