use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::sanitize::sanitize_title;
use crate::format::FormatSpec;

/// Collaborator placeholder for the item title.
const TITLE_FIELD: &str = "%(title)s";
/// Collaborator placeholder for the item extension.
const EXT_FIELD: &str = "%(ext)s";
/// Collaborator placeholder for its own zero-padded playlist index.
const PLAYLIST_INDEX_FIELD: &str = "%(playlist_index)03d";

/// Full configuration for one extraction + transcode request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobOptions {
    /// URL of the item to download.
    pub source_url: String,
    /// Base output directory.
    pub output_dir: PathBuf,
    /// Target audio format.
    pub format: FormatSpec,
    /// Sanitized playlist title; when set, output goes into a subdirectory.
    pub playlist_title: Option<String>,
    /// 1-based position in the playlist. Overrides the collaborator's index.
    pub playlist_index: Option<u32>,
    /// Transcoder executable to hand to the extraction service.
    pub binary_location: Option<PathBuf>,
}

impl JobOptions {
    /// Directory the output file lands in.
    pub fn target_dir(&self) -> PathBuf {
        match &self.playlist_title {
            Some(title) => self.output_dir.join(title),
            None => self.output_dir.clone(),
        }
    }

    /// Output template for the extraction service.
    ///
    /// The title and extension stay as collaborator placeholders. In playlist
    /// mode the file name is prefixed with the three-digit index, taken from
    /// `playlist_index` when known.
    pub fn output_template(&self) -> PathBuf {
        let file_name = match (&self.playlist_title, self.playlist_index) {
            (Some(_), Some(index)) => format!("{:03} - {}.{}", index, TITLE_FIELD, EXT_FIELD),
            (Some(_), None) => format!("{} - {}.{}", PLAYLIST_INDEX_FIELD, TITLE_FIELD, EXT_FIELD),
            (None, _) => format!("{}.{}", TITLE_FIELD, EXT_FIELD),
        };
        self.target_dir().join(file_name)
    }

    /// Concrete output path for an item whose title is known.
    ///
    /// `collaborator_index` is only used in playlist mode when no
    /// `playlist_index` was set.
    pub fn output_path(&self, title: &str, collaborator_index: Option<u32>) -> PathBuf {
        let title = sanitize_title(title);
        let ext = self.format.extension();

        let file_name = match &self.playlist_title {
            Some(_) => match self.playlist_index.or(collaborator_index) {
                Some(index) => format!("{:03} - {}.{}", index, title, ext),
                None => format!("{}.{}", title, ext),
            },
            None => format!("{}.{}", title, ext),
        };
        self.target_dir().join(file_name)
    }

    /// Whether this job belongs to a playlist.
    pub fn is_playlist_item(&self) -> bool {
        self.playlist_title.is_some()
    }

    /// The transcoder location, if one was supplied.
    pub fn binary_location(&self) -> Option<&Path> {
        self.binary_location.as_deref()
    }
}
