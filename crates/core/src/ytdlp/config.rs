//! Configuration for the yt-dlp service.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YtDlpConfig {
    /// Path to the yt-dlp binary.
    #[serde(default = "default_binary")]
    pub binary: PathBuf,

    /// Transcoder location used when the job does not supply one.
    #[serde(default)]
    pub ffmpeg_location: Option<PathBuf>,

    /// Network socket timeout in seconds. 0 leaves yt-dlp's default.
    #[serde(default = "default_socket_timeout")]
    pub socket_timeout_secs: u64,

    /// Additional arguments appended before the URL.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_binary() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_socket_timeout() -> u64 {
    30
}

impl Default for YtDlpConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            ffmpeg_location: None,
            socket_timeout_secs: default_socket_timeout(),
            extra_args: Vec::new(),
        }
    }
}

impl YtDlpConfig {
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }
}
