use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Message carried by every cancelled result.
pub const CANCELLED_MESSAGE: &str = "Download cancelled by user";

/// State of one job. Only the orchestrator driving the job changes it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    #[default]
    Queued,
    FetchingInfo,
    Downloading,
    Converting,
    Completed,
    Failed,
    Cancelled,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::FetchingInfo => "fetching_info",
            Self::Downloading => "downloading",
            Self::Converting => "converting",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Terminal outcome of one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadResult {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
}

impl DownloadResult {
    pub fn success(path: impl Into<PathBuf>) -> Self {
        Self {
            success: true,
            file_path: Some(path.into()),
            error_message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            file_path: None,
            error_message: Some(message.into()),
        }
    }

    pub fn cancelled() -> Self {
        Self::failure(CANCELLED_MESSAGE)
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn is_cancelled(&self) -> bool {
        !self.success && self.error_message.as_deref() == Some(CANCELLED_MESSAGE)
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(JobState::Completed.is_terminal());
        assert!(JobState::Failed.is_terminal());
        assert!(JobState::Cancelled.is_terminal());
        assert!(!JobState::Queued.is_terminal());
        assert!(!JobState::Converting.is_terminal());
    }

    #[test]
    fn test_result_constructors() {
        let ok = DownloadResult::success("/music/a.mp3");
        assert!(ok.is_success());
        assert_eq!(ok.file_path(), Some(Path::new("/music/a.mp3")));
        assert!(ok.error_message().is_none());

        let failed = DownloadResult::failure("boom");
        assert!(!failed.is_success());
        assert!(!failed.is_cancelled());
        assert_eq!(failed.error_message(), Some("boom"));

        let cancelled = DownloadResult::cancelled();
        assert!(cancelled.is_cancelled());
        assert_eq!(cancelled.error_message(), Some(CANCELLED_MESSAGE));
    }

    #[test]
    fn test_result_serialization() {
        let json = serde_json::to_value(DownloadResult::failure("boom")).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error_message"], "boom");
        assert!(json.get("file_path").is_none());
    }
}
