//! Error taxonomy at the extraction boundary.

use std::fmt;
use thiserror::Error;

/// Structured failure code a backend may attach to a [`ServiceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceErrorCode {
    /// Downloaded data could not be decoded or transcoded.
    CorruptOutput,
    /// The media prober failed to analyze the download.
    ProbeFailed,
    /// The transfer stopped because the progress sink asked it to.
    Aborted,
}

/// Raw failure reported by an extraction backend.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ServiceError {
    pub message: String,
    pub code: Option<ServiceErrorCode>,
}

impl ServiceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    pub fn with_code(message: impl Into<String>, code: ServiceErrorCode) -> Self {
        Self {
            message: message.into(),
            code: Some(code),
        }
    }

    /// The error a backend returns after honoring [`ProgressControl::Abort`].
    ///
    /// [`ProgressControl::Abort`]: super::ProgressControl::Abort
    pub fn aborted() -> Self {
        Self::with_code("download cancelled", ServiceErrorCode::Aborted)
    }

    pub fn is_aborted(&self) -> bool {
        self.code == Some(ServiceErrorCode::Aborted)
    }
}

/// Metadata resolution failed. Never retried.
#[derive(Debug, Clone, Error)]
pub enum InfoError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("{0}")]
    Service(String),
}

/// Class of a failed transfer or transcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadErrorKind {
    /// The source data is corrupt or incomplete.
    CorruptSource,
    /// The prober could not analyze the download; usually transient.
    ProbeFailure,
    Unknown,
}

impl DownloadErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CorruptSource => "corrupt_source",
            Self::ProbeFailure => "probe_failure",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DownloadErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified download failure.
#[derive(Debug, Clone, Error)]
pub struct DownloadError {
    pub kind: DownloadErrorKind,
    /// Backend message the classification was derived from.
    pub detail: String,
}

impl DownloadError {
    pub fn new(kind: DownloadErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for DownloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DownloadErrorKind::CorruptSource => write!(
                f,
                "Audio conversion failed. The downloaded file may be corrupted or incomplete."
            ),
            DownloadErrorKind::ProbeFailure => write!(
                f,
                "Failed to analyze audio file. This might be a temporary issue with the source."
            ),
            DownloadErrorKind::Unknown => write!(f, "Download failed: {}", self.detail),
        }
    }
}

/// Outcome of a failed `execute`.
#[derive(Debug, Clone, Error)]
pub enum ExecuteError {
    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error("download cancelled")]
    Cancelled,
}

const CORRUPT_SIGNATURES: &[&str] = &[
    "invalid data found",
    "error opening input",
    "invalid input data",
    "corrupt",
];

const PROBE_SIGNATURES: &[&str] = &["unable to obtain file audio codec", "ffprobe", "probe"];

/// Maps a backend error onto the download taxonomy.
///
/// A structured code wins; otherwise the message is matched
/// case-insensitively against known signatures, corrupt-output first.
pub fn classify_service_error(error: &ServiceError) -> DownloadErrorKind {
    match error.code {
        Some(ServiceErrorCode::CorruptOutput) => return DownloadErrorKind::CorruptSource,
        Some(ServiceErrorCode::ProbeFailed) => return DownloadErrorKind::ProbeFailure,
        Some(ServiceErrorCode::Aborted) | None => {}
    }

    let message = error.message.to_lowercase();
    if CORRUPT_SIGNATURES.iter().any(|s| message.contains(s)) {
        DownloadErrorKind::CorruptSource
    } else if PROBE_SIGNATURES.iter().any(|s| message.contains(s)) {
        DownloadErrorKind::ProbeFailure
    } else {
        DownloadErrorKind::Unknown
    }
}
