//! Trait definitions for extraction backends and the gateway.

use async_trait::async_trait;
use std::path::PathBuf;

use super::error::{ExecuteError, InfoError, ServiceError};
use super::types::{MediaMetadata, ProgressControl};
use crate::options::JobOptions;
use crate::progress::RawProgress;
use crate::registry::CancelFlag;

/// Progress sink handed to a service. Returning [`ProgressControl::Abort`]
/// asks the service to stop the transfer.
pub type ServiceProgressSink<'a> = &'a (dyn Fn(&RawProgress) -> ProgressControl + Send + Sync);

/// Progress callback handed to a gateway.
pub type ProgressCallback<'a> = &'a (dyn Fn(&RawProgress) + Send + Sync);

/// An external component that resolves URLs and performs transfer + transcode.
#[async_trait]
pub trait ExtractionService: Send + Sync {
    /// Name of this backend (for logging).
    fn name(&self) -> &str;

    /// Resolves metadata for `url` without writing any files.
    async fn resolve_info(&self, url: &str) -> Result<MediaMetadata, ServiceError>;

    /// Downloads and transcodes according to `options`, reporting raw
    /// progress to `sink`. Returns the path of the produced file.
    ///
    /// When `sink` returns [`ProgressControl::Abort`] the service must stop
    /// and return [`ServiceError::aborted`].
    async fn execute(
        &self,
        options: &JobOptions,
        sink: ServiceProgressSink<'_>,
    ) -> Result<PathBuf, ServiceError>;
}

/// What the orchestrator calls to resolve and execute jobs.
#[async_trait]
pub trait ExtractionGateway: Send + Sync {
    /// Resolves metadata for `url`. Has no side effects.
    async fn resolve_info(&self, url: &str) -> Result<MediaMetadata, InfoError>;

    /// Executes one download.
    ///
    /// `cancel` is checked inside the progress callback; once it is observed
    /// set, the transfer is stopped and [`ExecuteError::Cancelled`] returned.
    async fn execute(
        &self,
        options: &JobOptions,
        cancel: &CancelFlag,
        on_progress: ProgressCallback<'_>,
    ) -> Result<PathBuf, ExecuteError>;
}
