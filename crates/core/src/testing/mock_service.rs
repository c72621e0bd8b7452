//! Mock extraction service for testing.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use super::fixtures;
use crate::gateway::{
    ExtractionService, MediaMetadata, ProgressControl, ServiceError, ServiceProgressSink,
};
use crate::options::JobOptions;
use crate::progress::RawProgress;

/// Scripted result of one `execute` call.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Succeed with this path.
    Success(PathBuf),
    /// Fail with this error.
    Error(ServiceError),
    /// Never return and never report progress, ignoring cancellation.
    Stall,
}

/// Mock implementation of the ExtractionService trait.
///
/// Provides controllable behavior for testing:
/// - Per-URL metadata and metadata errors
/// - Queued execute outcomes (success, error, stall)
/// - Queued progress scripts with an optional delay between events
/// - Recorded calls for assertions
///
/// Clones share all state, so a test can keep one clone for assertions and
/// hand the other to a gateway. Unknown URLs resolve to a single video and
/// executes without a queued outcome succeed at the job's output path.
#[derive(Debug, Clone, Default)]
pub struct MockExtractionService {
    metadata: Arc<RwLock<HashMap<String, MediaMetadata>>>,
    info_errors: Arc<RwLock<HashMap<String, String>>>,
    outcomes: Arc<RwLock<VecDeque<MockOutcome>>>,
    progress_scripts: Arc<RwLock<VecDeque<Vec<RawProgress>>>>,
    default_progress: Arc<RwLock<Vec<RawProgress>>>,
    step_delay_ms: Arc<RwLock<u64>>,
    resolve_calls: Arc<RwLock<Vec<String>>>,
    executions: Arc<RwLock<Vec<JobOptions>>>,
}

impl MockExtractionService {
    /// Create a new mock service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Metadata returned for `url`.
    pub async fn set_metadata(&self, url: &str, metadata: MediaMetadata) {
        self.metadata.write().await.insert(url.to_string(), metadata);
    }

    /// Make `resolve_info(url)` fail with `message`.
    pub async fn set_info_error(&self, url: &str, message: &str) {
        self.info_errors
            .write()
            .await
            .insert(url.to_string(), message.to_string());
    }

    pub async fn push_outcome(&self, outcome: MockOutcome) {
        self.outcomes.write().await.push_back(outcome);
    }

    pub async fn push_success(&self, path: impl Into<PathBuf>) {
        self.push_outcome(MockOutcome::Success(path.into())).await;
    }

    pub async fn push_error(&self, error: ServiceError) {
        self.push_outcome(MockOutcome::Error(error)).await;
    }

    /// Progress events for the next execute call.
    pub async fn push_progress_script(&self, script: Vec<RawProgress>) {
        self.progress_scripts.write().await.push_back(script);
    }

    /// Progress events for execute calls without a queued script.
    pub async fn set_default_progress(&self, script: Vec<RawProgress>) {
        *self.default_progress.write().await = script;
    }

    /// Delay before each progress event.
    pub async fn set_step_delay(&self, delay: Duration) {
        *self.step_delay_ms.write().await = delay.as_millis() as u64;
    }

    pub async fn resolve_count(&self) -> usize {
        self.resolve_calls.read().await.len()
    }

    pub async fn execute_count(&self) -> usize {
        self.executions.read().await.len()
    }

    /// Options of every execute call, in order.
    pub async fn recorded_executions(&self) -> Vec<JobOptions> {
        self.executions.read().await.clone()
    }

    /// Source URLs of every execute call, in order.
    pub async fn executed_urls(&self) -> Vec<String> {
        self.executions
            .read()
            .await
            .iter()
            .map(|o| o.source_url.clone())
            .collect()
    }

    async fn metadata_for(&self, url: &str) -> MediaMetadata {
        self.metadata
            .read()
            .await
            .get(url)
            .cloned()
            .unwrap_or_else(|| fixtures::video_metadata(url, "Test Video"))
    }
}

#[async_trait]
impl ExtractionService for MockExtractionService {
    fn name(&self) -> &str {
        "mock"
    }

    async fn resolve_info(&self, url: &str) -> Result<MediaMetadata, ServiceError> {
        self.resolve_calls.write().await.push(url.to_string());

        if let Some(message) = self.info_errors.read().await.get(url) {
            return Err(ServiceError::new(message.clone()));
        }
        Ok(self.metadata_for(url).await)
    }

    async fn execute(
        &self,
        options: &JobOptions,
        sink: ServiceProgressSink<'_>,
    ) -> Result<PathBuf, ServiceError> {
        self.executions.write().await.push(options.clone());

        let script = match self.progress_scripts.write().await.pop_front() {
            Some(script) => script,
            None => self.default_progress.read().await.clone(),
        };
        let delay = Duration::from_millis(*self.step_delay_ms.read().await);

        for raw in &script {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if sink(raw) == ProgressControl::Abort {
                return Err(ServiceError::aborted());
            }
        }

        let outcome = self.outcomes.write().await.pop_front();
        match outcome {
            Some(MockOutcome::Success(path)) => Ok(path),
            Some(MockOutcome::Error(error)) => Err(error),
            Some(MockOutcome::Stall) => std::future::pending().await,
            None => {
                let title = self
                    .metadata_for(&options.source_url)
                    .await
                    .title
                    .unwrap_or_else(|| "Test Video".to_string());
                Ok(options.output_path(&title, None))
            }
        }
    }
}
