//! Single-job state machine and retry policy.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use super::config::RetryConfig;
use super::observer::JobObserver;
use super::types::{DownloadResult, JobState};
use crate::gateway::{ExecuteError, ExtractionGateway, MediaMetadata};
use crate::metrics;
use crate::options::JobOptions;
use crate::progress::{format_duration, ProgressAggregator, ProgressUpdate, RawProgress, RawStatus};
use crate::registry::CancelFlag;

/// Drives one download from metadata lookup to a terminal [`DownloadResult`].
pub struct JobOrchestrator {
    gateway: Arc<dyn ExtractionGateway>,
    options: JobOptions,
    retry: RetryConfig,
    cancel: CancelFlag,
    state: JobState,
}

impl JobOrchestrator {
    pub fn new(gateway: Arc<dyn ExtractionGateway>, options: JobOptions, cancel: CancelFlag) -> Self {
        Self {
            gateway,
            options,
            retry: RetryConfig::default(),
            cancel,
            state: JobState::Queued,
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn options(&self) -> &JobOptions {
        &self.options
    }

    /// Runs the job to completion. Never fails: every outcome, including
    /// cancellation, is a [`DownloadResult`].
    pub async fn run(
        &mut self,
        aggregator: &mut ProgressAggregator,
        observer: &dyn JobObserver,
    ) -> DownloadResult {
        if self.cancel.is_cancelled() {
            return self.cancelled(observer);
        }

        self.transition(JobState::FetchingInfo, observer);
        observer.on_status("Fetching video information...");

        let info = match self.gateway.resolve_info(&self.options.source_url).await {
            Ok(info) => info,
            Err(e) => {
                return self.fail(format!("Failed to fetch video information: {}", e), observer);
            }
        };
        report_info(&info, observer);

        if self.cancel.is_cancelled() {
            return self.cancelled(observer);
        }

        self.transition(JobState::Downloading, observer);
        observer.on_status("Starting download...");

        let mut attempt = 1;
        loop {
            if self.cancel.is_cancelled() {
                return self.cancelled(observer);
            }

            debug!(url = %self.options.source_url, attempt, "starting download attempt");
            let (result, converting) = self.attempt(aggregator, observer).await;
            if converting {
                self.state = JobState::Converting;
            }

            match result {
                Ok(path) => {
                    metrics::DOWNLOAD_ATTEMPTS.with_label_values(&["success"]).inc();
                    if !converting {
                        // The service finished without a transfer-complete event
                        publish(aggregator.observe(&RawProgress::finished()), observer);
                        self.transition(JobState::Converting, observer);
                    }
                    return self.complete(&path, observer);
                }
                Err(ExecuteError::Cancelled) => {
                    metrics::DOWNLOAD_ATTEMPTS.with_label_values(&["cancelled"]).inc();
                    return self.cancelled(observer);
                }
                Err(ExecuteError::Download(e)) => {
                    metrics::DOWNLOAD_ATTEMPTS
                        .with_label_values(&[e.kind.as_str()])
                        .inc();

                    if !self.retry.should_retry(&e, attempt) {
                        return self.fail(e.to_string(), observer);
                    }

                    attempt += 1;
                    metrics::DOWNLOAD_RETRIES.inc();
                    warn!(
                        url = %self.options.source_url,
                        attempt,
                        max_attempts = self.retry.max_attempts,
                        detail = %e.detail,
                        "audio analysis failed, retrying"
                    );
                    observer.on_status(&format!(
                        "Audio analysis failed, retrying (attempt {} of {})...",
                        attempt, self.retry.max_attempts
                    ));
                    if self.state == JobState::Converting {
                        self.transition(JobState::Downloading, observer);
                    }
                    tokio::time::sleep(self.retry.delay()).await;
                }
            }
        }
    }

    /// One gateway call. Also reports whether the transfer reached the
    /// transcode phase.
    async fn attempt(
        &self,
        aggregator: &mut ProgressAggregator,
        observer: &dyn JobObserver,
    ) -> (Result<std::path::PathBuf, ExecuteError>, bool) {
        let aggregator = Mutex::new(aggregator);
        let converting = AtomicBool::new(false);

        let on_progress = |raw: &RawProgress| {
            if raw.status == RawStatus::Finished && !converting.swap(true, Ordering::SeqCst) {
                observer.on_state(JobState::Converting);
            }
            let update = match aggregator.lock() {
                Ok(mut aggregator) => aggregator.observe(raw),
                Err(_) => return,
            };
            publish(update, observer);
        };

        let result = self
            .gateway
            .execute(&self.options, &self.cancel, &on_progress)
            .await;
        (result, converting.load(Ordering::SeqCst))
    }

    fn transition(&mut self, state: JobState, observer: &dyn JobObserver) {
        debug!(url = %self.options.source_url, from = self.state.as_str(), to = state.as_str(), "job state change");
        self.state = state;
        observer.on_state(state);
    }

    fn complete(&mut self, path: &Path, observer: &dyn JobObserver) -> DownloadResult {
        self.transition(JobState::Completed, observer);

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        observer.on_status(&format!("Download completed: {}", file_name));
        info!(url = %self.options.source_url, path = %path.display(), "download completed");

        DownloadResult::success(path)
    }

    fn fail(&mut self, message: String, observer: &dyn JobObserver) -> DownloadResult {
        self.transition(JobState::Failed, observer);
        warn!(url = %self.options.source_url, error = %message, "download failed");
        DownloadResult::failure(message)
    }

    fn cancelled(&mut self, observer: &dyn JobObserver) -> DownloadResult {
        self.transition(JobState::Cancelled, observer);
        info!(url = %self.options.source_url, "download cancelled");
        DownloadResult::cancelled()
    }
}

fn report_info(info: &MediaMetadata, observer: &dyn JobObserver) {
    if let Some(title) = &info.title {
        observer.on_status(&format!("Title: {}", title));
    }
    if let Some(uploader) = &info.uploader {
        observer.on_status(&format!("Uploader: {}", uploader));
    }
    if let Some(duration) = info.duration_secs.filter(|d| *d > 0.0) {
        observer.on_status(&format!("Duration: {}", format_duration(duration)));
    }
}

fn publish(update: ProgressUpdate, observer: &dyn JobObserver) {
    if let Some(snapshot) = &update.snapshot {
        observer.on_progress(snapshot);
    }
    if let Some(status) = &update.status {
        observer.on_status(status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{ServiceError, ServiceGateway};
    use crate::options::OptionsBuilder;
    use crate::progress::ProgressConfig;
    use crate::testing::{fixtures, MockExtractionService, RecordedEvent, RecordingEvents};

    const URL: &str = "https://www.youtube.com/watch?v=abc123";

    fn orchestrator(service: MockExtractionService) -> JobOrchestrator {
        let gateway: Arc<dyn ExtractionGateway> = Arc::new(ServiceGateway::new(service));
        let options = OptionsBuilder::new(URL).output_dir("/music").build();
        JobOrchestrator::new(gateway, options, CancelFlag::new())
            .with_retry(RetryConfig::default().with_delay_ms(0))
    }

    #[tokio::test]
    async fn test_successful_run_reports_info_and_completion() {
        let service = MockExtractionService::new();
        service.set_metadata(URL, fixtures::video_metadata(URL, "Song")).await;
        service.push_success("/music/Song.mp3").await;

        let mut job = orchestrator(service);
        let observer = RecordingEvents::new();
        let mut aggregator = ProgressAggregator::new(ProgressConfig::unthrottled());

        let result = job.run(&mut aggregator, &observer).await;

        assert!(result.is_success());
        assert_eq!(job.state(), JobState::Completed);
        let statuses = observer.statuses();
        assert_eq!(statuses.first().map(String::as_str), Some("Fetching video information..."));
        assert!(statuses.contains(&"Title: Song".to_string()));
        assert!(statuses.contains(&"Duration: 03:05".to_string()));
        assert_eq!(statuses.last().map(String::as_str), Some("Download completed: Song.mp3"));
    }

    #[tokio::test]
    async fn test_info_failure_is_terminal() {
        let service = MockExtractionService::new();
        service.set_info_error(URL, "Video unavailable").await;

        let mut job = orchestrator(service);
        let result = job.run(&mut ProgressAggregator::default(), &RecordingEvents::new()).await;

        assert_eq!(
            result.error_message(),
            Some("Failed to fetch video information: Video unavailable")
        );
        assert_eq!(job.state(), JobState::Failed);
    }

    #[tokio::test]
    async fn test_probe_failure_is_retried_until_exhausted() {
        let service = MockExtractionService::new();
        for _ in 0..3 {
            service
                .push_error(ServiceError::new("Unable to obtain file audio codec with ffprobe"))
                .await;
        }
        let calls = service.clone();

        let mut job = orchestrator(service);
        let observer = RecordingEvents::new();
        let result = job.run(&mut ProgressAggregator::default(), &observer).await;

        assert!(!result.is_success());
        assert!(result.error_message().unwrap().starts_with("Failed to analyze audio file"));
        assert_eq!(calls.execute_count().await, 3);
        assert!(observer
            .statuses()
            .contains(&"Audio analysis failed, retrying (attempt 3 of 3)...".to_string()));
    }

    #[tokio::test]
    async fn test_corrupt_source_is_not_retried() {
        let service = MockExtractionService::new();
        service
            .push_error(ServiceError::new("Invalid data found when processing input"))
            .await;
        let calls = service.clone();

        let mut job = orchestrator(service);
        let result = job.run(&mut ProgressAggregator::default(), &RecordingEvents::new()).await;

        assert!(result.error_message().unwrap().starts_with("Audio conversion failed"));
        assert_eq!(calls.execute_count().await, 1);
    }

    #[tokio::test]
    async fn test_finished_event_moves_to_converting() {
        let service = MockExtractionService::new();
        service
            .push_progress_script(vec![RawProgress::percent("50%"), RawProgress::finished()])
            .await;
        service.push_success("/music/Song.mp3").await;

        let mut job = orchestrator(service);
        let observer = RecordingEvents::new();
        job.run(&mut ProgressAggregator::new(ProgressConfig::unthrottled()), &observer)
            .await;

        let states = observer.states();
        let converting = states.iter().position(|s| *s == JobState::Converting).unwrap();
        let completed = states.iter().position(|s| *s == JobState::Completed).unwrap();
        assert!(converting < completed);
        assert!(observer
            .events()
            .iter()
            .any(|e| matches!(e, RecordedEvent::Progress(s) if s.percent == 100)));
    }

    #[tokio::test]
    async fn test_cancel_before_start() {
        let service = MockExtractionService::new();
        let calls = service.clone();
        let cancel = CancelFlag::new();
        cancel.cancel();

        let gateway: Arc<dyn ExtractionGateway> = Arc::new(ServiceGateway::new(service));
        let mut job = JobOrchestrator::new(gateway, OptionsBuilder::new(URL).build(), cancel);
        let result = job.run(&mut ProgressAggregator::default(), &RecordingEvents::new()).await;

        assert!(result.is_cancelled());
        assert_eq!(job.state(), JobState::Cancelled);
        assert_eq!(calls.resolve_count().await, 0);
    }
}
