//! Body of one spawned job task.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use super::events::{EventsObserver, JobEvents};
use super::WorkerMap;
use crate::batch::{BatchConfig, BatchCoordinator, BatchSummary};
use crate::gateway::ExtractionGateway;
use crate::job::{DownloadResult, JobOrchestrator, RetryConfig, CANCELLED_MESSAGE};
use crate::metrics;
use crate::options::JobOptions;
use crate::progress::{ProgressAggregator, ProgressConfig};
use crate::registry::{JobHandle, JobKind, JobRegistry};

#[derive(Debug, Clone, Default)]
pub(super) struct WorkerSettings {
    pub progress: ProgressConfig,
    pub retry: RetryConfig,
    pub batch: BatchConfig,
}

/// Final report of a worker, delivered once the job is unregistered.
enum Outcome {
    Single(DownloadResult),
    Batch(Vec<DownloadResult>),
}

pub(super) struct Worker {
    pub handle: JobHandle,
    pub gateway: Arc<dyn ExtractionGateway>,
    pub registry: Arc<JobRegistry>,
    pub workers: WorkerMap,
    pub settings: WorkerSettings,
    pub options: JobOptions,
    pub events: Arc<dyn JobEvents>,
}

impl Worker {
    pub async fn run(self) {
        let started = Instant::now();
        let id = self.handle.id;
        let kind = self.handle.kind;
        let observer = EventsObserver {
            job: id,
            events: Arc::clone(&self.events),
        };
        let mut aggregator = ProgressAggregator::new(self.settings.progress.clone());

        let outcome = match kind {
            JobKind::Single => {
                let mut job = JobOrchestrator::new(
                    Arc::clone(&self.gateway),
                    self.options.clone(),
                    self.handle.cancel_flag.clone(),
                )
                .with_retry(self.settings.retry.clone());
                Outcome::Single(job.run(&mut aggregator, &observer).await)
            }
            JobKind::Batch => {
                let coordinator = BatchCoordinator::new(
                    Arc::clone(&self.gateway),
                    self.handle.cancel_flag.clone(),
                )
                .with_retry(self.settings.retry.clone())
                .with_config(self.settings.batch.clone());
                Outcome::Batch(
                    coordinator
                        .run_batch(&self.handle.source_url, &self.options, &mut aggregator, &observer)
                        .await,
                )
            }
        };

        // The grace-period watchdog may already have taken the job over.
        if self.registry.unregister(id).await.is_none() {
            debug!(job_id = %id, "job was aborted, dropping final report");
            return;
        }
        self.workers.lock().await.remove(&id);

        metrics::JOB_DURATION
            .with_label_values(&[kind.as_str()])
            .observe(started.elapsed().as_secs_f64());

        match outcome {
            Outcome::Single(result) => self.report_single(result),
            Outcome::Batch(results) => self.report_batch(results),
        }
    }

    fn report_single(&self, result: DownloadResult) {
        let id = self.handle.id;
        finish_metric(JobKind::Single, &result);

        match result.file_path() {
            Some(path) if result.is_success() => {
                info!(job_id = %id, path = %path.display(), "job finished");
                self.events.on_finished(id, path);
            }
            _ => {
                let message = result.error_message().unwrap_or(CANCELLED_MESSAGE);
                info!(job_id = %id, error = message, "job ended without a file");
                self.events.on_error(id, message);
            }
        }
    }

    fn report_batch(&self, results: Vec<DownloadResult>) {
        let id = self.handle.id;
        let summary = BatchSummary::from_results(&results);
        let result_label = if summary.was_cancelled() {
            "cancelled"
        } else if summary.succeeded > 0 {
            "success"
        } else {
            "failed"
        };
        metrics::JOBS_FINISHED
            .with_label_values(&[JobKind::Batch.as_str(), result_label])
            .inc();

        self.events.on_status(id, &summary.status_line());
        self.events.on_batch_complete(id, &results);

        if summary.succeeded > 0 && !summary.was_cancelled() {
            let dir = playlist_dir(&results).unwrap_or_else(|| self.options.output_dir.clone());
            info!(job_id = %id, succeeded = summary.succeeded, total = summary.total, "batch finished");
            self.events.on_finished(id, &dir);
        } else {
            let message = if summary.was_cancelled() {
                CANCELLED_MESSAGE.to_string()
            } else if let [only] = results.as_slice() {
                only.error_message().unwrap_or("Playlist download failed").to_string()
            } else {
                format!("No items were downloaded ({} failed)", summary.failed)
            };
            info!(job_id = %id, error = %message, "batch ended without a complete download");
            self.events.on_error(id, &message);
        }
    }
}

fn finish_metric(kind: JobKind, result: &DownloadResult) {
    let label = if result.is_success() {
        "success"
    } else if result.is_cancelled() {
        "cancelled"
    } else {
        "failed"
    };
    metrics::JOBS_FINISHED
        .with_label_values(&[kind.as_str(), label])
        .inc();
}

/// Directory holding the downloaded items.
fn playlist_dir(results: &[DownloadResult]) -> Option<PathBuf> {
    results
        .iter()
        .filter_map(|r| r.file_path())
        .find_map(|p| p.parent())
        .map(|p| p.to_path_buf())
}
