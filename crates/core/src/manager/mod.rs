//! Caller-facing job API.
//!
//! [`JobManager`] starts single and batch jobs on their own tokio tasks,
//! tracks them in a [`JobRegistry`](crate::registry::JobRegistry), and
//! reports everything through a caller-supplied [`JobEvents`] sink.
//!
//! Cancellation is cooperative first: the job's flag is set and checked at
//! every checkpoint. If the job is still registered after
//! [`ManagerConfig::cancel_grace_ms`], its task is aborted.

mod config;
mod events;
mod worker;

pub use config::ManagerConfig;
pub use events::{JobEvents, NoopEvents};

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::batch::{BatchConfig, BatchCoordinator};
use crate::config::Config;
use crate::format::FormatSpec;
use crate::gateway::ExtractionGateway;
use crate::job::{RetryConfig, CANCELLED_MESSAGE};
use crate::locator::BinaryLocator;
use crate::metrics;
use crate::options::{JobOptions, OptionsBuilder};
use crate::progress::ProgressConfig;
use crate::registry::{CancelFlag, JobHandle, JobId, JobKind, JobRegistry};
use worker::{Worker, WorkerSettings};

/// Bookkeeping for a spawned worker task.
struct WorkerEntry {
    abort: tokio::task::AbortHandle,
    kind: JobKind,
    events: Arc<dyn JobEvents>,
}

type WorkerMap = Arc<Mutex<HashMap<JobId, WorkerEntry>>>;

pub struct JobManager {
    gateway: Arc<dyn ExtractionGateway>,
    registry: Arc<JobRegistry>,
    locator: Option<Arc<dyn BinaryLocator>>,
    output_dir: PathBuf,
    settings: WorkerSettings,
    config: ManagerConfig,
    workers: WorkerMap,
}

impl JobManager {
    pub fn new(gateway: Arc<dyn ExtractionGateway>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            gateway,
            registry: Arc::new(JobRegistry::new()),
            locator: None,
            output_dir: output_dir.into(),
            settings: WorkerSettings::default(),
            config: ManagerConfig::default(),
            workers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Creates a manager with every setting taken from `config`.
    pub fn from_config(gateway: Arc<dyn ExtractionGateway>, config: &Config) -> Self {
        Self::new(gateway, config.downloads.output_dir.clone())
            .with_progress(config.progress.clone())
            .with_retry(config.retry.clone())
            .with_batch(config.batch.clone())
            .with_config(config.manager.clone())
    }

    pub fn with_locator(mut self, locator: Arc<dyn BinaryLocator>) -> Self {
        self.locator = Some(locator);
        self
    }

    pub fn with_progress(mut self, progress: ProgressConfig) -> Self {
        self.settings.progress = progress;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.settings.retry = retry;
        self
    }

    pub fn with_batch(mut self, batch: BatchConfig) -> Self {
        self.settings.batch = batch;
        self
    }

    pub fn with_config(mut self, config: ManagerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Starts a single-item download.
    pub async fn start_single(
        &self,
        url: &str,
        format_name: &str,
        quality: &str,
        events: Arc<dyn JobEvents>,
    ) -> JobHandle {
        self.spawn(JobKind::Single, url, format_name, quality, events).await
    }

    /// Starts a playlist download.
    pub async fn start_batch(
        &self,
        url: &str,
        format_name: &str,
        quality: &str,
        events: Arc<dyn JobEvents>,
    ) -> JobHandle {
        self.spawn(JobKind::Batch, url, format_name, quality, events).await
    }

    /// Starts a batch if `url` resolves to a collection, a single job otherwise.
    pub async fn start_auto(
        &self,
        url: &str,
        format_name: &str,
        quality: &str,
        events: Arc<dyn JobEvents>,
    ) -> JobHandle {
        let probe = BatchCoordinator::new(Arc::clone(&self.gateway), CancelFlag::new())
            .with_config(self.settings.batch.clone());
        let kind = if probe.is_collection(url).await {
            JobKind::Batch
        } else {
            JobKind::Single
        };
        self.spawn(kind, url, format_name, quality, events).await
    }

    /// Requests cancellation of one job. Returns `false` if it is not running.
    pub async fn cancel(&self, id: JobId) -> bool {
        if !self.registry.cancel(id).await {
            return false;
        }
        self.spawn_watchdog(id);
        true
    }

    /// Requests cancellation of every running job and returns how many were signalled.
    pub async fn cancel_all(&self) -> usize {
        let count = self.registry.cancel_all().await;
        for handle in self.registry.list().await {
            self.spawn_watchdog(handle.id);
        }
        count
    }

    /// Running jobs, oldest first.
    pub async fn active_jobs(&self) -> Vec<JobHandle> {
        self.registry.list().await
    }

    pub async fn get(&self, id: JobId) -> Option<JobHandle> {
        self.registry.get(id).await
    }

    /// Waits until no job is registered, or `timeout` elapses.
    ///
    /// Returns `true` if the manager went idle.
    pub async fn wait_idle(&self, timeout: Duration) -> bool {
        let poll = async {
            while !self.registry.is_empty().await {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        };
        tokio::time::timeout(timeout, poll).await.is_ok()
    }

    /// Cancels everything and waits for workers to stop, including the
    /// grace-period escalation.
    pub async fn shutdown(&self) {
        let count = self.cancel_all().await;
        if count == 0 {
            return;
        }
        info!(count, "waiting for jobs to stop");
        let limit = self.config.cancel_grace() + Duration::from_millis(500);
        if !self.wait_idle(limit).await {
            warn!("jobs still registered after shutdown grace period");
        }
    }

    fn base_options(&self, url: &str, format_name: &str, quality: &str) -> JobOptions {
        OptionsBuilder::new(url.trim())
            .output_dir(self.output_dir.clone())
            .format(FormatSpec::resolve(format_name, quality))
            .binary_location(self.locator.as_ref().and_then(|l| l.locate()))
            .build()
    }

    async fn spawn(
        &self,
        kind: JobKind,
        url: &str,
        format_name: &str,
        quality: &str,
        events: Arc<dyn JobEvents>,
    ) -> JobHandle {
        let handle = self.registry.register(kind, url.trim()).await;
        metrics::JOBS_STARTED.with_label_values(&[kind.as_str()]).inc();

        let options = self.base_options(url, format_name, quality);
        info!(job_id = %handle.id, %kind, url = %handle.source_url, format = %options.format, "starting job");

        let worker = Worker {
            handle: handle.clone(),
            gateway: Arc::clone(&self.gateway),
            registry: Arc::clone(&self.registry),
            workers: Arc::clone(&self.workers),
            settings: self.settings.clone(),
            options,
            events: Arc::clone(&events),
        };

        // The lock is held across spawn so the worker cannot remove its entry
        // before it was inserted.
        let mut workers = self.workers.lock().await;
        let task = tokio::spawn(worker.run());
        workers.insert(
            handle.id,
            WorkerEntry {
                abort: task.abort_handle(),
                kind,
                events,
            },
        );

        handle
    }

    fn spawn_watchdog(&self, id: JobId) {
        let registry = Arc::clone(&self.registry);
        let workers = Arc::clone(&self.workers);
        let grace = self.config.cancel_grace();

        tokio::spawn(async move {
            tokio::time::sleep(grace).await;

            // Whoever unregisters the job first owns its terminal events.
            if registry.unregister(id).await.is_none() {
                return;
            }
            let Some(entry) = workers.lock().await.remove(&id) else {
                return;
            };

            warn!(job_id = %id, grace_ms = grace.as_millis() as u64, "job ignored cancellation, aborting worker");
            entry.abort.abort();
            metrics::JOBS_FINISHED
                .with_label_values(&[entry.kind.as_str(), "aborted"])
                .inc();
            entry.events.on_error(id, CANCELLED_MESSAGE);
        });
    }
}
