//! Registry of in-flight jobs.
//!
//! Every top-level job (single or batch) is registered while it runs. The
//! registry hands out monotonic ids and a fresh [`CancelFlag`] per job, and
//! lets callers cancel one or all jobs.

mod types;

pub use types::{CancelFlag, JobHandle, JobId, JobKind};

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Concurrently running jobs by id.
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<JobId, JobHandle>>,
    next_id: AtomicU64,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new job and returns its handle.
    pub async fn register(&self, kind: JobKind, source_url: impl Into<String>) -> JobHandle {
        let id = JobId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let handle = JobHandle {
            id,
            kind,
            source_url: source_url.into(),
            started_at: Utc::now(),
            cancel_flag: CancelFlag::new(),
        };

        self.jobs.write().await.insert(id, handle.clone());
        debug!(job_id = %id, kind = %kind, "registered job");
        handle
    }

    /// Sets the cancel flag of a live job. Returns `false` if `id` is unknown.
    ///
    /// Cancelling an already-cancelled job is a no-op that still returns `true`.
    pub async fn cancel(&self, id: JobId) -> bool {
        match self.jobs.read().await.get(&id) {
            Some(handle) => {
                if !handle.cancel_flag.is_cancelled() {
                    info!(job_id = %id, "cancel requested");
                }
                handle.cancel_flag.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancels every live job and returns how many were signalled.
    pub async fn cancel_all(&self) -> usize {
        let jobs = self.jobs.read().await;
        for handle in jobs.values() {
            handle.cancel_flag.cancel();
        }
        if !jobs.is_empty() {
            info!(count = jobs.len(), "cancel requested for all jobs");
        }
        jobs.len()
    }

    /// Removes a job. Returns the handle if it was registered.
    pub async fn unregister(&self, id: JobId) -> Option<JobHandle> {
        let removed = self.jobs.write().await.remove(&id);
        if removed.is_some() {
            debug!(job_id = %id, "unregistered job");
        }
        removed
    }

    pub async fn get(&self, id: JobId) -> Option<JobHandle> {
        self.jobs.read().await.get(&id).cloned()
    }

    pub async fn contains(&self, id: JobId) -> bool {
        self.jobs.read().await.contains_key(&id)
    }

    /// Live jobs, oldest first.
    pub async fn list(&self) -> Vec<JobHandle> {
        let mut jobs: Vec<_> = self.jobs.read().await.values().cloned().collect();
        jobs.sort_by_key(|h| h.id);
        jobs
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}
