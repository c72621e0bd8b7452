//! Latest known status of every job started through the API.
//!
//! The board is the server's [`JobEvents`] sink: it folds every callback into
//! a [`JobRecord`] and forwards it to the WebSocket broadcaster. Finished
//! records are kept for a while so clients can still query the outcome.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;

use tonegrab_core::{
    BatchSummary, DownloadResult, JobEvents, JobHandle, JobId, JobKind, JobState,
    ProgressSnapshot, CANCELLED_MESSAGE,
};

use crate::api::WsBroadcaster;

/// Finished records retained by default.
pub const DEFAULT_RETAINED_JOBS: usize = 100;

/// The playlist item a batch job is working on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentItem {
    pub index: usize,
    pub total: usize,
    pub title: String,
}

/// Snapshot of one job as reported over the API.
#[derive(Debug, Clone, Serialize)]
pub struct JobRecord {
    pub id: JobId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<JobKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    pub active: bool,
    pub cancel_requested: bool,
    pub state: JobState,
    pub percent: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_item: Option<CurrentItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch: Option<BatchSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    fn new(id: JobId) -> Self {
        Self {
            id,
            kind: None,
            source_url: None,
            started_at: None,
            active: true,
            cancel_requested: false,
            state: JobState::Queued,
            percent: 0,
            status: None,
            current_item: None,
            file_path: None,
            error: None,
            batch: None,
            finished_at: None,
        }
    }
}

#[derive(Default)]
struct BoardInner {
    records: HashMap<JobId, JobRecord>,
    /// Retained finished ids, oldest first.
    finished: VecDeque<JobId>,
    /// Every id that reached a terminal event, pruned or not.
    closed: HashSet<JobId>,
}

impl BoardInner {
    /// The record of a job that is still running, created on first sight.
    fn open(&mut self, id: JobId) -> Option<&mut JobRecord> {
        if self.closed.contains(&id) {
            return None;
        }
        Some(self.records.entry(id).or_insert_with(|| JobRecord::new(id)))
    }

    fn finish(&mut self, id: JobId, retain: usize) {
        self.closed.insert(id);
        self.finished.push_back(id);
        while self.finished.len() > retain {
            if let Some(oldest) = self.finished.pop_front() {
                self.records.remove(&oldest);
            }
        }
    }
}

pub struct JobBoard {
    inner: Mutex<BoardInner>,
    broadcaster: WsBroadcaster,
    retain: usize,
}

impl JobBoard {
    pub fn new(broadcaster: WsBroadcaster) -> Self {
        Self {
            inner: Mutex::new(BoardInner::default()),
            broadcaster,
            retain: DEFAULT_RETAINED_JOBS,
        }
    }

    /// Sets how many finished records are kept.
    pub fn with_retain(mut self, retain: usize) -> Self {
        self.retain = retain;
        self
    }

    fn lock(&self) -> MutexGuard<'_, BoardInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Records a freshly started job and announces it.
    ///
    /// Events for the job may already have arrived, so existing fields are kept.
    pub fn track(&self, handle: &JobHandle) -> JobRecord {
        let record = {
            let mut inner = self.lock();
            let pruned = inner.closed.contains(&handle.id) && !inner.records.contains_key(&handle.id);
            let mut detached = JobRecord::new(handle.id);
            let record = if pruned {
                detached.active = false;
                &mut detached
            } else {
                inner
                    .records
                    .entry(handle.id)
                    .or_insert_with(|| JobRecord::new(handle.id))
            };
            record.kind = Some(handle.kind);
            record.source_url = Some(handle.source_url.clone());
            record.started_at = Some(handle.started_at);
            record.clone()
        };
        self.broadcaster
            .job_started(handle.id, handle.kind, &handle.source_url);
        record
    }

    /// Flags a running job as asked to cancel.
    pub fn mark_cancel_requested(&self, id: JobId) {
        let mut inner = self.lock();
        if let Some(record) = inner.records.get_mut(&id) {
            if record.active {
                record.cancel_requested = true;
            }
        }
    }

    pub fn get(&self, id: JobId) -> Option<JobRecord> {
        self.lock().records.get(&id).cloned()
    }

    /// Every known record, active and finished, by id.
    pub fn list(&self) -> Vec<JobRecord> {
        let mut records: Vec<_> = self.lock().records.values().cloned().collect();
        records.sort_by_key(|r| r.id);
        records
    }

    /// Applies a non-terminal event. Late events for finished jobs are dropped.
    fn update(&self, id: JobId, apply: impl FnOnce(&mut JobRecord)) {
        let mut inner = self.lock();
        if let Some(record) = inner.open(id).filter(|r| r.active) {
            apply(record);
        }
    }

    fn complete(&self, id: JobId, apply: impl FnOnce(&mut JobRecord)) {
        let mut inner = self.lock();
        let Some(record) = inner.open(id).filter(|r| r.active) else {
            return;
        };
        apply(record);
        record.active = false;
        record.current_item = None;
        record.finished_at = Some(Utc::now());
        inner.finish(id, self.retain);
    }
}

impl JobEvents for JobBoard {
    fn on_progress(&self, job: JobId, snapshot: &ProgressSnapshot) {
        self.update(job, |r| r.percent = snapshot.percent);
        self.broadcaster.progress(job, snapshot);
    }

    fn on_status(&self, job: JobId, status: &str) {
        self.update(job, |r| r.status = Some(status.to_string()));
        self.broadcaster.status(job, status);
    }

    fn on_state(&self, job: JobId, state: JobState) {
        self.update(job, |r| r.state = state);
        self.broadcaster.state(job, state);
    }

    fn on_item_start(&self, job: JobId, index: usize, total: usize, title: &str) {
        self.update(job, |r| {
            r.percent = 0;
            r.current_item = Some(CurrentItem {
                index,
                total,
                title: title.to_string(),
            });
        });
        self.broadcaster.item_started(job, index, total, title);
    }

    fn on_finished(&self, job: JobId, path: &Path) {
        let path = path.display().to_string();
        self.complete(job, |r| {
            r.state = JobState::Completed;
            r.percent = 100;
            r.file_path = Some(path.clone());
        });
        self.broadcaster.finished(job, &path);
    }

    fn on_error(&self, job: JobId, message: &str) {
        self.complete(job, |r| {
            r.state = if message == CANCELLED_MESSAGE {
                JobState::Cancelled
            } else {
                JobState::Failed
            };
            r.error = Some(message.to_string());
        });
        self.broadcaster.error(job, message);
    }

    fn on_batch_complete(&self, job: JobId, results: &[DownloadResult]) {
        let summary = BatchSummary::from_results(results);
        self.update(job, |r| r.batch = Some(summary));
        self.broadcaster.batch_complete(job, summary);
    }
}
