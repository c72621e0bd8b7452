//! Event sink that records everything it is told.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::Notify;

use crate::job::{DownloadResult, JobObserver, JobState};
use crate::manager::JobEvents;
use crate::progress::ProgressSnapshot;
use crate::registry::JobId;

#[derive(Debug, Clone, PartialEq)]
pub enum RecordedEvent {
    Progress(ProgressSnapshot),
    Status(String),
    State(JobState),
    ItemStart {
        index: usize,
        total: usize,
        title: String,
    },
    Finished(PathBuf),
    Error(String),
    BatchComplete(Vec<DownloadResult>),
}

impl RecordedEvent {
    /// Whether this event ends a manager job.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished(_) | Self::Error(_))
    }
}

/// Records events from both [`JobObserver`] and [`JobEvents`] callbacks.
///
/// Observer callbacks are recorded without a job id.
#[derive(Debug, Default)]
pub struct RecordingEvents {
    events: Mutex<Vec<(Option<JobId>, RecordedEvent)>>,
    terminal: Notify,
}

impl RecordingEvents {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(Option<JobId>, RecordedEvent)>> {
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, job: Option<JobId>, event: RecordedEvent) {
        let terminal = event.is_terminal();
        self.lock().push((job, event));
        if terminal {
            self.terminal.notify_one();
        }
    }

    /// Every event, in order.
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.lock()
            .iter()
            .map(|(_, e)| e.clone())
            .collect()
    }

    /// Events delivered for `job`.
    pub fn events_for(&self, job: JobId) -> Vec<RecordedEvent> {
        self.lock()
            .iter()
            .filter(|(id, _)| *id == Some(job))
            .map(|(_, e)| e.clone())
            .collect()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.collect(|e| match e {
            RecordedEvent::Status(s) => Some(s.clone()),
            _ => None,
        })
    }

    pub fn states(&self) -> Vec<JobState> {
        self.collect(|e| match e {
            RecordedEvent::State(s) => Some(*s),
            _ => None,
        })
    }

    pub fn percents(&self) -> Vec<u8> {
        self.collect(|e| match e {
            RecordedEvent::Progress(s) => Some(s.percent),
            _ => None,
        })
    }

    pub fn item_starts(&self) -> Vec<(usize, usize, String)> {
        self.collect(|e| match e {
            RecordedEvent::ItemStart { index, total, title } => Some((*index, *total, title.clone())),
            _ => None,
        })
    }

    pub fn finished(&self) -> Vec<PathBuf> {
        self.collect(|e| match e {
            RecordedEvent::Finished(p) => Some(p.clone()),
            _ => None,
        })
    }

    pub fn errors(&self) -> Vec<String> {
        self.collect(|e| match e {
            RecordedEvent::Error(m) => Some(m.clone()),
            _ => None,
        })
    }

    /// Results of the last completed batch.
    pub fn batch_results(&self) -> Option<Vec<DownloadResult>> {
        self.collect(|e| match e {
            RecordedEvent::BatchComplete(r) => Some(r.clone()),
            _ => None,
        })
        .pop()
    }

    pub fn terminal_count(&self) -> usize {
        self.lock()
            .iter()
            .filter(|(_, e)| e.is_terminal())
            .count()
    }

    /// Waits until `count` terminal events were recorded. Returns `false` on timeout.
    pub async fn wait_for_terminal_events(&self, count: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.terminal_count() >= count {
                return true;
            }
            if tokio::time::timeout_at(deadline, self.terminal.notified())
                .await
                .is_err()
            {
                return self.terminal_count() >= count;
            }
        }
    }

    /// Waits for the first terminal event.
    pub async fn wait_for_terminal(&self, timeout: Duration) -> bool {
        self.wait_for_terminal_events(1, timeout).await
    }

    fn collect<T>(&self, f: impl Fn(&RecordedEvent) -> Option<T>) -> Vec<T> {
        self.lock()
            .iter()
            .filter_map(|(_, e)| f(e))
            .collect()
    }
}

impl JobObserver for RecordingEvents {
    fn on_progress(&self, snapshot: &ProgressSnapshot) {
        self.record(None, RecordedEvent::Progress(snapshot.clone()));
    }

    fn on_status(&self, status: &str) {
        self.record(None, RecordedEvent::Status(status.to_string()));
    }

    fn on_state(&self, state: JobState) {
        self.record(None, RecordedEvent::State(state));
    }

    fn on_item_start(&self, index: usize, total: usize, title: &str) {
        self.record(
            None,
            RecordedEvent::ItemStart {
                index,
                total,
                title: title.to_string(),
            },
        );
    }
}

impl JobEvents for RecordingEvents {
    fn on_progress(&self, job: JobId, snapshot: &ProgressSnapshot) {
        self.record(Some(job), RecordedEvent::Progress(snapshot.clone()));
    }

    fn on_status(&self, job: JobId, status: &str) {
        self.record(Some(job), RecordedEvent::Status(status.to_string()));
    }

    fn on_state(&self, job: JobId, state: JobState) {
        self.record(Some(job), RecordedEvent::State(state));
    }

    fn on_item_start(&self, job: JobId, index: usize, total: usize, title: &str) {
        self.record(
            Some(job),
            RecordedEvent::ItemStart {
                index,
                total,
                title: title.to_string(),
            },
        );
    }

    fn on_finished(&self, job: JobId, path: &Path) {
        self.record(Some(job), RecordedEvent::Finished(path.to_path_buf()));
    }

    fn on_error(&self, job: JobId, message: &str) {
        self.record(Some(job), RecordedEvent::Error(message.to_string()));
    }

    fn on_batch_complete(&self, job: JobId, results: &[DownloadResult]) {
        self.record(Some(job), RecordedEvent::BatchComplete(results.to_vec()));
    }
}
