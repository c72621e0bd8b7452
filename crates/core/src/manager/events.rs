use std::path::Path;
use std::sync::Arc;

use crate::job::{DownloadResult, JobObserver, JobState};
use crate::progress::ProgressSnapshot;
use crate::registry::JobId;

/// Caller-supplied event sink for jobs started through the manager.
///
/// Every callback runs synchronously on the job's task and must not block.
/// Exactly one of `on_finished` or `on_error` is delivered per job.
pub trait JobEvents: Send + Sync {
    fn on_progress(&self, _job: JobId, _snapshot: &ProgressSnapshot) {}

    fn on_status(&self, _job: JobId, _status: &str) {}

    fn on_state(&self, _job: JobId, _state: JobState) {}

    /// A batch item is starting. `index` is 1-based.
    fn on_item_start(&self, _job: JobId, _index: usize, _total: usize, _title: &str) {}

    /// Successful completion. For batches, `path` is the playlist directory.
    fn on_finished(&self, _job: JobId, _path: &Path) {}

    fn on_error(&self, _job: JobId, _message: &str) {}

    /// Every item result of a batch, in entry order.
    fn on_batch_complete(&self, _job: JobId, _results: &[DownloadResult]) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEvents;

impl JobEvents for NoopEvents {}

/// Forwards orchestrator callbacks to a [`JobEvents`] sink under one job id.
pub(crate) struct EventsObserver {
    pub job: JobId,
    pub events: Arc<dyn JobEvents>,
}

impl JobObserver for EventsObserver {
    fn on_progress(&self, snapshot: &ProgressSnapshot) {
        self.events.on_progress(self.job, snapshot);
    }

    fn on_status(&self, status: &str) {
        self.events.on_status(self.job, status);
    }

    fn on_state(&self, state: JobState) {
        self.events.on_state(self.job, state);
    }

    fn on_item_start(&self, index: usize, total: usize, title: &str) {
        self.events.on_item_start(self.job, index, total, title);
    }
}
