use super::types::JobState;
use crate::progress::ProgressSnapshot;

/// Receives events from a running job.
///
/// Callbacks are invoked synchronously on the job's task, including from
/// inside the download progress callback, so they must not block.
pub trait JobObserver: Send + Sync {
    fn on_progress(&self, _snapshot: &ProgressSnapshot) {}

    fn on_status(&self, _status: &str) {}

    fn on_state(&self, _state: JobState) {}

    /// A batch item is about to be processed. `index` is 1-based.
    fn on_item_start(&self, _index: usize, _total: usize, _title: &str) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl JobObserver for NoopObserver {}
