//! Single-job orchestration.
//!
//! A [`JobOrchestrator`] drives one download through
//! `FetchingInfo → Downloading → Converting → Completed`, retrying only
//! transient probe failures and observing the job's cancel flag at every
//! checkpoint.

mod config;
mod observer;
mod orchestrator;
mod types;

pub use config::{RetryConfig, MAX_ATTEMPTS_LIMIT};
pub use observer::{JobObserver, NoopObserver};
pub use orchestrator::JobOrchestrator;
pub use types::{DownloadResult, JobState, CANCELLED_MESSAGE};
