//! Progress aggregation.
//!
//! Extraction services report progress as loosely-typed [`RawProgress`]
//! events: some carry a percent string, some only byte counters, some only
//! fragment counters. The [`ProgressAggregator`] turns them into a stream of
//! [`ProgressSnapshot`]s that never goes backwards within one item, is
//! rate-limited, and smooths large jumps.

mod aggregator;
mod config;
mod display;
mod types;

pub use aggregator::{ProgressAggregator, ProgressUpdate, PROCESSING_STATUS};
pub use config::ProgressConfig;
pub use display::{format_duration, format_eta, strip_ansi};
pub use types::{ProgressSnapshot, RawProgress, RawStatus};
