//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Job lifecycle (started, finished, duration)
//! - Download attempts and retries
//! - Batch items

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Jobs
// =============================================================================

/// Top-level jobs started by kind.
pub static JOBS_STARTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tonegrab_jobs_started_total", "Total jobs started"),
        &["kind"], // "single", "batch"
    )
    .unwrap()
});

/// Top-level jobs finished by kind and result.
pub static JOBS_FINISHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tonegrab_jobs_finished_total", "Total jobs finished"),
        &["kind", "result"], // result: "success", "failed", "cancelled", "aborted"
    )
    .unwrap()
});

/// Job duration in seconds.
pub static JOB_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("tonegrab_job_duration_seconds", "Duration of top-level jobs")
            .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0, 3600.0]),
        &["kind"],
    )
    .unwrap()
});

// =============================================================================
// Downloads
// =============================================================================

/// Download attempts by result.
pub static DOWNLOAD_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tonegrab_download_attempts_total", "Total download attempts"),
        &["result"], // "success", "corrupt_source", "probe_failure", "unknown", "cancelled"
    )
    .unwrap()
});

/// Retries after a transient probe failure.
pub static DOWNLOAD_RETRIES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "tonegrab_download_retries_total",
        "Total download retries after probe failures",
    )
    .unwrap()
});

// =============================================================================
// Batches
// =============================================================================

/// Batch items processed by result.
pub static BATCH_ITEMS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tonegrab_batch_items_total", "Total batch items processed"),
        &["result"], // "success", "failed", "cancelled"
    )
    .unwrap()
});

/// All core metrics, for registration with the server's registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Jobs
        Box::new(JOBS_STARTED.clone()),
        Box::new(JOBS_FINISHED.clone()),
        Box::new(JOB_DURATION.clone()),
        // Downloads
        Box::new(DOWNLOAD_ATTEMPTS.clone()),
        Box::new(DOWNLOAD_RETRIES.clone()),
        // Batches
        Box::new(BATCH_ITEMS.clone()),
    ]
}
