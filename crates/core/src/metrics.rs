//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Queue (pending jobs, completed jobs by status)
//! - Placement (files by outcome, bytes written)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Queue Metrics
// =============================================================================

/// Jobs waiting behind the active one.
pub static QUEUE_PENDING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("sortarr_queue_pending", "Number of jobs waiting in the queue").unwrap()
});

/// Finished jobs by status.
pub static JOBS_COMPLETED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("sortarr_jobs_completed_total", "Total finished jobs"),
        &["status"], // "succeeded", "rejected", "failed"
    )
    .unwrap()
});

/// Job duration from activation to finish.
pub static JOB_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("sortarr_job_duration_seconds", "Duration of a job once active")
            .buckets(vec![
                1.0, 10.0, 60.0, 300.0, 900.0, 1800.0, 3600.0, 7200.0, 14400.0,
            ]),
        &["status"],
    )
    .unwrap()
});

// =============================================================================
// Placement Metrics
// =============================================================================

/// Files processed by outcome.
pub static FILES_PROCESSED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("sortarr_files_processed_total", "Files processed by outcome"),
        &["outcome"], // "placed", "unmatched", "failed", "skipped"
    )
    .unwrap()
});

/// Bytes written into the library.
pub static BYTES_PLACED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "sortarr_bytes_placed_total",
        "Total bytes written into the library",
    )
    .unwrap()
});

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Queue
        Box::new(QUEUE_PENDING.clone()),
        Box::new(JOBS_COMPLETED.clone()),
        Box::new(JOB_DURATION.clone()),
        // Placement
        Box::new(FILES_PROCESSED.clone()),
        Box::new(BYTES_PLACED.clone()),
    ]
}
