//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Jobs (started, finished by status)
//! - Products (outcome, video render wait)
//! - Platform publishes
//! - Run state commits

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Job Metrics
// =============================================================================

/// Jobs accepted by the orchestrator.
pub static JOBS_STARTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("reelforge_jobs_started_total", "Total jobs accepted").unwrap()
});

/// Jobs reaching a terminal status.
pub static JOBS_FINISHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reelforge_jobs_finished_total", "Total jobs finished"),
        &["status"], // "completed", "failed"
    )
    .unwrap()
});

/// Job wall-clock duration in seconds.
pub static JOB_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("reelforge_job_duration_seconds", "Duration of a job run")
            .buckets(vec![1.0, 10.0, 60.0, 300.0, 600.0, 1800.0, 3600.0, 7200.0]),
        &["status"],
    )
    .unwrap()
});

// =============================================================================
// Product Metrics
// =============================================================================

/// Products processed by outcome.
pub static PRODUCTS_PROCESSED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reelforge_products_total", "Products processed by outcome"),
        &["outcome"], // "succeeded", "generation", "timeout", "persistence"
    )
    .unwrap()
});

/// Time spent waiting for a video render.
pub static VIDEO_WAIT: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "reelforge_video_wait_seconds",
            "Time from render request to a terminal render status",
        )
        .buckets(vec![10.0, 30.0, 60.0, 120.0, 240.0, 420.0, 600.0]),
        &["result"],
    )
    .unwrap()
});

/// Run state pointer commits.
pub static STATE_COMMITS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reelforge_state_commits_total", "Run state commits by result"),
        &["result"],
    )
    .unwrap()
});

// =============================================================================
// Publishing Metrics
// =============================================================================

/// Publish attempts by platform and result.
pub static PUBLISHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reelforge_publishes_total", "Platform publish attempts"),
        &["platform", "result"],
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Jobs
        Box::new(JOBS_STARTED.clone()),
        Box::new(JOBS_FINISHED.clone()),
        Box::new(JOB_DURATION.clone()),
        // Products
        Box::new(PRODUCTS_PROCESSED.clone()),
        Box::new(VIDEO_WAIT.clone()),
        Box::new(STATE_COMMITS.clone()),
        // Publishing
        Box::new(PUBLISHES.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::Registry;

    #[test]
    fn test_all_metrics_register() {
        let registry = Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }
        PUBLISHES.with_label_values(&["instagram", "published"]).inc();
        let families = registry.gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "reelforge_publishes_total"));
    }
}
