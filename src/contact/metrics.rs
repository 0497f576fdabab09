//! Submission metrics.
//!
//! Visitors see a success-styled notice whether or not the store write
//! worked, so these counters are where the real outcome is visible.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct SubmissionMetrics {
    /// Validated submissions handed to the store
    submissions: AtomicUsize,

    /// Store writes that succeeded
    store_successes: AtomicUsize,

    /// Store writes that failed and were shown the fallback notice
    store_failures: AtomicUsize,

    /// Submissions rejected by validation before reaching the store
    validation_rejections: AtomicUsize,
}

impl SubmissionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_submission(&self) {
        self.submissions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_store_success(&self) {
        self.store_successes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_store_failure(&self) {
        self.store_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_validation_rejection(&self) {
        self.validation_rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn submissions(&self) -> usize {
        self.submissions.load(Ordering::Relaxed)
    }

    pub fn store_successes(&self) -> usize {
        self.store_successes.load(Ordering::Relaxed)
    }

    pub fn store_failures(&self) -> usize {
        self.store_failures.load(Ordering::Relaxed)
    }

    pub fn validation_rejections(&self) -> usize {
        self.validation_rejections.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let submissions = self.submissions();
        let successes = self.store_successes();
        let store_success_rate = if submissions > 0 {
            (successes as f64 / submissions as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            submissions,
            store_successes: successes,
            store_failures: self.store_failures(),
            validation_rejections: self.validation_rejections(),
            store_success_rate,
        }
    }
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub submissions: usize,
    pub store_successes: usize,
    pub store_failures: usize,
    pub validation_rejections: usize,

    /// Store success rate as a percentage (0-100)
    pub store_success_rate: f64,
}
