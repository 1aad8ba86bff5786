//! Resolution metrics

use std::sync::atomic::{AtomicU64, Ordering};

use crate::handlers::RetCode;

/// Counters for completed requests
#[derive(Debug, Default)]
pub struct Metrics {
    requests: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    path_errors: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one completed request by its final code
    pub fn record(&self, code: RetCode) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        let counter = match code {
            RetCode::Success => {
                self.succeeded.fetch_add(1, Ordering::Relaxed);
                "succeeded"
            }
            RetCode::PathError => {
                self.path_errors.fetch_add(1, Ordering::Relaxed);
                "path_errors"
            }
            _ => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                "failed"
            }
        };
        tracing::debug!(counter, %code, "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            path_errors: self.path_errors.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub path_errors: u64,
}
