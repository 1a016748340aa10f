//! Request counters for the orchestration layer.
//!
//! Lock-free atomics updated on the hot path; `snapshot()` produces a
//! serializable point-in-time view for logging or status output.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Running counters shared between the orchestrator and its response pump.
#[derive(Debug, Default)]
pub struct RequestMetrics {
    requests_sent: AtomicU64,
    failures: AtomicU64,
    timeouts: AtomicU64,
    late_responses_discarded: AtomicU64,
}

impl RequestMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_sent(&self) {
        self.requests_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_late_discard(&self) {
        self.late_responses_discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_sent: self.requests_sent.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            late_responses_discarded: self.late_responses_discarded.load(Ordering::Relaxed),
            captured_at: Utc::now().to_rfc3339(),
        }
    }
}

/// Point-in-time view of the request counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub requests_sent: u64,
    pub failures: u64,
    pub timeouts: u64,
    pub late_responses_discarded: u64,
    pub captured_at: String,
}

impl MetricsSnapshot {
    /// Fraction of sent requests that failed or timed out.
    pub fn failure_rate(&self) -> f64 {
        if self.requests_sent == 0 {
            return 0.0;
        }
        (self.failures + self.timeouts) as f64 / self.requests_sent as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let metrics = RequestMetrics::new();
        metrics.record_sent();
        metrics.record_sent();
        metrics.record_sent();
        metrics.record_failure();
        metrics.record_timeout();
        metrics.record_late_discard();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requests_sent, 3);
        assert_eq!(snapshot.failures, 1);
        assert_eq!(snapshot.timeouts, 1);
        assert_eq!(snapshot.late_responses_discarded, 1);
        assert!(!snapshot.captured_at.is_empty());
    }

    #[test]
    fn test_failure_rate() {
        let metrics = RequestMetrics::new();
        assert_eq!(metrics.snapshot().failure_rate(), 0.0);

        metrics.record_sent();
        metrics.record_sent();
        metrics.record_sent();
        metrics.record_sent();
        metrics.record_failure();
        metrics.record_timeout();
        assert!((metrics.snapshot().failure_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_snapshot_serializes() {
        let snapshot = RequestMetrics::new().snapshot();
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"requests_sent\":0"));
        assert!(json.contains("captured_at"));
    }
}
