//! Validator statistics
//!
//! Counts probes and tracks how many are in flight, including the highest
//! concurrency observed, so the admission bound can be checked.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Statistics for one validator
#[derive(Debug, Default)]
pub struct ValidatorStats {
    /// Probes scheduled
    pub launched: AtomicUsize,
    /// Probes currently running
    pub in_flight: AtomicUsize,
    /// Highest value `in_flight` has reached
    pub peak_in_flight: AtomicUsize,
    /// Probes that found a live proxy
    pub passed: AtomicUsize,
    /// Probes that failed or timed out
    pub failed: AtomicUsize,
}

impl ValidatorStats {
    /// Create new validator stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a scheduled probe
    pub fn record_launched(&self) {
        self.launched.fetch_add(1, Ordering::Relaxed);
    }

    /// Mark a probe as running until the returned guard is dropped
    pub fn enter(self: &Arc<Self>) -> InFlightGuard {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        InFlightGuard {
            stats: Arc::clone(self),
        }
    }

    /// Record a probe outcome
    pub fn record_result(&self, live: bool) {
        if live {
            self.passed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Get current stats snapshot
    pub fn snapshot(&self) -> ValidatorStatsSnapshot {
        ValidatorStatsSnapshot {
            launched: self.launched.load(Ordering::Relaxed),
            in_flight: self.in_flight.load(Ordering::SeqCst),
            peak_in_flight: self.peak_in_flight.load(Ordering::SeqCst),
            passed: self.passed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Decrements the in-flight counter on drop
#[derive(Debug)]
pub struct InFlightGuard {
    stats: Arc<ValidatorStats>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.stats.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Snapshot of validator statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidatorStatsSnapshot {
    pub launched: usize,
    pub in_flight: usize,
    pub peak_in_flight: usize,
    pub passed: usize,
    pub failed: usize,
}
