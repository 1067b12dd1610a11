//! Pool statistics
//!
//! Lock-free counters describing what the pool has done since the last reset.

use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

/// Statistics for the proxy pool
#[derive(Debug, Default)]
pub struct PoolStats {
    /// Proxies successfully inserted
    pub inserted: AtomicUsize,
    /// Inserts rejected by the store
    pub failed_inserts: AtomicUsize,
    /// Samples that returned a proxy
    pub samples: AtomicUsize,
    /// Samples taken while the pool was empty
    pub empty_samples: AtomicUsize,
}

impl PoolStats {
    /// Create new pool stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful insert
    pub fn record_inserted(&self) {
        self.inserted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed insert
    pub fn record_failed_insert(&self) {
        self.failed_inserts.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a sample
    pub fn record_sample(&self, hit: bool) {
        if hit {
            self.samples.fetch_add(1, Ordering::Relaxed);
        } else {
            self.empty_samples.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Zero every counter
    pub fn clear(&self) {
        self.inserted.store(0, Ordering::Relaxed);
        self.failed_inserts.store(0, Ordering::Relaxed);
        self.samples.store(0, Ordering::Relaxed);
        self.empty_samples.store(0, Ordering::Relaxed);
    }

    /// Get current stats snapshot
    pub fn snapshot(&self) -> PoolStatsSnapshot {
        PoolStatsSnapshot {
            inserted: self.inserted.load(Ordering::Relaxed),
            failed_inserts: self.failed_inserts.load(Ordering::Relaxed),
            samples: self.samples.load(Ordering::Relaxed),
            empty_samples: self.empty_samples.load(Ordering::Relaxed),
        }
    }

    /// Log a one-line summary
    pub fn log_summary(&self) {
        let stats = self.snapshot();
        info!(
            "Pool: inserted={}, failed_inserts={}, samples={}, empty_samples={}",
            stats.inserted, stats.failed_inserts, stats.samples, stats.empty_samples
        );
    }
}

/// Snapshot of pool statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStatsSnapshot {
    pub inserted: usize,
    pub failed_inserts: usize,
    pub samples: usize,
    pub empty_samples: usize,
}
