//! Verified proxy pool for Sockpool
//!
//! The pool is the only state shared between the validator (producer) and the
//! gateway sessions (consumers). Entries live in a random-access vector behind
//! an async `RwLock`, so sampling never touches the store; every insert is
//! written through to a [`PoolStore`].

mod stats;
mod store;

pub use stats::{PoolStats, PoolStatsSnapshot};
pub use store::{FileStore, MemoryStore, PoolStore};

use crate::candidate::Endpoint;
use crate::config::PoolConfig;
use crate::error::SockpoolError;
use anyhow::{Context, Result};
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// An endpoint that passed the reachability check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedProxy {
    /// Surrogate key, unique within one run; ids run 1, 2, 3 in insertion order
    pub id: u64,
    /// The proxy address
    pub endpoint: Endpoint,
    /// When the proxy was inserted
    pub verified_at: SystemTime,
}

/// Shared pool of verified proxies
#[derive(Debug)]
pub struct ProxyPool {
    store: Box<dyn PoolStore>,
    entries: RwLock<Vec<VerifiedProxy>>,
    initialized: AtomicBool,
    stats: Arc<PoolStats>,
}

impl ProxyPool {
    /// Create a pool over the given store. [`ProxyPool::reset`] must be called
    /// before the first insert.
    pub fn new(store: Box<dyn PoolStore>) -> Self {
        ProxyPool {
            store,
            entries: RwLock::new(Vec::new()),
            initialized: AtomicBool::new(false),
            stats: Arc::new(PoolStats::new()),
        }
    }

    /// Create a pool with no persistence
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStore))
    }

    /// Create a pool from configuration
    pub fn from_config(config: &PoolConfig) -> Self {
        match config.store_path() {
            Some(path) => Self::new(Box::new(FileStore::new(path))),
            None => Self::in_memory(),
        }
    }

    /// Wipe the pool and its store, leaving it empty and ready for inserts
    pub async fn reset(&self) -> Result<()> {
        let mut entries = self.entries.write().await;
        self.store
            .reset()
            .await
            .context("Failed to reset pool store")?;

        entries.clear();
        self.stats.clear();
        self.initialized.store(true, Ordering::SeqCst);

        info!("Proxy pool reset");
        Ok(())
    }

    /// Append a verified endpoint
    ///
    /// The row is persisted before it becomes visible to samplers. A store
    /// failure leaves the pool unchanged and consumes no id. Inserts are
    /// serialized, so stored rows appear in id order.
    pub async fn insert(&self, endpoint: Endpoint) -> Result<VerifiedProxy> {
        if !self.initialized.load(Ordering::SeqCst) {
            return Err(SockpoolError::Pool("insert before reset".to_string()).into());
        }

        let mut entries = self.entries.write().await;
        let record = VerifiedProxy {
            id: entries.len() as u64 + 1,
            endpoint,
            verified_at: SystemTime::now(),
        };

        if let Err(e) = self.store.append(&record).await {
            self.stats.record_failed_insert();
            return Err(e).with_context(|| format!("Failed to persist {}", record.endpoint));
        }

        entries.push(record.clone());
        drop(entries);
        self.stats.record_inserted();
        debug!("Pool insert #{}: {}", record.id, record.endpoint);

        Ok(record)
    }

    /// Pick one endpoint uniformly at random, or `None` if the pool is empty
    pub async fn sample_one(&self) -> Option<Endpoint> {
        let entries = self.entries.read().await;
        if entries.is_empty() {
            self.stats.record_sample(false);
            return None;
        }

        let index = rand::thread_rng().gen_range(0..entries.len());
        self.stats.record_sample(true);
        Some(entries[index].endpoint.clone())
    }

    /// Number of stored proxies
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the pool holds no proxies
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Copy of every stored record, in insertion order
    pub async fn snapshot(&self) -> Vec<VerifiedProxy> {
        self.entries.read().await.clone()
    }

    /// Pool statistics
    pub fn stats(&self) -> &Arc<PoolStats> {
        &self.stats
    }
}
