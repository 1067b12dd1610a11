//! Proxy pool configuration
//!
//! Defines where verified proxies are persisted.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_path() -> Option<PathBuf> {
    Some(PathBuf::from("proxies.db"))
}

fn default_persist() -> bool {
    true
}

/// Proxy pool configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PoolConfig {
    /// File the verified proxies are written to. Deleted and recreated on
    /// every start.
    #[serde(default = "default_path")]
    pub path: Option<PathBuf>,

    /// Write verified proxies to `path`; when false the pool lives in memory only
    #[serde(default = "default_persist")]
    pub persist: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            path: default_path(),
            persist: default_persist(),
        }
    }
}

impl PoolConfig {
    /// Memory-only pool
    pub fn in_memory() -> Self {
        PoolConfig {
            path: None,
            persist: false,
        }
    }

    /// Store file, if the pool is persisted
    pub fn store_path(&self) -> Option<&Path> {
        if self.persist {
            self.path.as_deref()
        } else {
            None
        }
    }
}
