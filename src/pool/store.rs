//! Persistence backends for the proxy pool
//!
//! The pool keeps its own in-memory index for sampling; a store only has to
//! wipe itself on reset and accept appended rows.

use super::VerifiedProxy;
use crate::candidate::parse_candidate;
use crate::error::SockpoolError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fmt::Debug;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, UNIX_EPOCH};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

/// Append-only storage for verified proxies
#[async_trait]
pub trait PoolStore: Debug + Send + Sync {
    /// Destroy any existing state and start empty
    async fn reset(&self) -> Result<()>;

    /// Persist one verified proxy
    async fn append(&self, record: &VerifiedProxy) -> Result<()>;
}

/// Store that keeps nothing beyond the pool's own memory
#[derive(Debug, Default)]
pub struct MemoryStore;

#[async_trait]
impl PoolStore for MemoryStore {
    async fn reset(&self) -> Result<()> {
        Ok(())
    }

    async fn append(&self, _record: &VerifiedProxy) -> Result<()> {
        Ok(())
    }
}

/// Tab-separated file with one `id  host:port  unix-seconds` row per proxy
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl FileStore {
    /// Create a store backed by the given path. Nothing touches the disk
    /// until [`PoolStore::reset`] is called.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStore {
            path: path.into(),
            file: Mutex::new(None),
        }
    }

    /// Backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every row back from a store file
    pub async fn load(path: impl AsRef<Path>) -> Result<Vec<VerifiedProxy>> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read pool file: {:?}", path))?;

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .enumerate()
            .map(|(n, line)| {
                parse_row(line).ok_or_else(|| {
                    anyhow::Error::from(SockpoolError::Pool(format!(
                        "malformed row {} in {:?}",
                        n + 1,
                        path
                    )))
                })
            })
            .collect()
    }
}

#[async_trait]
impl PoolStore for FileStore {
    async fn reset(&self) -> Result<()> {
        let mut guard = self.file.lock().await;
        *guard = None;

        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => debug!("Removed previous pool file {:?}", self.path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to remove {:?}", self.path));
            }
        }

        let file = OpenOptions::new()
            .create_new(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("Failed to create pool file: {:?}", self.path))?;

        *guard = Some(file);
        Ok(())
    }

    async fn append(&self, record: &VerifiedProxy) -> Result<()> {
        let mut guard = self.file.lock().await;
        let file = guard
            .as_mut()
            .ok_or_else(|| SockpoolError::Pool("file store used before reset".to_string()))?;

        file.write_all(format_row(record).as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

fn format_row(record: &VerifiedProxy) -> String {
    let secs = record
        .verified_at
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("{}\t{}\t{}\n", record.id, record.endpoint, secs)
}

fn parse_row(line: &str) -> Option<VerifiedProxy> {
    let mut fields = line.trim_end().splitn(3, '\t');
    let id = fields.next()?.parse().ok()?;
    let endpoint = parse_candidate(fields.next()?)?;
    let secs: u64 = fields.next()?.parse().ok()?;
    Some(VerifiedProxy {
        id,
        endpoint,
        verified_at: UNIX_EPOCH + Duration::from_secs(secs),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::Endpoint;

    fn record(id: u64, host: &str, port: u16) -> VerifiedProxy {
        VerifiedProxy {
            id,
            endpoint: Endpoint::new(host, port).unwrap(),
            verified_at: UNIX_EPOCH + Duration::from_secs(1_700_000_000),
        }
    }

    #[test]
    fn test_row_format_and_parse() {
        let rec = record(7, "10.0.0.1", 1080);
        let row = format_row(&rec);
        assert_eq!(row, "7\t10.0.0.1:1080\t1700000000\n");
        assert_eq!(parse_row(&row), Some(rec));
    }

    #[test]
    fn test_parse_row_rejects_garbage() {
        assert!(parse_row("").is_none());
        assert!(parse_row("x\t10.0.0.1:1080\t1").is_none());
        assert!(parse_row("1\tnot-a-proxy\t1").is_none());
        assert!(parse_row("1\t10.0.0.1:1080").is_none());
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryStore;
        store.reset().await.unwrap();
        store.append(&record(1, "a", 1)).await.unwrap();
    }

    #[tokio::test]
    async fn test_file_store_append_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proxies.db");
        let store = FileStore::new(&path);

        store.reset().await.unwrap();
        store.append(&record(1, "10.0.0.1", 1080)).await.unwrap();
        store.append(&record(2, "10.0.0.2", 1081)).await.unwrap();

        let rows = FileStore::load(&path).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, 1);
        assert_eq!(rows[1].endpoint.to_string(), "10.0.0.2:1081");
    }

    #[tokio::test]
    async fn test_file_store_reset_wipes_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proxies.db");
        tokio::fs::write(&path, "1\t10.0.0.9:1080\t0\n").await.unwrap();

        let store = FileStore::new(&path);
        store.reset().await.unwrap();

        assert!(FileStore::load(&path).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_store_append_before_reset() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("proxies.db"));
        assert!(store.append(&record(1, "a", 1)).await.is_err());
    }

    #[tokio::test]
    async fn test_file_store_reset_fails_in_missing_dir() {
        let store = FileStore::new("/nonexistent-dir/sockpool/proxies.db");
        assert!(store.reset().await.is_err());
    }
}
