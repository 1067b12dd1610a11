//! Candidate sources
//!
//! A candidate source returns the raw, unvalidated `host:port` strings that
//! feed the validator. Lines are returned in source order with blank lines
//! removed; parsing happens later.

use crate::candidate::split_candidates;
use crate::error::SockpoolError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fmt::Debug;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Timeout for fetching a remote candidate list
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Something that produces raw candidate strings
#[async_trait]
pub trait CandidateSource: Debug + Send + Sync {
    /// Fetch the full candidate list
    async fn fetch(&self) -> Result<Vec<String>>;
}

/// Candidate list served over HTTP(S)
#[derive(Debug, Clone)]
pub struct HttpSource {
    url: String,
    client: reqwest::Client,
}

impl HttpSource {
    /// Create a source for the given URL
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(HttpSource {
            url: url.into(),
            client,
        })
    }

    /// Source URL
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl CandidateSource for HttpSource {
    async fn fetch(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch candidate list from {}", self.url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SockpoolError::Source(format!(
                "{} answered with status {}",
                self.url, status
            ))
            .into());
        }

        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read candidate list from {}", self.url))?;

        let candidates = split_candidates(&body);
        debug!("Fetched {} candidates from {}", candidates.len(), self.url);
        Ok(candidates)
    }
}

/// Candidate list stored in a local file
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// Create a source reading the given file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSource { path: path.into() }
    }
}

#[async_trait]
impl CandidateSource for FileSource {
    async fn fetch(&self) -> Result<Vec<String>> {
        let body = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read candidate file: {:?}", self.path))?;
        Ok(split_candidates(&body))
    }
}

/// Fixed in-memory candidate list
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    candidates: Vec<String>,
}

impl StaticSource {
    /// Create a source that always returns the given candidates
    pub fn new<I, S>(candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        StaticSource {
            candidates: candidates.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl CandidateSource for StaticSource {
    async fn fetch(&self) -> Result<Vec<String>> {
        Ok(self
            .candidates
            .iter()
            .filter(|c| !c.trim().is_empty())
            .cloned()
            .collect())
    }
}

/// Pick a source implementation from a location string
///
/// `http://` and `https://` locations are fetched over the network, anything
/// else is treated as a file path.
pub fn create_source(location: &str) -> Result<Box<dyn CandidateSource>> {
    match url::Url::parse(location) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {
            Ok(Box::new(HttpSource::new(location)?))
        }
        _ => Ok(Box::new(FileSource::new(location))),
    }
}
