//! Candidate source and validator configuration
//!
//! Defines where candidates are fetched from and how they are probed.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Default public SOCKS5 candidate list
pub const DEFAULT_SOURCE_URL: &str =
    "https://raw.githubusercontent.com/ProxyScraper/ProxyScraper/refs/heads/main/socks5.txt";

/// Default reachability check target
pub const DEFAULT_CHECK_URL: &str = "http://ifconfig.me";

fn default_location() -> String {
    DEFAULT_SOURCE_URL.to_string()
}

fn default_concurrency() -> usize {
    50
}

fn default_check_url() -> String {
    DEFAULT_CHECK_URL.to_string()
}

fn default_connect_timeout() -> u64 {
    2
}

fn default_request_timeout() -> u64 {
    10
}

/// Candidate source configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SourceConfig {
    /// URL (`http://`, `https://`) or local file path of a newline-delimited list
    #[serde(default = "default_location")]
    pub location: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            location: default_location(),
        }
    }
}

impl SourceConfig {
    /// Validate the source configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.location.trim().is_empty() {
            return Err("location must not be empty".to_string());
        }
        Ok(())
    }
}

/// Reachability validator configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ValidatorConfig {
    /// Maximum number of probes in flight at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// URL fetched through each candidate; a 200 marks it live
    #[serde(default = "default_check_url")]
    pub check_url: String,

    /// Connection establishment timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Whole request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        ValidatorConfig {
            concurrency: default_concurrency(),
            check_url: default_check_url(),
            connect_timeout: default_connect_timeout(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl ValidatorConfig {
    /// Connection timeout as a Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    /// Request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Validate the validator configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.concurrency == 0 {
            return Err("concurrency must be greater than 0".to_string());
        }
        let url = Url::parse(&self.check_url)
            .map_err(|e| format!("check_url {:?} is not a valid URL: {}", self.check_url, e))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(format!("check_url must be http or https, got {}", url.scheme()));
        }
        if self.connect_timeout == 0 || self.request_timeout == 0 {
            return Err("timeouts must be greater than 0".to_string());
        }
        Ok(())
    }
}
