//! Reachability probes
//!
//! A probe decides whether an endpoint is a working SOCKS5 proxy.

use crate::candidate::Endpoint;
use crate::config::ValidatorConfig;
use crate::error::SockpoolError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::fmt::Debug;
use std::time::Duration;

/// Reachability test for a single endpoint
#[async_trait]
pub trait Probe: Debug + Send + Sync {
    /// `Ok(())` when the endpoint works as a proxy
    async fn check(&self, endpoint: &Endpoint) -> Result<()>;
}

/// Fetches a URL through the endpoint as a SOCKS5 proxy and expects a 200
#[derive(Debug, Clone)]
pub struct HttpProbe {
    check_url: String,
    connect_timeout: Duration,
    request_timeout: Duration,
}

impl HttpProbe {
    /// Create a probe for the given URL and timeouts
    pub fn new(
        check_url: impl Into<String>,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Self {
        HttpProbe {
            check_url: check_url.into(),
            connect_timeout,
            request_timeout,
        }
    }

    /// Create a probe from validator configuration
    pub fn from_config(config: &ValidatorConfig) -> Self {
        Self::new(
            config.check_url.clone(),
            config.connect_timeout(),
            config.request_timeout(),
        )
    }

    fn client_for(&self, endpoint: &Endpoint) -> Result<reqwest::Client> {
        let proxy = reqwest::Proxy::all(endpoint.socks5_url())
            .with_context(|| format!("Invalid proxy address {}", endpoint))?;

        reqwest::Client::builder()
            .proxy(proxy)
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout)
            .build()
            .context("Failed to build HTTP client")
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn check(&self, endpoint: &Endpoint) -> Result<()> {
        let client = self.client_for(endpoint)?;
        let response = client
            .get(&self.check_url)
            .send()
            .await
            .with_context(|| format!("GET {} via {} failed", self.check_url, endpoint))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(SockpoolError::Probe(format!(
                "{} answered {} via {}",
                self.check_url, status, endpoint
            ))
            .into());
        }
        Ok(())
    }
}
