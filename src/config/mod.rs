//! Configuration module for Sockpool
//!
//! This module provides configuration types and parsing. Every field has a
//! default, so running without a configuration file is valid.

mod gateway;
mod pool;
mod validator;

pub use gateway::{GatewayConfig, GatewayMode, TcpConfig};
pub use pool::PoolConfig;
pub use validator::{SourceConfig, ValidatorConfig};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Where candidate proxies come from
    #[serde(default)]
    pub source: SourceConfig,

    /// Reachability validation settings
    #[serde(default)]
    pub validator: ValidatorConfig,

    /// Verified proxy pool settings
    #[serde(default)]
    pub pool: PoolConfig,

    /// Local gateway settings
    #[serde(default)]
    pub gateway: GatewayConfig,
}

impl Config {
    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.source
            .validate()
            .map_err(anyhow::Error::msg)
            .context("Invalid [source] section")?;
        self.validator
            .validate()
            .map_err(anyhow::Error::msg)
            .context("Invalid [validator] section")?;
        self.gateway
            .validate()
            .map_err(anyhow::Error::msg)
            .context("Invalid [gateway] section")?;
        Ok(())
    }
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

    parse_config(&content)
}

/// Parse configuration from a TOML string
pub fn parse_config(content: &str) -> Result<Config> {
    toml::from_str(content).with_context(|| "Failed to parse configuration")
}
