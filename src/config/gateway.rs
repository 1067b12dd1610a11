//! Gateway configuration types
//!
//! Defines the local listener, how the tunnel target is chosen, and the
//! socket options applied to upstream connections.

use crate::gateway::TargetAddr;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// How a relay session learns where to tunnel to
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub enum GatewayMode {
    /// Local clients speak no-auth SOCKS5 and name the target in CONNECT
    #[default]
    #[serde(rename = "socks5")]
    Socks5,
    /// Inbound bytes are tunnelled as-is to the configured target
    #[serde(rename = "fixed")]
    Fixed,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8088".to_string()
}

fn default_dial_timeout() -> u64 {
    10
}

fn default_keepalive_secs() -> u64 {
    20
}

fn default_keepalive_interval() -> u64 {
    8
}

fn default_nodelay() -> bool {
    true
}

/// Gateway configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    /// Local listen address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Target selection mode
    #[serde(default)]
    pub mode: GatewayMode,

    /// Tunnel target for [`GatewayMode::Fixed`], as `host:port`
    #[serde(default)]
    pub target: Option<String>,

    /// Timeout in seconds for reaching the upstream proxy and opening the tunnel
    #[serde(default = "default_dial_timeout")]
    pub dial_timeout: u64,

    /// Socket options for upstream connections
    #[serde(default)]
    pub tcp: TcpConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            bind_addr: default_bind_addr(),
            mode: GatewayMode::default(),
            target: None,
            dial_timeout: default_dial_timeout(),
            tcp: TcpConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Dial timeout as a Duration
    pub fn dial_timeout(&self) -> Duration {
        Duration::from_secs(self.dial_timeout)
    }

    /// Parsed fixed target, if one is configured
    pub fn fixed_target(&self) -> Option<TargetAddr> {
        self.target.as_deref().and_then(TargetAddr::parse)
    }

    /// Validate the gateway configuration
    pub fn validate(&self) -> Result<(), String> {
        self.bind_addr
            .parse::<SocketAddr>()
            .map_err(|e| format!("bind_addr {:?} is invalid: {}", self.bind_addr, e))?;

        if self.mode == GatewayMode::Fixed {
            match &self.target {
                None => return Err("mode \"fixed\" requires a target".to_string()),
                Some(target) if TargetAddr::parse(target).is_none() => {
                    return Err(format!("target {:?} is not host:port", target));
                }
                Some(_) => {}
            }
        }

        if self.dial_timeout == 0 {
            return Err("dial_timeout must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// TCP socket options for upstream connections
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TcpConfig {
    /// Enable TCP_NODELAY
    #[serde(default = "default_nodelay")]
    pub nodelay: bool,

    /// TCP keepalive timeout in seconds
    #[serde(default = "default_keepalive_secs")]
    pub keepalive_secs: u64,

    /// TCP keepalive interval in seconds
    #[serde(default = "default_keepalive_interval")]
    pub keepalive_interval: u64,
}

impl Default for TcpConfig {
    fn default() -> Self {
        TcpConfig {
            nodelay: default_nodelay(),
            keepalive_secs: default_keepalive_secs(),
            keepalive_interval: default_keepalive_interval(),
        }
    }
}
