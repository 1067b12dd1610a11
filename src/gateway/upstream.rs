//! Outbound tunnels through a verified proxy
//!
//! Opens a TCP connection to the sampled proxy, then asks it (as a SOCKS5
//! client) to connect on to the session target.

use super::types::TargetAddr;
use crate::candidate::Endpoint;
use crate::config::{GatewayConfig, TcpConfig};
use crate::error::{Socks5Error, SockpoolError};
use anyhow::{Context, Result};
use async_socks5::AddrKind;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

/// Socket options applied to upstream connections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketOpts {
    /// Enable TCP_NODELAY
    pub nodelay: bool,
    /// TCP keepalive timeout
    pub keepalive_secs: Option<u64>,
    /// TCP keepalive interval
    pub keepalive_interval: Option<u64>,
}

impl Default for SocketOpts {
    fn default() -> Self {
        Self::from_tcp_config(&TcpConfig::default())
    }
}

impl SocketOpts {
    /// Create socket options from TCP config
    pub fn from_tcp_config(config: &TcpConfig) -> Self {
        SocketOpts {
            nodelay: config.nodelay,
            keepalive_secs: Some(config.keepalive_secs).filter(|s| *s > 0),
            keepalive_interval: Some(config.keepalive_interval).filter(|s| *s > 0),
        }
    }

    /// Apply socket options to a TCP stream
    pub fn apply(&self, stream: &TcpStream) -> std::io::Result<()> {
        stream.set_nodelay(self.nodelay)?;

        if let (Some(time), Some(interval)) = (self.keepalive_secs, self.keepalive_interval) {
            let socket = socket2::SockRef::from(stream);
            let keepalive = socket2::TcpKeepalive::new()
                .with_time(Duration::from_secs(time))
                .with_interval(Duration::from_secs(interval));
            socket.set_tcp_keepalive(&keepalive)?;
        }

        Ok(())
    }
}

/// An open tunnel through a proxy
#[derive(Debug)]
pub struct Tunnel {
    /// Stream carrying the target's bytes
    pub stream: TcpStream,
    /// Address the proxy bound for the tunnel, as it reported it
    pub bound: AddrKind,
}

impl Tunnel {
    /// Bound address to report to a SOCKS5 client
    ///
    /// `None` when the proxy reported a domain name, which a reply built from
    /// a socket address cannot carry.
    pub fn bind_addr(&self) -> Option<SocketAddr> {
        match &self.bound {
            AddrKind::Ip(addr) => Some(*addr),
            AddrKind::Domain(..) => None,
        }
    }
}

/// Dials targets through SOCKS5 proxies
#[derive(Debug, Clone)]
pub struct UpstreamDialer {
    timeout: Duration,
    socket_opts: SocketOpts,
}

impl UpstreamDialer {
    /// Create a dialer. `timeout` bounds the proxy connect and the tunnel
    /// handshake together.
    pub fn new(timeout: Duration, socket_opts: SocketOpts) -> Self {
        UpstreamDialer {
            timeout,
            socket_opts,
        }
    }

    /// Create a dialer from gateway configuration
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(
            config.dial_timeout(),
            SocketOpts::from_tcp_config(&config.tcp),
        )
    }

    /// Open a tunnel to `target` through `proxy`
    ///
    /// The SOCKS5 exchange with the proxy is already complete when this
    /// returns.
    pub async fn dial(&self, proxy: &Endpoint, target: &TargetAddr) -> Result<Tunnel> {
        match timeout(self.timeout, self.open(proxy, target)).await {
            Ok(result) => result,
            Err(_) => Err(SockpoolError::Timeout(format!(
                "tunnel to {} via {} not ready after {:?}",
                target, proxy, self.timeout
            ))
            .into()),
        }
    }

    async fn open(&self, proxy: &Endpoint, target: &TargetAddr) -> Result<Tunnel> {
        let mut stream = TcpStream::connect((proxy.host(), proxy.port()))
            .await
            .map_err(SockpoolError::Io)
            .with_context(|| format!("Failed to connect to proxy {}", proxy))?;

        if let Err(e) = self.socket_opts.apply(&stream) {
            debug!("Failed to apply socket options for {}: {}", proxy, e);
        }

        let bound = async_socks5::connect(&mut stream, AddrKind::from(target), None)
            .await
            .map_err(|e| Socks5Error::Upstream(e.to_string()))
            .with_context(|| format!("Proxy {} refused tunnel to {}", proxy, target))?;

        debug!("Tunnel to {} open via {}, bound {:?}", target, proxy, bound);
        Ok(Tunnel { stream, bound })
    }
}
