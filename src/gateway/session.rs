//! Relay sessions
//!
//! One session per accepted connection: sample a proxy, learn the target,
//! open the tunnel, relay until either side stops.

use super::command::{parse_command, send_reply, send_success};
use super::handshake::negotiate;
use super::relay::relay_tcp;
use super::types::{SocksCommand, TargetAddr};
use super::upstream::{Tunnel, UpstreamDialer};
use crate::candidate::Endpoint;
use crate::config::{GatewayConfig, GatewayMode};
use crate::error::{SockpoolError, Socks5ReplyCode};
use crate::pool::ProxyPool;
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};

/// Where a session takes its tunnel target from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSource {
    /// The client names it in a SOCKS5 CONNECT request
    Socks5,
    /// Always the same address; inbound bytes are relayed untouched
    Fixed(TargetAddr),
}

impl TargetSource {
    /// Build from gateway configuration
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        match config.mode {
            GatewayMode::Socks5 => Ok(TargetSource::Socks5),
            GatewayMode::Fixed => config.fixed_target().map(TargetSource::Fixed).ok_or_else(|| {
                SockpoolError::Config("fixed mode needs a valid target".to_string()).into()
            }),
        }
    }
}

/// How a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The pool was empty; the connection was closed without exchanging data
    NoProxy,
    /// The client asked for something other than CONNECT
    Unsupported(SocksCommand),
    /// The tunnel could not be opened
    DialFailed(Endpoint),
    /// Bytes were relayed until one side stopped
    Relayed(Endpoint),
}

/// Shared state for running relay sessions
#[derive(Debug)]
pub struct SessionHandler {
    pool: Arc<ProxyPool>,
    dialer: UpstreamDialer,
    target: TargetSource,
}

impl SessionHandler {
    /// Create a handler
    pub fn new(pool: Arc<ProxyPool>, dialer: UpstreamDialer, target: TargetSource) -> Self {
        SessionHandler {
            pool,
            dialer,
            target,
        }
    }

    /// Create a handler from gateway configuration
    pub fn from_config(config: &GatewayConfig, pool: Arc<ProxyPool>) -> Result<Self> {
        Ok(Self::new(
            pool,
            UpstreamDialer::from_config(config),
            TargetSource::from_config(config)?,
        ))
    }

    /// Run one session to completion
    ///
    /// The pool is sampled before anything is read from `inbound`. Dropping
    /// `inbound` on return closes the client connection.
    pub async fn handle<S>(&self, mut inbound: S, peer: SocketAddr) -> Result<SessionOutcome>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let proxy = match self.pool.sample_one().await {
            Some(proxy) => proxy,
            None => {
                info!("No verified proxy available, closing connection from {}", peer);
                return Ok(SessionOutcome::NoProxy);
            }
        };
        debug!("Session from {} uses proxy {}", peer, proxy);

        let upstream = match &self.target {
            TargetSource::Socks5 => {
                negotiate(&mut inbound)
                    .await
                    .with_context(|| format!("SOCKS5 negotiation with {} failed", peer))?;

                let (command, target) = match parse_command(&mut inbound).await {
                    Ok(request) => request,
                    Err(e) => {
                        let code = Socks5ReplyCode::from(&e);
                        if matches!(
                            code,
                            Socks5ReplyCode::CommandNotSupported
                                | Socks5ReplyCode::AddressTypeNotSupported
                        ) {
                            let _ = send_reply(&mut inbound, code, None).await;
                        }
                        return Err(e.context(format!("Bad SOCKS5 request from {}", peer)));
                    }
                };

                if command != SocksCommand::Connect {
                    warn!("Rejecting {} from {}", command, peer);
                    send_reply(&mut inbound, Socks5ReplyCode::CommandNotSupported, None).await?;
                    return Ok(SessionOutcome::Unsupported(command));
                }

                match self.dial(&proxy, &target).await {
                    Ok(tunnel) => {
                        send_success(&mut inbound, tunnel.bind_addr()).await?;
                        tunnel.stream
                    }
                    Err(code) => {
                        // Best effort: the client may already be gone
                        let _ = send_reply(&mut inbound, code, None).await;
                        return Ok(SessionOutcome::DialFailed(proxy));
                    }
                }
            }
            TargetSource::Fixed(target) => match self.dial(&proxy, target).await {
                Ok(tunnel) => tunnel.stream,
                Err(_) => return Ok(SessionOutcome::DialFailed(proxy)),
            },
        };

        let end = relay_tcp(inbound, upstream).await;
        debug!("Session from {} via {} ended by {:?} side", peer, proxy, end);
        Ok(SessionOutcome::Relayed(proxy))
    }

    /// Open the tunnel, or log the failure and return the reply code for it
    async fn dial(
        &self,
        proxy: &Endpoint,
        target: &TargetAddr,
    ) -> std::result::Result<Tunnel, Socks5ReplyCode> {
        match self.dialer.dial(proxy, target).await {
            Ok(tunnel) => {
                info!("Relaying to {} via {}", target, proxy);
                Ok(tunnel)
            }
            Err(e) => {
                warn!("Failed to reach {} via {}: {:#}", target, proxy, e);
                Err(Socks5ReplyCode::from(&e))
            }
        }
    }
}
