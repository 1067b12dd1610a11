//! Gateway listener
//!
//! Accepts local connections forever and runs one relay session per
//! connection, with no admission limit.

use super::session::{SessionHandler, SessionOutcome};
use crate::config::GatewayConfig;
use crate::pool::ProxyPool;
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// A bound gateway, ready to serve
#[derive(Debug)]
pub struct Gateway {
    listener: TcpListener,
    handler: Arc<SessionHandler>,
}

impl Gateway {
    /// Bind the listen address from configuration
    ///
    /// A bind failure is returned to the caller and should end the process.
    pub async fn bind(config: &GatewayConfig, pool: Arc<ProxyPool>) -> Result<Self> {
        let handler = SessionHandler::from_config(config, pool)?;
        let listener = TcpListener::bind(&config.bind_addr)
            .await
            .with_context(|| format!("Failed to bind gateway on {}", config.bind_addr))?;

        Ok(Gateway {
            listener,
            handler: Arc::new(handler),
        })
    }

    /// Address the listener is actually bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until a shutdown signal arrives
    ///
    /// Accept errors are logged and do not stop the loop. Sessions already
    /// running are left to finish on their own.
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<bool>) -> Result<()> {
        info!("Gateway listening on {}", self.local_addr()?);

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            warn!("Failed to accept connection: {}", e);
                            continue;
                        }
                    };
                    debug!("Accepted connection from {}", peer);

                    let handler = self.handler.clone();
                    tokio::spawn(async move {
                        match handler.handle(stream, peer).await {
                            Ok(SessionOutcome::Relayed(proxy)) => {
                                debug!("Session from {} via {} closed", peer, proxy);
                            }
                            Ok(outcome) => debug!("Session from {} ended: {:?}", peer, outcome),
                            Err(e) => warn!("Session from {} failed: {:#}", peer, e),
                        }
                    });
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received, stopping gateway");
                    break;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpStream;

    fn local_config() -> GatewayConfig {
        GatewayConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_bind_failure_is_error() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = GatewayConfig {
            bind_addr: taken.local_addr().unwrap().to_string(),
            ..Default::default()
        };

        let pool = Arc::new(ProxyPool::in_memory());
        assert!(Gateway::bind(&config, pool).await.is_err());
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let pool = Arc::new(ProxyPool::in_memory());
        pool.reset().await.unwrap();
        let gateway = Gateway::bind(&local_config(), pool).await.unwrap();

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let server = tokio::spawn(gateway.run(shutdown_rx));

        shutdown_tx.send(true).unwrap();
        let result = tokio::time::timeout(Duration::from_secs(1), server)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_keeps_accepting_after_empty_pool_sessions() {
        let pool = Arc::new(ProxyPool::in_memory());
        pool.reset().await.unwrap();
        let gateway = Gateway::bind(&local_config(), pool).await.unwrap();
        let addr = gateway.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let server = tokio::spawn(gateway.run(shutdown_rx));

        for _ in 0..3 {
            let mut client = TcpStream::connect(addr).await.unwrap();
            let mut buf = Vec::new();
            let n = tokio::time::timeout(Duration::from_secs(1), client.read_to_end(&mut buf))
                .await
                .unwrap()
                .unwrap();
            assert_eq!(n, 0);
        }

        shutdown_tx.send(true).unwrap();
        server.await.unwrap().unwrap();
    }
}
