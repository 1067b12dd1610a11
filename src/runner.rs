//! Process lifecycle
//!
//! Fetch candidates, validate them into a fresh pool, then serve the gateway
//! until shutdown.

use crate::config::Config;
use crate::gateway::Gateway;
use crate::pool::ProxyPool;
use crate::source::{create_source, CandidateSource};
use crate::validator::Validator;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_stream::StreamExt;
use tracing::{error, info, warn};

/// Fill the pool with every candidate that passes validation
///
/// Each live endpoint is inserted as soon as its probe succeeds. A failed
/// insert is logged and skipped. Returns the number of proxies inserted.
pub async fn populate_pool(
    source: &dyn CandidateSource,
    validator: &Validator,
    pool: &ProxyPool,
) -> Result<usize> {
    let candidates = source
        .fetch()
        .await
        .context("Failed to fetch candidate list")?;
    info!("Fetched {} candidates", candidates.len());

    let mut live = validator.validate(candidates);
    let mut inserted = 0;

    while let Some(endpoint) = live.next().await {
        match pool.insert(endpoint.clone()).await {
            Ok(record) => {
                inserted += 1;
                info!("Stored proxy #{}: {}", record.id, record.endpoint);
            }
            Err(e) => warn!("Failed to store proxy {}: {:#}", endpoint, e),
        }
    }

    pool.stats().log_summary();
    Ok(inserted)
}

/// Run the whole process until shutdown
pub async fn run(config: Config, mut shutdown_rx: broadcast::Receiver<bool>) -> Result<()> {
    config.validate()?;

    let pool = Arc::new(ProxyPool::from_config(&config.pool));
    pool.reset().await.context("Failed to initialize proxy pool")?;

    let source = create_source(&config.source.location)?;
    let validator = Validator::from_config(&config.validator);

    info!("Loading candidates from {}", config.source.location);
    tokio::select! {
        result = populate_pool(source.as_ref(), &validator, &pool) => {
            let inserted = result?;
            if inserted == 0 {
                warn!("No candidate passed validation; the gateway will refuse every connection");
            } else {
                info!("{} verified proxies ready", inserted);
            }
        }
        _ = shutdown_rx.recv() => {
            info!("Shutdown signal received during validation");
            return Ok(());
        }
    }

    let gateway = Gateway::bind(&config.gateway, pool).await?;
    if let Err(e) = gateway.run(shutdown_rx).await {
        error!("Gateway error: {:#}", e);
        return Err(e);
    }

    info!("Sockpool stopped");
    Ok(())
}
