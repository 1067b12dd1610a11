//! Sockpool - verified SOCKS5 proxy pool and gateway
//!
//! This is the main entry point for the Sockpool application.

use anyhow::Result;
use clap::Parser;
use sockpool::config::{load_config, Config};
use sockpool::runner::run;
use std::path::PathBuf;
use tokio::sync::broadcast;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Sockpool - validate public SOCKS5 proxies and route through them at random
#[derive(Parser, Debug)]
#[command(name = "sockpool")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Enable JSON logging format
    #[arg(long)]
    json_log: bool,

    /// Gateway listen address, overrides the config file
    #[arg(long)]
    listen: Option<String>,

    /// Candidate list URL or file path, overrides the config file
    #[arg(long)]
    source: Option<String>,

    /// Maximum concurrent probes, overrides the config file
    #[arg(long)]
    concurrency: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(&args.log_level, args.json_log)?;

    let mut config = match &args.config {
        Some(path) => {
            let config = load_config(path)?;
            info!("Configuration loaded from: {:?}", path);
            config
        }
        None => Config::default(),
    };
    apply_overrides(&mut config, &args);

    info!("Sockpool v{}", sockpool::VERSION);
    info!("Candidate source: {}", config.source.location);
    info!("Gateway address: {}", config.gateway.bind_addr);

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    // Handle Ctrl+C and termination signals (cross-platform)
    let shutdown_tx_clone = shutdown_tx.clone();
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => {
                            info!("Received Ctrl+C, shutting down...");
                        }
                        _ = sigterm.recv() => {
                            info!("Received SIGTERM, shutting down...");
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!("Failed to setup SIGTERM handler: {}", e);
                    let _ = tokio::signal::ctrl_c().await;
                    info!("Received Ctrl+C, shutting down...");
                }
            }
        }

        #[cfg(not(unix))]
        {
            // On Windows, only handle Ctrl+C
            let _ = tokio::signal::ctrl_c().await;
            info!("Received Ctrl+C, shutting down...");
        }

        let _ = shutdown_tx_clone.send(true);
    });

    run(config, shutdown_rx).await
}

/// Command line flags win over the config file
fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(listen) = &args.listen {
        config.gateway.bind_addr = listen.clone();
    }
    if let Some(source) = &args.source {
        config.source.location = source.clone();
    }
    if let Some(concurrency) = args.concurrency {
        config.validator.concurrency = concurrency;
    }
}

/// Setup logging based on configuration
fn setup_logging(level: &str, json: bool) -> Result<()> {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    if json {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_win() {
        let args = Args::parse_from([
            "sockpool",
            "--listen",
            "127.0.0.1:9000",
            "--source",
            "list.txt",
            "--concurrency",
            "5",
        ]);
        let mut config = Config::default();
        apply_overrides(&mut config, &args);

        assert_eq!(config.gateway.bind_addr, "127.0.0.1:9000");
        assert_eq!(config.source.location, "list.txt");
        assert_eq!(config.validator.concurrency, 5);
    }

    #[test]
    fn test_no_overrides_keeps_defaults() {
        let args = Args::parse_from(["sockpool"]);
        let mut config = Config::default();
        apply_overrides(&mut config, &args);
        assert_eq!(config.gateway.bind_addr, "0.0.0.0:8088");
        assert_eq!(config.validator.concurrency, 50);
    }
}
