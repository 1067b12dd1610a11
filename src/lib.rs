//! # Sockpool - Verified SOCKS5 Proxy Pool and Gateway
//!
//! Sockpool fetches a list of candidate SOCKS5 proxies, checks each one by
//! fetching a known URL through it, and keeps the survivors in a pool. A
//! local gateway then tunnels every accepted connection through a proxy
//! drawn uniformly at random from that pool.
//!
//! ## Features
//!
//! - **Bounded Validation**: all candidates are probed concurrently behind a
//!   fixed admission limit; results stream out as they complete
//! - **Random Routing**: each gateway connection uses an independently sampled proxy
//! - **SOCKS5 Gateway**: local clients speak no-auth SOCKS5, or relay raw bytes
//!   to a fixed target
//! - **Optional Persistence**: verified proxies can be written to a file that is
//!   recreated on every start
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sockpool::config::load_config;
//! use sockpool::runner::run;
//! use tokio::sync::broadcast;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config("config.toml")?;
//!     let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
//!
//!     run(config, shutdown_rx).await
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Candidate source -> Validator -> Proxy pool
//!                                      |
//! Local client -> Gateway -------------+-> Verified proxy -> Target
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod candidate;
pub mod config;
pub mod error;
pub mod gateway;
pub mod pool;
pub mod runner;
pub mod source;
pub mod validator;

// Re-export commonly used items
pub use candidate::{parse_candidate, Endpoint};
pub use config::{load_config, Config};
pub use error::{Socks5Error, SockpoolError};
pub use gateway::Gateway;
pub use pool::{ProxyPool, VerifiedProxy};
pub use runner::run;
pub use validator::Validator;

/// Version of the Sockpool library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the application
pub const NAME: &str = env!("CARGO_PKG_NAME");
