//! Local forwarding gateway
//!
//! Accepts local connections and tunnels each through a proxy drawn at random
//! from the pool. In SOCKS5 mode the gateway is itself a minimal no-auth
//! SOCKS5 server and takes the target from the client's CONNECT request; in
//! fixed mode it relays raw bytes to one configured target.
//!
//! ```text
//! Local client -> Gateway -> Verified proxy -> Target
//! ```

pub mod command;
pub mod consts;
pub mod handshake;
pub mod relay;
pub mod server;
pub mod session;
pub mod types;
pub mod upstream;

pub use relay::{relay_tcp, RelayEnd};
pub use server::Gateway;
pub use session::{SessionHandler, SessionOutcome, TargetSource};
pub use types::{SocksCommand, TargetAddr};
pub use upstream::{SocketOpts, Tunnel, UpstreamDialer};
