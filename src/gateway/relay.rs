//! Bidirectional byte relay
//!
//! Both copy directions run inside one future. The first direction to finish
//! (EOF or error) ends the session; the other is dropped with both streams,
//! which closes both sockets.

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

/// Which side ended a relay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayEnd {
    /// The inbound client stopped sending (or failed)
    Inbound,
    /// The upstream tunnel stopped sending (or failed)
    Upstream,
}

/// Relay data between an inbound connection and an upstream tunnel
///
/// Returns once either direction encounters EOF or an error.
pub async fn relay_tcp<A, B>(inbound: A, upstream: B) -> RelayEnd
where
    A: AsyncRead + AsyncWrite + Unpin,
    B: AsyncRead + AsyncWrite + Unpin,
{
    let (mut in_read, mut in_write) = tokio::io::split(inbound);
    let (mut up_read, mut up_write) = tokio::io::split(upstream);

    let to_upstream = tokio::io::copy(&mut in_read, &mut up_write);
    let to_inbound = tokio::io::copy(&mut up_read, &mut in_write);

    tokio::select! {
        result = to_upstream => {
            match result {
                Ok(bytes) => debug!("Inbound->upstream finished: {} bytes", bytes),
                Err(e) => debug!("Inbound->upstream error: {}", e),
            }
            RelayEnd::Inbound
        }
        result = to_inbound => {
            match result {
                Ok(bytes) => debug!("Upstream->inbound finished: {} bytes", bytes),
                Err(e) => debug!("Upstream->inbound error: {}", e),
            }
            RelayEnd::Upstream
        }
    }
}
