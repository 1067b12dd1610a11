//! SOCKS5 reply builder
//!
//! Constructs SOCKS5 reply messages.

use crate::error::Socks5ReplyCode;
use crate::gateway::consts::*;
use anyhow::Result;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Build and send a SOCKS5 reply
///
/// ```text
/// +----+-----+-------+------+----------+----------+
/// |VER | REP |  RSV  | ATYP | BND.ADDR | BND.PORT |
/// +----+-----+-------+------+----------+----------+
/// | 1  |  1  | X'00' |  1   | Variable |    2     |
/// +----+-----+-------+------+----------+----------+
/// ```
///
/// `bind_addr` defaults to `0.0.0.0:0`.
pub async fn send_reply<S>(
    stream: &mut S,
    code: Socks5ReplyCode,
    bind_addr: Option<SocketAddr>,
) -> Result<()>
where
    S: AsyncWrite + Unpin,
{
    stream.write_all(&reply_bytes(code, bind_addr)).await?;
    stream.flush().await?;
    Ok(())
}

/// Send a success reply
pub async fn send_success<S>(stream: &mut S, bind_addr: Option<SocketAddr>) -> Result<()>
where
    S: AsyncWrite + Unpin,
{
    send_reply(stream, Socks5ReplyCode::Succeeded, bind_addr).await
}

fn reply_bytes(code: Socks5ReplyCode, bind_addr: Option<SocketAddr>) -> Vec<u8> {
    let bind_addr =
        bind_addr.unwrap_or_else(|| SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0));

    let mut reply = vec![SOCKS5_VERSION, code.into(), SOCKS5_RESERVED];

    match bind_addr {
        SocketAddr::V4(addr) => {
            reply.push(SOCKS5_ADDR_TYPE_IPV4);
            reply.extend_from_slice(&addr.ip().octets());
            reply.extend_from_slice(&addr.port().to_be_bytes());
        }
        SocketAddr::V6(addr) => {
            reply.push(SOCKS5_ADDR_TYPE_IPV6);
            reply.extend_from_slice(&addr.ip().octets());
            reply.extend_from_slice(&addr.port().to_be_bytes());
        }
    }

    reply
}
