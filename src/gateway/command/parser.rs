//! SOCKS5 request parser
//!
//! Reads the client's request and the target address it names.

use crate::error::Socks5Error;
use crate::gateway::consts::*;
use crate::gateway::types::{SocksCommand, TargetAddr};
use anyhow::{Context, Result};
use std::net::{Ipv4Addr, Ipv6Addr};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Parse a SOCKS5 request from the stream
///
/// ```text
/// +----+-----+-------+------+----------+----------+
/// |VER | CMD |  RSV  | ATYP | DST.ADDR | DST.PORT |
/// +----+-----+-------+------+----------+----------+
/// | 1  |  1  | X'00' |  1   | Variable |    2     |
/// +----+-----+-------+------+----------+----------+
/// ```
///
/// Domain names are returned unresolved; the upstream proxy resolves them.
pub async fn parse_command<S>(stream: &mut S) -> Result<(SocksCommand, TargetAddr)>
where
    S: AsyncRead + Unpin,
{
    let mut header = [0u8; 4];
    stream
        .read_exact(&mut header)
        .await
        .with_context(|| "Failed to read command header")?;

    let version = header[0];
    let cmd_byte = header[1];
    let addr_type = header[3];

    if version != SOCKS5_VERSION {
        return Err(Socks5Error::UnsupportedVersion(version).into());
    }

    let command =
        SocksCommand::from_byte(cmd_byte).ok_or(Socks5Error::CommandNotSupported(cmd_byte))?;

    let target_addr = parse_address(stream, addr_type).await?;

    tracing::debug!("Parsed SOCKS5 command: {} to {}", command, target_addr);

    Ok((command, target_addr))
}

async fn read_port<S>(stream: &mut S) -> Result<u16>
where
    S: AsyncRead + Unpin,
{
    let mut port_buf = [0u8; 2];
    stream.read_exact(&mut port_buf).await?;
    Ok(u16::from_be_bytes(port_buf))
}

async fn parse_address<S>(stream: &mut S, addr_type: u8) -> Result<TargetAddr>
where
    S: AsyncRead + Unpin,
{
    match addr_type {
        SOCKS5_ADDR_TYPE_IPV4 => {
            let mut addr = [0u8; 4];
            stream.read_exact(&mut addr).await?;
            let port = read_port(stream).await?;
            Ok(TargetAddr::ipv4(Ipv4Addr::from(addr), port))
        }

        SOCKS5_ADDR_TYPE_DOMAIN => {
            let domain_len = stream.read_u8().await? as usize;
            if domain_len == 0 {
                return Err(Socks5Error::InvalidDomain("empty".to_string()).into());
            }

            let mut domain_buf = vec![0u8; domain_len];
            stream.read_exact(&mut domain_buf).await?;
            let domain = String::from_utf8(domain_buf)
                .map_err(|_| Socks5Error::InvalidDomain("not UTF-8".to_string()))?;

            let port = read_port(stream).await?;
            Ok(TargetAddr::domain(domain, port))
        }

        SOCKS5_ADDR_TYPE_IPV6 => {
            let mut addr = [0u8; 16];
            stream.read_exact(&mut addr).await?;
            let port = read_port(stream).await?;
            Ok(TargetAddr::ipv6(Ipv6Addr::from(addr), port))
        }

        other => Err(Socks5Error::AddressTypeNotSupported(other).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn request(cmd: u8, addr: &[u8]) -> Vec<u8> {
        let mut request = vec![SOCKS5_VERSION, cmd, SOCKS5_RESERVED];
        request.extend_from_slice(addr);
        request
    }

    #[tokio::test]
    async fn test_parse_command_ipv4() {
        let data = request(
            SOCKS5_CMD_TCP_CONNECT,
            &[SOCKS5_ADDR_TYPE_IPV4, 192, 168, 1, 1, 0x1F, 0x90],
        );
        let mut cursor = Cursor::new(data);

        let (cmd, addr) = parse_command(&mut cursor).await.unwrap();
        assert_eq!(cmd, SocksCommand::Connect);
        assert_eq!(addr, TargetAddr::ipv4(Ipv4Addr::new(192, 168, 1, 1), 8080));
    }

    #[tokio::test]
    async fn test_parse_command_domain_unresolved() {
        let mut addr = vec![SOCKS5_ADDR_TYPE_DOMAIN, 11];
        addr.extend_from_slice(b"example.com");
        addr.extend_from_slice(&443u16.to_be_bytes());
        let mut cursor = Cursor::new(request(SOCKS5_CMD_TCP_CONNECT, &addr));

        let (_, target) = parse_command(&mut cursor).await.unwrap();
        assert_eq!(target, TargetAddr::domain("example.com".to_string(), 443));
    }

    #[tokio::test]
    async fn test_parse_command_ipv6() {
        let mut addr = vec![SOCKS5_ADDR_TYPE_IPV6];
        addr.extend_from_slice(&Ipv6Addr::LOCALHOST.octets());
        addr.extend_from_slice(&80u16.to_be_bytes());
        let mut cursor = Cursor::new(request(SOCKS5_CMD_TCP_CONNECT, &addr));

        let (_, target) = parse_command(&mut cursor).await.unwrap();
        assert_eq!(target, TargetAddr::ipv6(Ipv6Addr::LOCALHOST, 80));
    }

    #[tokio::test]
    async fn test_parse_command_invalid_version() {
        let mut data = request(
            SOCKS5_CMD_TCP_CONNECT,
            &[SOCKS5_ADDR_TYPE_IPV4, 127, 0, 0, 1, 0, 80],
        );
        data[0] = 4;
        let mut cursor = Cursor::new(data);

        let err = parse_command(&mut cursor).await.unwrap_err();
        assert!(err.to_string().contains("version"));
    }

    #[tokio::test]
    async fn test_parse_command_unknown_command() {
        let data = request(0x99, &[SOCKS5_ADDR_TYPE_IPV4, 127, 0, 0, 1, 0, 80]);
        let mut cursor = Cursor::new(data);
        assert!(parse_command(&mut cursor).await.is_err());
    }

    #[tokio::test]
    async fn test_parse_command_bad_address_type() {
        let data = request(SOCKS5_CMD_TCP_CONNECT, &[0x07, 0, 0]);
        let mut cursor = Cursor::new(data);

        let err = parse_command(&mut cursor).await.unwrap_err();
        assert!(err.to_string().contains("Address type"));
    }

    #[tokio::test]
    async fn test_parse_command_empty_domain() {
        let data = request(SOCKS5_CMD_TCP_CONNECT, &[SOCKS5_ADDR_TYPE_DOMAIN, 0, 0, 80]);
        let mut cursor = Cursor::new(data);
        assert!(parse_command(&mut cursor).await.is_err());
    }

    #[tokio::test]
    async fn test_parse_command_udp_associate() {
        let data = request(
            SOCKS5_CMD_UDP_ASSOCIATE,
            &[SOCKS5_ADDR_TYPE_IPV4, 0, 0, 0, 0, 0, 0],
        );
        let mut cursor = Cursor::new(data);

        let (cmd, _) = parse_command(&mut cursor).await.unwrap();
        assert_eq!(cmd, SocksCommand::UdpAssociate);
    }
}
