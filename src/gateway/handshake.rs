//! Method negotiation with local clients
//!
//! The gateway is unauthenticated: a client must offer the "no
//! authentication" method or the connection is refused.

use super::consts::*;
use crate::error::Socks5Error;
use anyhow::Result;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Read the client greeting and select "no authentication"
///
/// ```text
/// +----+----------+----------+
/// |VER | NMETHODS | METHODS  |
/// +----+----------+----------+
/// | 1  |    1     | 1 to 255 |
/// +----+----------+----------+
/// ```
pub async fn negotiate<S>(stream: &mut S) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buf = [0u8; 2];
    stream.read_exact(&mut buf).await?;

    let version = buf[0];
    let num_methods = buf[1] as usize;

    if version != SOCKS5_VERSION {
        return Err(Socks5Error::UnsupportedVersion(version).into());
    }

    let mut methods = vec![0u8; num_methods];
    stream.read_exact(&mut methods).await?;

    if !methods.contains(&SOCKS5_AUTH_METHOD_NONE) {
        stream
            .write_all(&[SOCKS5_VERSION, SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE])
            .await?;
        stream.flush().await?;
        return Err(Socks5Error::NoAcceptableMethod.into());
    }

    stream
        .write_all(&[SOCKS5_VERSION, SOCKS5_AUTH_METHOD_NONE])
        .await?;
    stream.flush().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    #[tokio::test]
    async fn test_negotiate_no_auth() {
        let (mut client, mut server) = duplex(64);

        client
            .write_all(&[SOCKS5_VERSION, 2, 0x02, SOCKS5_AUTH_METHOD_NONE])
            .await
            .unwrap();
        negotiate(&mut server).await.unwrap();

        let mut reply = [0u8; 2];
        client.read_exact(&mut reply).await.unwrap();
        assert_eq!(reply, [SOCKS5_VERSION, SOCKS5_AUTH_METHOD_NONE]);
    }

    #[tokio::test]
    async fn test_negotiate_exact_exchange() {
        let mut stream = tokio_test::io::Builder::new()
            .read(&[SOCKS5_VERSION, 1, SOCKS5_AUTH_METHOD_NONE])
            .write(&[SOCKS5_VERSION, SOCKS5_AUTH_METHOD_NONE])
            .build();

        negotiate(&mut stream).await.unwrap();
    }

    #[tokio::test]
    async fn test_negotiate_rejects_password_only() {
        let (mut client, mut server) = duplex(64);

        client.write_all(&[SOCKS5_VERSION, 1, 0x02]).await.unwrap();
        let err = negotiate(&mut server).await.unwrap_err();
        assert!(err.to_string().contains("acceptable"));

        let mut reply = [0u8; 2];
        client.read_exact(&mut reply).await.unwrap();
        assert_eq!(reply, [SOCKS5_VERSION, SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE]);
    }

    #[tokio::test]
    async fn test_negotiate_rejects_socks4() {
        let (mut client, mut server) = duplex(64);

        client.write_all(&[0x04, 1, 0x00]).await.unwrap();
        let err = negotiate(&mut server).await.unwrap_err();
        assert!(err.to_string().contains("version"));
    }

    #[tokio::test]
    async fn test_negotiate_truncated_greeting() {
        let (mut client, mut server) = duplex(64);

        client.write_all(&[SOCKS5_VERSION]).await.unwrap();
        drop(client);
        assert!(negotiate(&mut server).await.is_err());
    }
}
