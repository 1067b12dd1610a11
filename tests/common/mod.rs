//! Test utilities and mocks for Sockpool
//!
//! Local stand-ins for the outside world: a SOCKS5 proxy, the HTTP endpoint
//! probes fetch through it, and an echo target.

#![allow(dead_code)]

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Create a test TCP listener on an available port
pub async fn create_test_listener() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

/// An address nothing is listening on
pub async fn refused_addr() -> SocketAddr {
    let (listener, addr) = create_test_listener().await;
    drop(listener);
    addr
}

/// A running mock SOCKS5 proxy
pub struct MockProxy {
    /// Listen address
    pub addr: SocketAddr,
    /// Number of CONNECT requests served
    pub connects: Arc<AtomicUsize>,
}

impl MockProxy {
    /// `host:port` candidate line for this proxy
    pub fn candidate(&self) -> String {
        self.addr.to_string()
    }

    /// CONNECT requests served so far
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

/// Start a no-auth SOCKS5 proxy that serves CONNECT to any IPv4, IPv6 or
/// `localhost` target
pub async fn spawn_mock_proxy() -> MockProxy {
    let (listener, addr) = create_test_listener().await;
    let connects = Arc::new(AtomicUsize::new(0));

    let counter = connects.clone();
    tokio::spawn(async move {
        loop {
            let (socket, _) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(_) => break,
            };
            let counter = counter.clone();
            tokio::spawn(async move {
                let _ = serve_socks5(socket, counter).await;
            });
        }
    });

    MockProxy { addr, connects }
}

async fn serve_socks5(mut client: TcpStream, connects: Arc<AtomicUsize>) -> std::io::Result<()> {
    let mut greeting = [0u8; 2];
    client.read_exact(&mut greeting).await?;
    let mut methods = vec![0u8; greeting[1] as usize];
    client.read_exact(&mut methods).await?;
    if greeting[0] != 0x05 || !methods.contains(&0x00) {
        client.write_all(&[0x05, 0xFF]).await?;
        return Ok(());
    }
    client.write_all(&[0x05, 0x00]).await?;

    let mut header = [0u8; 4];
    client.read_exact(&mut header).await?;
    let target = match header[3] {
        0x01 => {
            let mut ip = [0u8; 4];
            client.read_exact(&mut ip).await?;
            let port = client.read_u16().await?;
            SocketAddr::from((Ipv4Addr::from(ip), port))
        }
        0x04 => {
            let mut ip = [0u8; 16];
            client.read_exact(&mut ip).await?;
            let port = client.read_u16().await?;
            SocketAddr::from((Ipv6Addr::from(ip), port))
        }
        0x03 => {
            let len = client.read_u8().await? as usize;
            let mut name = vec![0u8; len];
            client.read_exact(&mut name).await?;
            let port = client.read_u16().await?;
            if name != b"localhost" {
                // Host unreachable
                client.write_all(&[0x05, 0x04, 0x00, 0x01, 0, 0, 0, 0, 0, 0]).await?;
                return Ok(());
            }
            SocketAddr::from((Ipv4Addr::LOCALHOST, port))
        }
        _ => {
            client.write_all(&[0x05, 0x08, 0x00, 0x01, 0, 0, 0, 0, 0, 0]).await?;
            return Ok(());
        }
    };

    let mut upstream = match TcpStream::connect(target).await {
        Ok(stream) => stream,
        Err(_) => {
            client.write_all(&[0x05, 0x05, 0x00, 0x01, 0, 0, 0, 0, 0, 0]).await?;
            return Ok(());
        }
    };

    connects.fetch_add(1, Ordering::SeqCst);
    client.write_all(&[0x05, 0x00, 0x00, 0x01, 0, 0, 0, 0, 0, 0]).await?;
    let _ = tokio::io::copy_bidirectional(&mut client, &mut upstream).await;
    Ok(())
}

/// Start an HTTP server answering every request with `200 OK`
pub async fn spawn_http_ok() -> SocketAddr {
    let (listener, addr) = create_test_listener().await;

    tokio::spawn(async move {
        loop {
            let (mut socket, _) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(_) => break,
            };
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                loop {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                    if request.windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }
                let _ = socket
                    .write_all(
                        b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok",
                    )
                    .await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// Start a TCP server that writes back whatever it reads
pub async fn spawn_echo_server() -> SocketAddr {
    let (listener, addr) = create_test_listener().await;

    tokio::spawn(async move {
        loop {
            let (mut socket, _) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(_) => break,
            };
            tokio::spawn(async move {
                let (mut reader, mut writer) = socket.split();
                let _ = tokio::io::copy(&mut reader, &mut writer).await;
            });
        }
    });

    addr
}

/// Perform the client side of a no-auth SOCKS5 CONNECT to an IPv4 target and
/// return the reply code
pub async fn socks5_connect(stream: &mut TcpStream, target: SocketAddr) -> u8 {
    stream.write_all(&[0x05, 0x01, 0x00]).await.unwrap();
    let mut method = [0u8; 2];
    stream.read_exact(&mut method).await.unwrap();
    assert_eq!(method, [0x05, 0x00]);

    let ip = match target {
        SocketAddr::V4(v4) => v4.ip().octets(),
        SocketAddr::V6(_) => panic!("IPv4 targets only"),
    };
    let mut request = vec![0x05, 0x01, 0x00, 0x01];
    request.extend_from_slice(&ip);
    request.extend_from_slice(&target.port().to_be_bytes());
    stream.write_all(&request).await.unwrap();

    let mut reply = [0u8; 10];
    stream.read_exact(&mut reply).await.unwrap();
    reply[1]
}
