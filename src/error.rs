//! Error types for Sockpool
//!
//! This module defines all custom error types used throughout the application.

use std::io;
use thiserror::Error;

/// Main error type for Sockpool operations
#[derive(Error, Debug)]
pub enum SockpoolError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Candidate source error
    #[error("Source error: {0}")]
    Source(String),

    /// Reachability probe error
    #[error("Probe error: {0}")]
    Probe(String),

    /// Proxy pool error
    #[error("Pool error: {0}")]
    Pool(String),

    /// Timeout error
    #[error("Timeout: {0}")]
    Timeout(String),

    /// SOCKS5 protocol error
    #[error("SOCKS5 error: {0}")]
    Socks5(#[from] Socks5Error),
}

/// SOCKS5 specific errors
#[derive(Error, Debug)]
pub enum Socks5Error {
    /// Unsupported SOCKS version
    #[error("Unsupported SOCKS version: {0}")]
    UnsupportedVersion(u8),

    /// No acceptable authentication method
    #[error("No acceptable authentication method")]
    NoAcceptableMethod,

    /// Command not supported
    #[error("Command not supported: {0}")]
    CommandNotSupported(u8),

    /// Address type not supported
    #[error("Address type not supported: {0}")]
    AddressTypeNotSupported(u8),

    /// Invalid domain name
    #[error("Invalid domain name: {0}")]
    InvalidDomain(String),

    /// Upstream proxy refused or failed the tunnel
    #[error("Upstream proxy error: {0}")]
    Upstream(String),
}

/// Reply codes for SOCKS5 protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Socks5ReplyCode {
    /// Command succeeded
    Succeeded = 0x00,
    /// General SOCKS server failure
    GeneralFailure = 0x01,
    /// Connection not allowed by ruleset
    ConnectionNotAllowed = 0x02,
    /// Network unreachable
    NetworkUnreachable = 0x03,
    /// Host unreachable
    HostUnreachable = 0x04,
    /// Connection refused
    ConnectionRefused = 0x05,
    /// TTL expired
    TtlExpired = 0x06,
    /// Command not supported
    CommandNotSupported = 0x07,
    /// Address type not supported
    AddressTypeNotSupported = 0x08,
}

impl From<Socks5ReplyCode> for u8 {
    fn from(code: Socks5ReplyCode) -> Self {
        code as u8
    }
}

impl From<&Socks5Error> for Socks5ReplyCode {
    /// Map a rejected client request to its reply
    fn from(err: &Socks5Error) -> Self {
        match err {
            Socks5Error::CommandNotSupported(_) => Socks5ReplyCode::CommandNotSupported,
            Socks5Error::AddressTypeNotSupported(_) => Socks5ReplyCode::AddressTypeNotSupported,
            _ => Socks5ReplyCode::GeneralFailure,
        }
    }
}

impl From<&io::Error> for Socks5ReplyCode {
    fn from(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionRefused => Socks5ReplyCode::ConnectionRefused,
            io::ErrorKind::TimedOut => Socks5ReplyCode::HostUnreachable,
            io::ErrorKind::AddrNotAvailable => Socks5ReplyCode::HostUnreachable,
            io::ErrorKind::PermissionDenied => Socks5ReplyCode::ConnectionNotAllowed,
            _ => Socks5ReplyCode::GeneralFailure,
        }
    }
}

impl From<&anyhow::Error> for Socks5ReplyCode {
    /// Map a dial failure to the reply sent back to the local client
    fn from(err: &anyhow::Error) -> Self {
        if let Some(io_err) = err.downcast_ref::<io::Error>() {
            return Socks5ReplyCode::from(io_err);
        }
        if let Some(socks_err) = err.downcast_ref::<Socks5Error>() {
            return Socks5ReplyCode::from(socks_err);
        }
        match err.downcast_ref::<SockpoolError>() {
            Some(SockpoolError::Timeout(_)) => Socks5ReplyCode::HostUnreachable,
            Some(SockpoolError::Io(io_err)) => Socks5ReplyCode::from(io_err),
            Some(SockpoolError::Socks5(socks_err)) => Socks5ReplyCode::from(socks_err),
            _ => Socks5ReplyCode::GeneralFailure,
        }
    }
}
