//! Candidate parsing
//!
//! A candidate is a raw `host:port` line from a candidate source. Only lines
//! that split into exactly two non-empty parts with a numeric port become an
//! [`Endpoint`]; everything else is dropped before any network test.

use std::fmt;
use std::str::FromStr;

use crate::error::SockpoolError;

/// A structurally valid proxy address
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    /// Create an endpoint, rejecting an empty host or a zero port
    pub fn new(host: impl Into<String>, port: u16) -> Option<Self> {
        let host = host.into();
        if host.is_empty() || port == 0 {
            return None;
        }
        Some(Endpoint { host, port })
    }

    /// Host part
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port part
    pub fn port(&self) -> u16 {
        self.port
    }

    /// URL for routing an HTTP client through this endpoint as a SOCKS5 proxy
    pub fn socks5_url(&self) -> String {
        format!("socks5://{}", self)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for Endpoint {
    type Err = SockpoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_candidate(s)
            .ok_or_else(|| SockpoolError::Config(format!("not a host:port pair: {:?}", s)))
    }
}

/// Parse one candidate line
///
/// Surrounding whitespace (including a trailing `\r`) is ignored.
pub fn parse_candidate(line: &str) -> Option<Endpoint> {
    let mut parts = line.trim().split(':');
    let host = parts.next()?;
    let port = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    let port = port.parse::<u16>().ok()?;
    Endpoint::new(host, port)
}

/// Split a newline-delimited body into raw candidate strings, skipping blank lines
pub fn split_candidates(body: &str) -> Vec<String> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_candidate_valid() {
        let endpoint = parse_candidate("127.0.0.1:9050").unwrap();
        assert_eq!(endpoint.host(), "127.0.0.1");
        assert_eq!(endpoint.port(), 9050);
        assert_eq!(endpoint.to_string(), "127.0.0.1:9050");
    }

    #[test]
    fn test_parse_candidate_trims() {
        let endpoint = parse_candidate("  proxy.example.com:1080\r").unwrap();
        assert_eq!(endpoint.host(), "proxy.example.com");
        assert_eq!(endpoint.port(), 1080);
    }

    #[test]
    fn test_parse_candidate_rejects_malformed() {
        let malformed = [
            "",
            "not-a-proxy",
            ":1080",
            "127.0.0.1:",
            "1.2.3.4:80:90",
            "::1:1080",
            "host:port",
            "host:70000",
            "host:0",
        ];
        for line in malformed {
            assert!(parse_candidate(line).is_none(), "accepted {:?}", line);
        }
    }

    #[test]
    fn test_endpoint_from_str() {
        let endpoint: Endpoint = "10.0.0.1:1080".parse().unwrap();
        assert_eq!(endpoint, Endpoint::new("10.0.0.1", 1080).unwrap());
        assert!("bogus".parse::<Endpoint>().is_err());
    }

    #[test]
    fn test_endpoint_socks5_url() {
        let endpoint = Endpoint::new("10.0.0.1", 1080).unwrap();
        assert_eq!(endpoint.socks5_url(), "socks5://10.0.0.1:1080");
    }

    #[test]
    fn test_endpoint_new_rejects_empty() {
        assert!(Endpoint::new("", 1080).is_none());
        assert!(Endpoint::new("host", 0).is_none());
    }

    #[test]
    fn test_split_candidates() {
        let body = "1.1.1.1:1080\n\n  2.2.2.2:1080 \r\n\nbad\n";
        assert_eq!(
            split_candidates(body),
            vec!["1.1.1.1:1080", "2.2.2.2:1080", "bad"]
        );
    }
}
