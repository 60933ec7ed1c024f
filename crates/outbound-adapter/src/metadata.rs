//! Destination metadata handed to adapters.

use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// Transport protocol the caller intends to carry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Tcp => f.write_str("tcp"),
            Protocol::Udp => f.write_str("udp"),
        }
    }
}

/// Where a connection should go.
///
/// `host` may be empty when only an address is known. The destination counts
/// as resolved once `dst_ip` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub protocol: Protocol,
    pub host: String,
    pub dst_ip: Option<IpAddr>,
    pub dst_port: u16,
}

impl Metadata {
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self {
            protocol: Protocol::Tcp,
            host: host.into(),
            dst_ip: None,
            dst_port: port,
        }
    }

    pub fn udp(host: impl Into<String>, port: u16) -> Self {
        Self {
            protocol: Protocol::Udp,
            ..Self::tcp(host, port)
        }
    }

    pub fn from_socket_addr(protocol: Protocol, addr: SocketAddr) -> Self {
        Self {
            protocol,
            host: String::new(),
            dst_ip: Some(addr.ip()),
            dst_port: addr.port(),
        }
    }

    /// Parse `host:port` or `ip:port` (IPv6 in brackets).
    pub fn parse(protocol: Protocol, target: &str) -> Option<Self> {
        if let Ok(addr) = target.parse::<SocketAddr>() {
            return Some(Self::from_socket_addr(protocol, addr));
        }
        let (host, port) = target.rsplit_once(':')?;
        if host.is_empty() || host.contains(':') {
            return None;
        }
        let port = port.parse().ok()?;
        Some(Self {
            protocol,
            host: host.to_string(),
            dst_ip: None,
            dst_port: port,
        })
    }

    pub fn with_ip(mut self, ip: IpAddr) -> Self {
        self.dst_ip = Some(ip);
        self
    }

    pub fn resolved(&self) -> bool {
        self.dst_ip.is_some()
    }

    /// The concrete address, if resolved.
    pub fn udp_addr(&self) -> Option<SocketAddr> {
        self.dst_ip.map(|ip| SocketAddr::new(ip, self.dst_port))
    }
}

impl fmt::Display for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.host.is_empty(), self.dst_ip) {
            (false, _) => write!(f, "{}:{}", self.host, self.dst_port),
            (true, Some(ip)) => write!(f, "{}", SocketAddr::new(ip, self.dst_port)),
            (true, None) => write!(f, "<unknown>:{}", self.dst_port),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_forms() {
        let m = Metadata::parse(Protocol::Tcp, "example.com:443").unwrap();
        assert_eq!(m.host, "example.com");
        assert_eq!(m.dst_port, 443);
        assert!(!m.resolved());

        let m = Metadata::parse(Protocol::Udp, "[::1]:53").unwrap();
        assert!(m.host.is_empty());
        assert_eq!(m.udp_addr(), Some("[::1]:53".parse().unwrap()));
        assert_eq!(m.protocol, Protocol::Udp);

        assert!(Metadata::parse(Protocol::Tcp, "example.com").is_none());
        assert!(Metadata::parse(Protocol::Tcp, ":80").is_none());
        assert!(Metadata::parse(Protocol::Tcp, "host:port").is_none());
    }

    #[test]
    fn display_prefers_host() {
        let m = Metadata::tcp("example.com", 80).with_ip("1.2.3.4".parse().unwrap());
        assert_eq!(m.to_string(), "example.com:80");
        let m = Metadata::from_socket_addr(Protocol::Tcp, "1.2.3.4:80".parse().unwrap());
        assert_eq!(m.to_string(), "1.2.3.4:80");
    }
}
