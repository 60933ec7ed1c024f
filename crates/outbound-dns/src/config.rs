//! DNS resolver configuration.

use std::collections::HashMap;
use std::net::IpAddr;

use outbound_core::defaults::DEFAULT_DNS_CACHE_SIZE;
use serde::{Deserialize, Serialize};

/// DNS resolver configuration.
///
/// When omitted from config files every field has a default: system
/// resolver, IPv4 only, caching enabled, no static hosts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnsConfig {
    /// DNS resolution strategy.
    ///
    /// - `"system"` (default): reads `/etc/resolv.conf` on Unix, system
    ///   DNS settings on Windows.
    /// - `"custom"`: uses the nameservers listed in `servers`.
    #[serde(default)]
    pub strategy: DnsStrategy,

    /// Custom nameservers, only used when `strategy = "custom"`.
    ///
    /// `"udp://8.8.8.8"`, `"udp://8.8.8.8:53"`, `"tcp://[2001:4860::8888]"`.
    /// The port defaults to 53.
    #[serde(default)]
    pub servers: Vec<String>,

    /// Also return IPv6 addresses. When false, AAAA answers are ignored.
    #[serde(default)]
    pub ipv6: bool,

    /// Prefer IPv4 addresses when `ipv6` is enabled and both families answer.
    #[serde(default)]
    pub prefer_ipv4: bool,

    /// DNS cache capacity (number of entries). Set to 0 to disable caching.
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,

    /// Static host table consulted before any query. Keys are exact names or
    /// `*.suffix` wildcards.
    #[serde(default)]
    pub hosts: HashMap<String, IpAddr>,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            strategy: DnsStrategy::default(),
            servers: Vec::new(),
            ipv6: false,
            prefer_ipv4: false,
            cache_size: default_cache_size(),
            hosts: HashMap::new(),
        }
    }
}

/// DNS resolution strategy.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DnsStrategy {
    /// Use the system DNS resolver configuration.
    #[default]
    System,
    /// Use custom nameservers from the `servers` list.
    Custom,
}

fn default_cache_size() -> usize {
    DEFAULT_DNS_CACHE_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_uses_defaults() {
        let cfg: DnsConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.strategy, DnsStrategy::System);
        assert!(!cfg.ipv6);
        assert_eq!(cfg.cache_size, DEFAULT_DNS_CACHE_SIZE);
        assert!(cfg.hosts.is_empty());
    }

    #[test]
    fn hosts_parse_ip_values() {
        let cfg: DnsConfig = serde_json::from_str(
            r#"{"strategy":"custom","servers":["udp://1.1.1.1"],"hosts":{"*.lan":"10.0.0.1","router":"::1"}}"#,
        )
        .unwrap();
        assert_eq!(cfg.strategy, DnsStrategy::Custom);
        assert_eq!(cfg.hosts["*.lan"], "10.0.0.1".parse::<IpAddr>().unwrap());
        assert_eq!(cfg.hosts["router"], "::1".parse::<IpAddr>().unwrap());
    }
}
