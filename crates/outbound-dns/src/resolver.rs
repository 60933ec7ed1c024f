//! Async DNS resolver backed by hickory-resolver.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hickory_proto::xfer::Protocol;
use hickory_resolver::Resolver;
use hickory_resolver::config::{
    LookupIpStrategy, NameServerConfig, NameServerConfigGroup, ResolverConfig, ResolverOpts,
};
use hickory_resolver::name_server::TokioConnectionProvider;
use outbound_core::defaults::DEFAULT_DNS_TIMEOUT_SECS;
use tracing::debug;

use crate::config::{DnsConfig, DnsStrategy};
use crate::error::DnsError;
use crate::hosts::StaticHosts;
use crate::traits::IpResolver;

/// Shared async DNS resolver.
///
/// Lookup order: static hosts, IP literal, then a cached hickory query.
/// Thread-safe and cheaply cloneable (wraps `Arc` internally).
#[derive(Clone)]
pub struct DnsResolver {
    inner: Arc<Inner>,
}

struct Inner {
    resolver: Resolver<TokioConnectionProvider>,
    hosts: StaticHosts,
    ipv6: bool,
    prefer_ipv4: bool,
}

impl std::fmt::Debug for DnsResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DnsResolver")
            .field("ipv6", &self.inner.ipv6)
            .field("prefer_ipv4", &self.inner.prefer_ipv4)
            .finish()
    }
}

impl DnsResolver {
    /// Build a resolver from configuration.
    ///
    /// Call once at startup and share via `Clone`.
    pub fn new(config: &DnsConfig) -> Result<Self, DnsError> {
        let resolver = match config.strategy {
            DnsStrategy::System => {
                let mut builder = Resolver::builder_tokio()
                    .map_err(|e| DnsError::InvalidServer(format!("system config: {e}")))?;
                apply_options(builder.options_mut(), config);
                builder.build()
            }
            DnsStrategy::Custom => {
                let name_servers = parse_server_urls(&config.servers)?;
                let resolver_config = ResolverConfig::from_parts(None, vec![], name_servers);
                let mut builder = Resolver::builder_with_config(
                    resolver_config,
                    TokioConnectionProvider::default(),
                );
                apply_options(builder.options_mut(), config);
                builder.build()
            }
        };

        Ok(Self {
            inner: Arc::new(Inner {
                resolver,
                hosts: StaticHosts::new(&config.hosts),
                ipv6: config.ipv6,
                prefer_ipv4: config.prefer_ipv4,
            }),
        })
    }

    /// Resolve `"host:port"` to a `SocketAddr`.
    pub async fn resolve(&self, addr: &str) -> Result<SocketAddr, DnsError> {
        if let Ok(sa) = addr.parse::<SocketAddr>() {
            return Ok(sa);
        }
        let (host, port) = split_host_port(addr)?;
        let ip = self.resolve_ip(host).await?;
        Ok(SocketAddr::new(ip, port))
    }

    fn pick(&self, ips: impl Iterator<Item = IpAddr>) -> Option<IpAddr> {
        let mut first_v6 = None;
        for ip in ips {
            match ip {
                IpAddr::V4(_) => return Some(ip),
                IpAddr::V6(_) if !self.inner.ipv6 => continue,
                IpAddr::V6(_) if !self.inner.prefer_ipv4 => return Some(ip),
                IpAddr::V6(_) => {
                    first_v6.get_or_insert(ip);
                }
            }
        }
        first_v6
    }
}

#[async_trait]
impl IpResolver for DnsResolver {
    async fn resolve_ip(&self, host: &str) -> Result<IpAddr, DnsError> {
        if let Some(ip) = self.inner.hosts.lookup(host) {
            debug!(host = %host, resolved = %ip, "static host");
            return Ok(ip);
        }

        let literal = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);
        if let Ok(ip) = literal.parse::<IpAddr>() {
            return Ok(ip);
        }

        let response = match self.inner.resolver.lookup_ip(host).await {
            Ok(response) => response,
            Err(e) => {
                debug!(host = %host, error = %e, "dns lookup failed");
                return Err(DnsError::NotFound(host.to_string()));
            }
        };

        match self.pick(response.iter()) {
            Some(ip) => {
                debug!(host = %host, resolved = %ip, "dns resolved");
                Ok(ip)
            }
            None => Err(DnsError::NotFound(host.to_string())),
        }
    }
}

fn apply_options(opts: &mut ResolverOpts, config: &DnsConfig) {
    opts.cache_size = config.cache_size;
    opts.timeout = Duration::from_secs(DEFAULT_DNS_TIMEOUT_SECS);
    opts.ip_strategy = match (config.ipv6, config.prefer_ipv4) {
        (false, _) => LookupIpStrategy::Ipv4Only,
        (true, true) => LookupIpStrategy::Ipv4thenIpv6,
        (true, false) => LookupIpStrategy::Ipv4AndIpv6,
    };
}

/// Split `"host:port"` into (host, port).
///
/// Handles IPv6 bracket notation: `"[::1]:443"` → `("::1", 443)`.
pub(crate) fn split_host_port(addr: &str) -> Result<(&str, u16), DnsError> {
    let invalid = || DnsError::InvalidAddress(addr.to_string());
    let (host, port) = match addr.strip_prefix('[') {
        Some(rest) => rest.split_once("]:").ok_or_else(invalid)?,
        None => {
            let (host, port) = addr.rsplit_once(':').ok_or_else(invalid)?;
            if host.contains(':') {
                return Err(invalid());
            }
            (host, port)
        }
    };
    if host.is_empty() {
        return Err(invalid());
    }
    let port = port.parse::<u16>().map_err(|_| invalid())?;
    Ok((host, port))
}

/// Parse `udp://` / `tcp://` nameserver URLs.
fn parse_server_urls(urls: &[String]) -> Result<NameServerConfigGroup, DnsError> {
    let mut configs = Vec::with_capacity(urls.len());

    for url in urls {
        let (scheme, rest) = url
            .split_once("://")
            .ok_or_else(|| DnsError::InvalidServer(format!("missing scheme: {url}")))?;
        let protocol = match scheme {
            "udp" => Protocol::Udp,
            "tcp" => Protocol::Tcp,
            _ => {
                return Err(DnsError::InvalidServer(format!(
                    "unsupported protocol: {scheme}"
                )));
            }
        };
        configs.push(NameServerConfig::new(parse_server_addr(rest)?, protocol));
    }

    if configs.is_empty() {
        return Err(DnsError::InvalidServer(
            "no dns servers configured".to_string(),
        ));
    }

    Ok(NameServerConfigGroup::from(configs))
}

/// Nameservers must be IP literals with an optional port (default 53).
fn parse_server_addr(s: &str) -> Result<SocketAddr, DnsError> {
    if let Ok(sa) = s.parse::<SocketAddr>() {
        return Ok(sa);
    }
    let bare = s
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(s);
    let ip = bare
        .parse::<IpAddr>()
        .map_err(|_| DnsError::InvalidServer(format!("nameserver must be an IP: {s}")))?;
    Ok(SocketAddr::new(ip, 53))
}
