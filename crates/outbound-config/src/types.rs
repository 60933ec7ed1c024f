//! Configuration type definitions.

use std::collections::HashMap;

use outbound_dns::DnsConfig;
use serde::{Deserialize, Serialize};

use crate::defaults::*;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub proxies: Vec<ProxyConfig>,
    #[serde(default)]
    pub dns: DnsConfig,
    #[serde(default)]
    pub tcp: TcpConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// One outbound proxy record, tagged by its `type` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ProxyConfig {
    Vless(VlessConfig),
    Reject(RejectConfig),
    RejectDrop(RejectConfig),
}

impl ProxyConfig {
    pub fn name(&self) -> &str {
        match self {
            ProxyConfig::Vless(c) => &c.name,
            ProxyConfig::Reject(c) | ProxyConfig::RejectDrop(c) => &c.name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VlessConfig {
    pub name: String,
    pub server: String,
    pub port: u16,
    /// Account UUID. Checked when the adapter is built, not at load time.
    pub uuid: String,
    #[serde(default)]
    pub udp: bool,
    #[serde(flatten)]
    pub transport: TransportConfig,
}

impl VlessConfig {
    /// `server:port`, bracketing bare IPv6 literals.
    pub fn server_addr(&self) -> String {
        if self.server.contains(':') && !self.server.starts_with('[') {
            format!("[{}]:{}", self.server, self.port)
        } else {
            format!("{}:{}", self.server, self.port)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectConfig {
    pub name: String,
}

/// Transport layering for one proxy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TransportConfig {
    #[serde(default)]
    pub network: Network,
    #[serde(default)]
    pub tls: bool,
    #[serde(default)]
    pub skip_cert_verify: bool,
    /// SNI and verification name override.
    #[serde(default, rename = "servername")]
    pub server_name: Option<String>,
    #[serde(default = "default_ws_path")]
    pub ws_path: String,
    /// Extra upgrade request headers. Only used when `network` is `ws`.
    #[serde(default)]
    pub ws_headers: HashMap<String, String>,
    /// PEM file with extra trust anchors. Falls back to webpki roots.
    #[serde(default)]
    pub ca: Option<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            network: Network::default(),
            tls: false,
            skip_cert_verify: false,
            server_name: None,
            ws_path: default_ws_path(),
            ws_headers: HashMap::new(),
            ca: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    #[serde(alias = "raw")]
    Tcp,
    #[serde(alias = "websocket")]
    Ws,
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Network::Tcp => f.write_str("tcp"),
            Network::Ws => f.write_str("ws"),
        }
    }
}

/// TCP socket options for connections to proxy servers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TcpConfig {
    /// Enable TCP_NODELAY (disable Nagle's algorithm).
    #[serde(default = "default_tcp_no_delay")]
    pub no_delay: bool,
    /// TCP Keep-Alive interval in seconds. 0 disables keep-alive.
    #[serde(default = "default_tcp_keepalive_secs")]
    pub keepalive_secs: u64,
}

impl Default for TcpConfig {
    fn default() -> Self {
        Self {
            no_delay: default_tcp_no_delay(),
            keepalive_secs: default_tcp_keepalive_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: Option<String>,
    /// Log format: json, pretty, or compact. Default: pretty.
    pub format: Option<String>,
    /// Output target: stdout or stderr. Default: stderr.
    pub output: Option<String>,
    /// Per-module log level filters (e.g., {"outbound_adapter": "debug", "rustls": "warn"}).
    #[serde(default)]
    pub filters: HashMap<String, String>,
}
