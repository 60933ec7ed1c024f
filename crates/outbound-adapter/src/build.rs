//! Adapter construction from configuration.

use std::collections::HashMap;
use std::sync::Arc;

use outbound_config::{Config, ProxyConfig};
use outbound_dns::{DnsResolver, IpResolver};
use outbound_transport::{Dialer, SessionCache, TcpDialer};
use tracing::{debug, warn};

use crate::adapter::ProxyAdapter;
use crate::error::AdapterError;
use crate::reject::Reject;
use crate::vless::VlessAdapter;

/// Shared collaborators injected into every adapter.
#[derive(Clone)]
pub struct AdapterResources {
    pub dialer: Arc<dyn Dialer>,
    pub resolver: Arc<dyn IpResolver>,
    pub sessions: SessionCache,
}

impl std::fmt::Debug for AdapterResources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterResources")
            .field("sessions", &self.sessions)
            .finish_non_exhaustive()
    }
}

impl AdapterResources {
    pub fn new(
        dialer: Arc<dyn Dialer>,
        resolver: Arc<dyn IpResolver>,
        sessions: SessionCache,
    ) -> Self {
        Self {
            dialer,
            resolver,
            sessions,
        }
    }

    /// TCP dialer and DNS resolver from the `tcp` and `dns` sections, with a
    /// fresh session cache.
    pub fn from_config(config: &Config) -> Result<Self, AdapterError> {
        let resolver = DnsResolver::new(&config.dns)
            .map_err(|e| AdapterError::Config(format!("dns: {e}")))?;
        let dialer = TcpDialer::new(&config.tcp).with_resolver(resolver.clone());
        Ok(Self::new(
            Arc::new(dialer),
            Arc::new(resolver),
            SessionCache::default(),
        ))
    }
}

/// Build one adapter from its record.
pub fn build_adapter(
    config: &ProxyConfig,
    resources: &AdapterResources,
) -> Result<Arc<dyn ProxyAdapter>, AdapterError> {
    let adapter: Arc<dyn ProxyAdapter> = match config {
        ProxyConfig::Vless(v) => Arc::new(VlessAdapter::new(v, resources)?),
        ProxyConfig::Reject(r) => Arc::new(Reject::named(&r.name)),
        ProxyConfig::RejectDrop(r) => Arc::new(Reject::named_drop(&r.name)),
    };
    Ok(adapter)
}

/// Adapters by name, in configuration order after the built-ins.
#[derive(Debug, Clone)]
pub struct AdapterRegistry {
    adapters: HashMap<String, Arc<dyn ProxyAdapter>>,
    order: Vec<String>,
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AdapterRegistry {
    /// A registry holding only `REJECT` and `REJECT-DROP`.
    pub fn new() -> Self {
        let mut registry = Self {
            adapters: HashMap::new(),
            order: Vec::new(),
        };
        registry.insert(Arc::new(Reject::new()));
        registry.insert(Arc::new(Reject::new_drop()));
        registry
    }

    /// Build every configured proxy. Failures are logged and skipped; they
    /// are also returned so callers can report them.
    pub fn from_config(
        config: &Config,
        resources: &AdapterResources,
    ) -> (Self, Vec<(String, AdapterError)>) {
        let mut registry = Self::new();
        let mut failures = Vec::new();
        for proxy in &config.proxies {
            match build_adapter(proxy, resources) {
                Ok(adapter) => {
                    debug!(proxy = %adapter.name(), kind = %adapter.adapter_type(), "adapter ready");
                    registry.insert(adapter);
                }
                Err(e) => {
                    warn!(proxy = %proxy.name(), error = %e, kind = e.kind().as_str(), "skipping proxy");
                    failures.push((proxy.name().to_string(), e));
                }
            }
        }
        (registry, failures)
    }

    /// Add or replace an adapter under its own name.
    pub fn insert(&mut self, adapter: Arc<dyn ProxyAdapter>) {
        let name = adapter.name().to_string();
        if self.adapters.insert(name.clone(), adapter).is_none() {
            self.order.push(name);
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ProxyAdapter>> {
        self.adapters.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ProxyAdapter>> {
        self.order.iter().filter_map(|name| self.adapters.get(name))
    }
}
