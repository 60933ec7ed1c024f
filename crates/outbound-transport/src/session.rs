//! Shared TLS session store.

use std::sync::Arc;

use outbound_core::defaults::DEFAULT_SESSION_CACHE_SIZE;
use rustls::client::{ClientSessionMemoryCache, ClientSessionStore, Resumption};

/// Process-wide TLS client session cache.
///
/// Cloning shares the same store. Entries are keyed by server name inside
/// rustls, so one cache serves every TLS-capable adapter. Tests build their
/// own instance to stay isolated.
#[derive(Debug, Clone)]
pub struct SessionCache {
    store: Arc<dyn ClientSessionStore>,
}

impl SessionCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            store: Arc::new(ClientSessionMemoryCache::new(capacity)),
        }
    }

    /// Resumption policy backed by this cache.
    pub fn resumption(&self) -> Resumption {
        Resumption::store(self.store.clone())
    }
}

impl Default for SessionCache {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_CACHE_SIZE)
    }
}
