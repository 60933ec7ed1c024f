//! Resolver port consumed by outbound adapters.

use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::DnsError;

/// Resolves a hostname to a single IP address.
///
/// Implementations must be thread-safe: adapters share one resolver across
/// all concurrent dials.
#[async_trait]
pub trait IpResolver: Send + Sync {
    /// Resolve `host` (a domain or an IP literal) to one address.
    ///
    /// Returns [`DnsError::NotFound`] when no address is obtainable.
    async fn resolve_ip(&self, host: &str) -> Result<IpAddr, DnsError>;
}

#[async_trait]
impl<R: IpResolver + ?Sized> IpResolver for Arc<R> {
    #[inline]
    async fn resolve_ip(&self, host: &str) -> Result<IpAddr, DnsError> {
        (**self).resolve_ip(host).await
    }
}

#[async_trait]
impl<R: IpResolver + ?Sized> IpResolver for Box<R> {
    #[inline]
    async fn resolve_ip(&self, host: &str) -> Result<IpAddr, DnsError> {
        (**self).resolve_ip(host).await
    }
}
