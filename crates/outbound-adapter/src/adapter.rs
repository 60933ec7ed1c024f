//! The outbound adapter contract.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::conn::{Connection, PacketConnection};
use crate::context::DialContext;
use crate::error::AdapterError;
use crate::metadata::Metadata;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterType {
    Vless,
    Reject,
    RejectDrop,
}

impl fmt::Display for AdapterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdapterType::Vless => f.write_str("Vless"),
            AdapterType::Reject => f.write_str("Reject"),
            AdapterType::RejectDrop => f.write_str("RejectDrop"),
        }
    }
}

/// Immutable description of an adapter, shared by every connection it opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterIdentity {
    pub name: String,
    pub adapter_type: AdapterType,
    pub udp: bool,
    /// `host:port` of the upstream server. Empty for adapters without one.
    pub server_addr: String,
}

/// An outbound route to one upstream proxy or policy.
///
/// Calls are independent; adapters hold no per-call state.
#[async_trait]
pub trait ProxyAdapter: Send + Sync + fmt::Debug {
    fn identity(&self) -> &Arc<AdapterIdentity>;

    fn name(&self) -> &str {
        &self.identity().name
    }

    fn adapter_type(&self) -> AdapterType {
        self.identity().adapter_type
    }

    fn supports_udp(&self) -> bool {
        self.identity().udp
    }

    /// Open a byte stream to the destination, bounded by `ctx`.
    async fn open_stream(
        &self,
        ctx: &DialContext,
        metadata: &Metadata,
    ) -> Result<Connection, AdapterError>;

    /// Open a single-peer datagram channel to the destination.
    async fn open_packet_channel(
        &self,
        metadata: &Metadata,
    ) -> Result<PacketConnection, AdapterError>;
}
