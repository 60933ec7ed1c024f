//! Outbound proxy adapters.
//!
//! Every adapter implements [`ProxyAdapter`]: given a destination it opens a
//! byte stream ([`Connection`]) or a datagram channel ([`PacketConnection`])
//! that reaches the destination through the adapter. Two kinds exist:
//!
//! - [`VlessAdapter`] tunnels through a VLESS server over plain TCP, TLS, or
//!   WebSocket (optionally over TLS).
//! - [`Reject`] refuses traffic. `REJECT` answers with an immediate EOF,
//!   `REJECT-DROP` additionally stalls every write.
//!
//! [`AdapterRegistry::from_config`] builds the adapters named in a
//! configuration file next to the two built-in reject adapters.

mod adapter;
mod build;
pub mod cli;
mod conn;
mod context;
mod error;
mod metadata;
mod reject;
mod vless;

pub use adapter::{AdapterIdentity, AdapterType, ProxyAdapter};
pub use build::{AdapterRegistry, AdapterResources, build_adapter};
pub use cli::Cli;
pub use conn::{Connection, PacketConn, PacketConnection};
pub use context::DialContext;
pub use error::{AdapterError, ErrorKind};
pub use metadata::{Metadata, Protocol};
pub use reject::{NopConn, Reject};
pub use vless::{VlessAdapter, VlessClient, VlessPacketConn, VlessStream};
