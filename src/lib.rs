//! # outbound-rs
//!
//! Outbound proxy adapters: VLESS over TCP, TLS and WebSocket, UDP relayed
//! over VLESS, and reject tarpits.
//!
//! ## Crates
//!
//! - [`outbound_core`] - Defaults, error labels and the WebSocket byte stream
//! - [`outbound_proto`] - VLESS header and UDP frame codec
//! - [`outbound_dns`] - Resolver used for server and UDP destination lookups
//! - [`outbound_config`] - Configuration loading and validation
//! - [`outbound_transport`] - Dialer and TLS/WebSocket layers
//! - [`outbound_adapter`] - The adapters, their registry and the CLI

pub use outbound_adapter as adapter;
pub use outbound_config as config;
pub use outbound_core as core;
pub use outbound_dns as dns;
pub use outbound_proto as proto;
pub use outbound_transport as transport;
