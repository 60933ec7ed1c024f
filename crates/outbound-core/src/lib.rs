//! Core types and constants shared across outbound crates.
//!
//! This crate provides:
//! - Default timeouts, sizes and built-in adapter names
//! - Error kind labels for logging
//! - The `WsIo` WebSocket byte-stream adapter

pub mod defaults;
pub mod errors;
pub mod transport;

pub use defaults::*;
pub use errors::*;

/// Project name.
pub const PROJECT_NAME: &str = "outbound-rs";
/// Project version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
