//! Error kind labels for logging.
//!
//! These constants provide consistent error classification across all crates.

/// Socket establishment to the proxy server failed.
pub const ERROR_DIAL: &str = "dial";
/// TLS, WebSocket or proxy protocol handshake failed.
pub const ERROR_HANDSHAKE: &str = "handshake";
/// DNS/address resolution error.
pub const ERROR_RESOLVE: &str = "resolve";
/// Operation refused by adapter capability or policy.
pub const ERROR_UNSUPPORTED: &str = "unsupported";
/// Configuration error.
pub const ERROR_CONFIG: &str = "config";
