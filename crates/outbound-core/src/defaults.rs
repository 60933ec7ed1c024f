//! Default configuration values.
//!
//! Centralized default constants for use across all crates.

// ============================================================================
// Timeout Defaults
// ============================================================================

/// Timeout for dialing the proxy server on paths that carry no caller deadline
/// (the UDP relay dial).
pub const DEFAULT_TCP_CONNECT_TIMEOUT_SECS: u64 = 5;
/// Write stall of the `REJECT-DROP` tarpit, in seconds.
pub const DEFAULT_DROP_DURATION_SECS: u64 = 60;
/// Default DNS query timeout in seconds.
pub const DEFAULT_DNS_TIMEOUT_SECS: u64 = 5;

// ============================================================================
// TCP Socket Defaults
// ============================================================================

/// Default TCP_NODELAY (disable Nagle's algorithm for lower latency).
pub const DEFAULT_TCP_NO_DELAY: bool = true;
/// Default TCP Keep-Alive interval in seconds (0 = disabled).
pub const DEFAULT_TCP_KEEPALIVE_SECS: u64 = 30;

// ============================================================================
// TLS Defaults
// ============================================================================

/// Capacity of the process-wide TLS client session cache.
pub const DEFAULT_SESSION_CACHE_SIZE: usize = 128;

// ============================================================================
// WebSocket Defaults
// ============================================================================

/// Default WebSocket path.
pub const DEFAULT_WS_PATH: &str = "/";

// ============================================================================
// DNS Defaults
// ============================================================================

/// Default DNS cache capacity (entries).
pub const DEFAULT_DNS_CACHE_SIZE: usize = 256;

// ============================================================================
// Built-in Adapters
// ============================================================================

/// Name of the built-in instant-reject adapter.
pub const REJECT_NAME: &str = "REJECT";
/// Name of the built-in tarpit adapter.
pub const REJECT_DROP_NAME: &str = "REJECT-DROP";
