//! Hostname resolution for outbound-rs.
//!
//! [`IpResolver`] is the port the adapters consume: one host in, one IP out,
//! [`DnsError::NotFound`] when nothing usable comes back. [`DnsResolver`] is
//! the production implementation, backed by
//! [`hickory-resolver`](https://crates.io/crates/hickory-resolver) with a
//! static hosts table in front of it.
//!
//! # Usage
//!
//! ```rust,no_run
//! use outbound_dns::{DnsConfig, DnsResolver, IpResolver};
//!
//! # async fn example() -> Result<(), outbound_dns::DnsError> {
//! let resolver = DnsResolver::new(&DnsConfig::default())?;
//!
//! let ip = resolver.resolve_ip("example.com").await?;
//! let addr = resolver.resolve("example.com:443").await?;
//! println!("resolved: {ip} / {addr}");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod hosts;
pub mod resolver;
pub mod traits;

pub use config::{DnsConfig, DnsStrategy};
pub use error::DnsError;
pub use hosts::StaticHosts;
pub use resolver::DnsResolver;
pub use traits::IpResolver;
