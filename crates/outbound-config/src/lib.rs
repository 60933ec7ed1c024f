//! Declarative configuration for outbound proxies.
//!
//! Files are chosen by extension: `.yaml`/`.yml`, `.json`/`.jsonc` (comments
//! allowed) or `.toml`.

mod defaults;
mod loader;
mod types;
mod validate;

pub use loader::{ConfigError, ConfigFormat, load_config, parse_config};
pub use types::*;
pub use validate::validate_config;
