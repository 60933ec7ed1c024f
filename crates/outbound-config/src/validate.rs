//! Configuration validation logic.

use std::collections::HashSet;

use outbound_core::defaults::{REJECT_DROP_NAME, REJECT_NAME};

use crate::loader::ConfigError;
use crate::{Config, ProxyConfig};

/// Structural checks. Credentials are left to adapter construction.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut seen: HashSet<&str> = HashSet::from([REJECT_NAME, REJECT_DROP_NAME]);

    for (i, proxy) in config.proxies.iter().enumerate() {
        let name = proxy.name();
        if name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "proxies[{i}].name is empty"
            )));
        }
        if !seen.insert(name) {
            return Err(ConfigError::Validation(format!(
                "duplicate proxy name: {name}"
            )));
        }

        if let ProxyConfig::Vless(v) = proxy {
            if v.server.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "proxy {name}: server is empty"
                )));
            }
            if v.port == 0 {
                return Err(ConfigError::Validation(format!(
                    "proxy {name}: port must be > 0"
                )));
            }
        }
    }

    if let Some(format) = config.logging.format.as_deref()
        && !matches!(format, "json" | "pretty" | "compact")
    {
        return Err(ConfigError::Validation(
            "logging.format must be json, pretty or compact".into(),
        ));
    }
    if let Some(output) = config.logging.output.as_deref()
        && !matches!(output, "stdout" | "stderr")
    {
        return Err(ConfigError::Validation(
            "logging.output must be stdout or stderr".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RejectConfig, TransportConfig, VlessConfig};

    fn vless(name: &str, server: &str, port: u16) -> ProxyConfig {
        ProxyConfig::Vless(VlessConfig {
            name: name.into(),
            server: server.into(),
            port,
            uuid: "not-checked-here".into(),
            udp: false,
            transport: TransportConfig::default(),
        })
    }

    fn with(proxies: Vec<ProxyConfig>) -> Config {
        Config {
            proxies,
            ..Config::default()
        }
    }

    #[test]
    fn accepts_valid_proxies() {
        let cfg = with(vec![
            vless("a", "example.com", 443),
            ProxyConfig::Reject(RejectConfig { name: "b".into() }),
        ]);
        validate_config(&cfg).unwrap();
    }

    #[test]
    fn rejects_duplicates_and_builtin_names() {
        let dup = with(vec![vless("a", "h", 1), vless("a", "h", 2)]);
        assert!(validate_config(&dup).is_err());

        let builtin = with(vec![ProxyConfig::Reject(RejectConfig {
            name: "REJECT".into(),
        })]);
        assert!(validate_config(&builtin).is_err());
    }

    #[test]
    fn rejects_bad_vless_fields() {
        assert!(validate_config(&with(vec![vless(" ", "h", 1)])).is_err());
        assert!(validate_config(&with(vec![vless("a", "", 1)])).is_err());
        assert!(validate_config(&with(vec![vless("a", "h", 0)])).is_err());
    }

    #[test]
    fn rejects_unknown_log_format() {
        let mut cfg = Config::default();
        cfg.logging.format = Some("xml".into());
        assert!(validate_config(&cfg).is_err());
    }
}
