//! Static host table.

use std::collections::HashMap;
use std::net::IpAddr;

/// Exact and `*.suffix` wildcard host entries.
///
/// Exact entries win over wildcards; among wildcards the longest suffix wins.
/// Names are matched case-insensitively and without a trailing dot.
#[derive(Debug, Clone, Default)]
pub struct StaticHosts {
    exact: HashMap<String, IpAddr>,
    /// (".suffix", ip), sorted longest first.
    wildcard: Vec<(String, IpAddr)>,
}

impl StaticHosts {
    pub fn new(entries: &HashMap<String, IpAddr>) -> Self {
        let mut hosts = Self::default();
        for (name, ip) in entries {
            let name = normalize(name);
            match name.strip_prefix('*') {
                Some(suffix) if suffix.starts_with('.') => {
                    hosts.wildcard.push((suffix.to_string(), *ip));
                }
                _ => {
                    hosts.exact.insert(name, *ip);
                }
            }
        }
        hosts
            .wildcard
            .sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));
        hosts
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.wildcard.is_empty()
    }

    pub fn lookup(&self, host: &str) -> Option<IpAddr> {
        if self.is_empty() {
            return None;
        }
        let host = normalize(host);
        if let Some(ip) = self.exact.get(&host) {
            return Some(*ip);
        }
        self.wildcard
            .iter()
            .find(|(suffix, _)| host.len() > suffix.len() && host.ends_with(suffix.as_str()))
            .map(|(_, ip)| *ip)
    }
}

fn normalize(name: &str) -> String {
    name.trim().trim_end_matches('.').to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(&str, &str)]) -> StaticHosts {
        let map = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.parse().unwrap()))
            .collect();
        StaticHosts::new(&map)
    }

    #[test]
    fn exact_beats_wildcard() {
        let hosts = table(&[("*.example.com", "10.0.0.1"), ("api.example.com", "10.0.0.2")]);
        assert_eq!(hosts.lookup("api.example.com"), Some("10.0.0.2".parse().unwrap()));
        assert_eq!(hosts.lookup("www.example.com"), Some("10.0.0.1".parse().unwrap()));
        assert_eq!(hosts.lookup("a.b.example.com"), Some("10.0.0.1".parse().unwrap()));
    }

    #[test]
    fn wildcard_does_not_match_apex() {
        let hosts = table(&[("*.example.com", "10.0.0.1")]);
        assert_eq!(hosts.lookup("example.com"), None);
        assert_eq!(hosts.lookup("badexample.com"), None);
    }

    #[test]
    fn longest_wildcard_wins() {
        let hosts = table(&[("*.com", "10.0.0.1"), ("*.example.com", "10.0.0.2")]);
        assert_eq!(hosts.lookup("x.example.com"), Some("10.0.0.2".parse().unwrap()));
        assert_eq!(hosts.lookup("x.other.com"), Some("10.0.0.1".parse().unwrap()));
    }

    #[test]
    fn case_and_trailing_dot_are_ignored() {
        let hosts = table(&[("Router.LAN", "192.168.1.1")]);
        assert_eq!(hosts.lookup("router.lan."), Some("192.168.1.1".parse().unwrap()));
    }
}
