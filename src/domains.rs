//! Publisher domain registry
//!
//! The registry is a static, ordered list of publisher hostnames plus the
//! small set of "inverted-language" domains: hostnames whose default
//! language is English rather than Portuguese, so a missing `language`
//! parameter implies an `/en` path prefix.

use std::collections::HashSet;

/// 发布域名列表，顺序即无排行时的回退顺序
pub const PUBLISHER_DOMAINS: &[&str] = &[
    "useuapp.com",
    "appmobile4u.com",
    "appstoday4u.com",
    "mobiappsnow.com",
];

/// 默认语言为英语的域名
pub const INVERTED_LANGUAGE_DOMAINS: &[&str] = &["appmobile4u.com", "mobiappsnow.com"];

/// Immutable registry of publisher domains, created once at startup.
#[derive(Debug, Clone)]
pub struct DomainRegistry {
    hostnames: Vec<String>,
    inverted: HashSet<String>,
}

impl DomainRegistry {
    /// Build the registry from the static domain tables.
    pub fn from_static() -> Self {
        Self::new(
            PUBLISHER_DOMAINS.iter().map(|d| d.to_string()).collect(),
            INVERTED_LANGUAGE_DOMAINS
                .iter()
                .map(|d| d.to_string())
                .collect(),
        )
    }

    pub fn new(hostnames: Vec<String>, inverted: HashSet<String>) -> Self {
        Self {
            hostnames,
            inverted,
        }
    }

    pub fn hostnames(&self) -> &[String] {
        &self.hostnames
    }

    pub fn len(&self) -> usize {
        self.hostnames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hostnames.is_empty()
    }

    /// Hostname at `index`, wrapping modulo the registry size.
    pub fn at_wrapped(&self, index: usize) -> &str {
        &self.hostnames[index % self.hostnames.len()]
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.hostnames.get(index).map(|s| s.as_str())
    }

    /// Whether the hostname's default language is English (see module docs).
    pub fn is_inverted_language(&self, hostname: &str) -> bool {
        self.inverted.contains(hostname)
    }
}

impl Default for DomainRegistry {
    fn default() -> Self {
        Self::from_static()
    }
}
