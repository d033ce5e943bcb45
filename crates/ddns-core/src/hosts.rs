//! Host resolution: short labels ⇄ fully-qualified host names
//!
//! A [`HostMap`] is built once per reconciliation pass from a domain and
//! the configured short labels. The empty label stands for the apex.

use crate::error::{Error, Result};

/// Host strings providers use for the bare domain
const APEX_ALIASES: [&str; 2] = ["@", ""];

/// Ordered mapping from fully-qualified host name to short label
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostMap {
    domain: String,
    entries: Vec<(String, String)>,
}

impl HostMap {
    /// Build the map for `domain`
    ///
    /// `None` means the host list is absent and fails with
    /// [`Error::InvalidHostList`]. An empty list is legal and yields an
    /// empty map. A label listed twice keeps its first position.
    pub fn build<S: AsRef<str>>(domain: &str, hosts: Option<&[S]>) -> Result<Self> {
        if domain.trim().is_empty() {
            return Err(Error::config("Domain name cannot be empty"));
        }
        let hosts = hosts.ok_or_else(|| Error::InvalidHostList(domain.to_string()))?;

        let mut map = Self {
            domain: domain.to_string(),
            entries: Vec::with_capacity(hosts.len()),
        };
        for label in hosts {
            let label = label.as_ref();
            let fqdn = fqdn(label, domain);
            if !map.contains(&fqdn) {
                map.entries.push((fqdn, label.to_string()));
            }
        }
        Ok(map)
    }

    /// The domain this map belongs to
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Short label for a fully-qualified host
    pub fn label(&self, fqdn: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == fqdn)
            .map(|(_, label)| label.as_str())
    }

    pub fn contains(&self, fqdn: &str) -> bool {
        self.label(fqdn).is_some()
    }

    /// Iterate `(fqdn, label)` pairs in configuration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(fqdn, label)| (fqdn.as_str(), label.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fully-qualified form of a short label
pub fn fqdn(label: &str, domain: &str) -> String {
    if label.is_empty() {
        domain.to_string()
    } else {
        format!("{}.{}", label, domain)
    }
}

/// Fully-qualified form of a host string returned by a provider
///
/// `@` and the empty string denote the apex.
pub fn normalize_host(host: &str, domain: &str) -> String {
    if APEX_ALIASES.contains(&host) {
        domain.to_string()
    } else {
        host.to_string()
    }
}
