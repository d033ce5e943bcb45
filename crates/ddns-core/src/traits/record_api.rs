// # Record API Trait
//
// Defines the interface to a DNS hosting provider's record-management API.
//
// ## Implementations
//
// - NameSilo: `ddns-provider-namesilo` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::RecordApi;
//
// #[tokio::main]
// async fn main() -> ddns_core::Result<()> {
//     let api = /* RecordApi implementation */;
//
//     for entry in api.list("example.com").await? {
//         println!("{:?}", entry);
//     }
//
//     api.update("example.com", "1a2b3c", "www", "203.0.113.7", 3600).await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One record entry exactly as the provider listed it
///
/// Every field is optional here; turning an entry into a
/// [`ResourceRecord`](crate::record::ResourceRecord) is where missing
/// fields are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordEntry {
    #[serde(default)]
    pub record_id: Option<String>,
    #[serde(rename = "type", default)]
    pub record_type: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub ttl: Option<String>,
    #[serde(default)]
    pub distance: Option<String>,
}

/// The operations a record API client implements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Create,
    Update,
    Delete,
}

impl Operation {
    /// All implemented operations
    pub const ALL: [Operation; 4] = [
        Operation::List,
        Operation::Create,
        Operation::Update,
        Operation::Delete,
    ];

    /// Operation name on the wire
    pub fn wire_name(&self) -> &'static str {
        match self {
            Operation::List => "dnsListRecords",
            Operation::Create => "dnsAddRecord",
            Operation::Update => "dnsUpdateRecord",
            Operation::Delete => "dnsDeleteRecord",
        }
    }

    /// Whether the operation changes which records exist or what they hold
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Operation::List)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for Operation {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.wire_name() == s)
            .ok_or_else(|| crate::Error::UnsupportedOperation(s.to_string()))
    }
}

/// Trait for record API clients
///
/// Four logical operations, each a single call against the provider.
/// Implementations validate the provider's response envelope and return
/// either the payload or an error:
///
/// - [`Error::Transport`](crate::Error::Transport) for network/HTTP failures
/// - [`Error::Provider`](crate::Error::Provider) for non-success status codes
///   or unparseable responses
///
/// # Trust Level: Untrusted
///
/// ## Forbidden Capabilities
/// - ❌ Retry or back off (owned by the orchestrator)
/// - ❌ Cache records between calls (owned by `DomainRecordStore`)
/// - ❌ Decide which records need changing (owned by `Reconciler`)
/// - ❌ Treat a failed list as "no records"
#[async_trait]
pub trait RecordApi: Send + Sync {
    /// List every resource record of a domain
    async fn list(&self, domain: &str) -> Result<Vec<RecordEntry>, crate::Error>;

    /// Create a record; `host` is the short label (empty for the apex)
    async fn create(
        &self,
        domain: &str,
        host: &str,
        record_type: &str,
        value: &str,
        ttl: u32,
    ) -> Result<(), crate::Error>;

    /// Update value and TTL of an existing record
    async fn update(
        &self,
        domain: &str,
        record_id: &str,
        host: &str,
        value: &str,
        ttl: u32,
    ) -> Result<(), crate::Error>;

    /// Delete a record
    async fn delete(&self, domain: &str, record_id: &str) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
