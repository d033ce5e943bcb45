//! Resource record model and record type resolution

use crate::error::{Error, Result};
use crate::traits::RecordEntry;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// Address record types this system publishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    /// IPv4 address record
    #[serde(rename = "A", alias = "a")]
    A,
    /// IPv6 address record
    #[serde(rename = "AAAA", alias = "aaaa")]
    Aaaa,
}

impl RecordType {
    /// Wire name as used by DNS providers
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "A" => Ok(RecordType::A),
            "AAAA" => Ok(RecordType::Aaaa),
            _ => Err(Error::config(format!(
                "Unsupported record type '{}' (expected A or AAAA)",
                s
            ))),
        }
    }
}

/// Shape of a string value as far as IP syntax goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpLiteral {
    V4,
    V6,
    Invalid,
}

impl IpLiteral {
    /// Classify a value purely by its literal syntax
    pub fn classify(value: &str) -> Self {
        match value.parse::<IpAddr>() {
            Ok(IpAddr::V4(_)) => IpLiteral::V4,
            Ok(IpAddr::V6(_)) => IpLiteral::V6,
            Err(_) => IpLiteral::Invalid,
        }
    }
}

/// Pick the record type for a value
///
/// An explicit type always wins. Otherwise IPv4 literals map to `A`, IPv6
/// literals to `AAAA`, and anything else is a [`Error::TypeResolution`].
/// Existing records never influence the result.
pub fn resolve_record_type(value: &str, explicit: Option<RecordType>) -> Result<RecordType> {
    if let Some(record_type) = explicit {
        return Ok(record_type);
    }

    match IpLiteral::classify(value) {
        IpLiteral::V4 => Ok(RecordType::A),
        IpLiteral::V6 => Ok(RecordType::Aaaa),
        IpLiteral::Invalid => Err(Error::TypeResolution(value.to_string())),
    }
}

/// One DNS record as known to the provider
///
/// Records are never edited locally. Every change goes through the record
/// API and the snapshot holding this record is re-fetched afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecord {
    /// Provider-assigned identifier
    pub record_id: String,
    /// Host as returned by the provider (`@` or empty for the apex)
    pub host: String,
    /// Record type as returned by the provider (`A`, `AAAA`, `MX`, ...)
    pub record_type: String,
    /// Record payload
    pub value: String,
    /// Time-to-live, when the provider reports one
    pub ttl: Option<u32>,
}

impl ResourceRecord {
    /// Whether this record has the given type
    pub fn is_type(&self, record_type: RecordType) -> bool {
        self.record_type.eq_ignore_ascii_case(record_type.as_str())
    }
}

impl TryFrom<&RecordEntry> for ResourceRecord {
    type Error = Error;

    fn try_from(entry: &RecordEntry) -> Result<Self> {
        fn required(field: &Option<String>, name: &str, entry: &RecordEntry) -> Result<String> {
            field
                .clone()
                .ok_or_else(|| Error::parse(format!("missing '{}' in {:?}", name, entry)))
        }

        let ttl = match entry.ttl.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                raw.parse::<u32>()
                    .map_err(|_| Error::parse(format!("invalid ttl '{}' in {:?}", raw, entry)))?,
            ),
        };

        Ok(Self {
            record_id: required(&entry.record_id, "record_id", entry)?,
            host: required(&entry.host, "host", entry)?,
            record_type: required(&entry.record_type, "type", entry)?,
            value: required(&entry.value, "value", entry)?,
            ttl,
        })
    }
}
