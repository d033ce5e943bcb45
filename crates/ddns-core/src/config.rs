//! Configuration types for the DDNS system
//!
//! This module defines all configuration structures used throughout the crate.

use crate::record::RecordType;
use serde::{Deserialize, Serialize};

/// Default TTL applied to every created/updated record
pub const DEFAULT_TTL: u32 = 3600;

/// Default IP oracle
pub const DEFAULT_IP_SOURCE_URL: &str = "https://api.ipify.org/?format=json";

/// Label used in the environment form for the apex
const APEX_LABEL: &str = "@";

/// Main DDNS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DdnsConfig {
    /// Domains to reconcile, in order
    pub domains: Vec<DomainConfig>,

    /// TTL for every create/update call
    #[serde(default = "default_ttl")]
    pub ttl: u32,

    /// Record API configuration
    pub provider: ProviderConfig,

    /// IP source configuration
    #[serde(default)]
    pub ip_source: IpSourceConfig,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl DdnsConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            domains: Vec::new(),
            ttl: DEFAULT_TTL,
            provider: ProviderConfig::default(),
            ip_source: IpSourceConfig::default(),
            engine: EngineConfig::default(),
        }
    }

    /// Validate the global part of the configuration
    ///
    /// Per-domain problems (empty domain, absent host list) are not checked
    /// here; they fail that domain's pass only.
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.ttl == 0 {
            return Err(crate::Error::config("TTL must be > 0"));
        }

        self.ip_source.validate()?;

        Ok(())
    }
}

impl Default for DdnsConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// One domain and the short host labels to keep pointed at us
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Domain name (e.g., "example.com")
    pub domain: String,

    /// Short labels; `""` is the apex. `None` means the list is absent.
    #[serde(default)]
    pub hosts: Option<Vec<String>>,

    /// Record type to publish instead of inferring it from the IP
    #[serde(default)]
    pub record_type: Option<RecordType>,
}

impl DomainConfig {
    /// Create a domain configuration
    pub fn new<S: Into<String>>(domain: impl Into<String>, hosts: impl IntoIterator<Item = S>) -> Self {
        Self {
            domain: domain.into(),
            hosts: Some(hosts.into_iter().map(Into::into).collect()),
            record_type: None,
        }
    }

    /// Set the record type
    pub fn with_record_type(mut self, record_type: RecordType) -> Self {
        self.record_type = Some(record_type);
        self
    }
}

/// Parse the environment form of the domain list
///
/// Entries are separated by `;`. Each entry is `domain=label,label,...`
/// where `@` stands for the apex. `domain=` is an empty host list, a bare
/// `domain` has no host list at all.
///
/// ```
/// use ddns_core::config::parse_domains;
///
/// let domains = parse_domains("example.com=@,www;example.org=home").unwrap();
/// assert_eq!(domains[0].hosts.as_deref(), Some(&["".to_string(), "www".to_string()][..]));
/// assert_eq!(domains[1].domain, "example.org");
/// ```
pub fn parse_domains(input: &str) -> Result<Vec<DomainConfig>, crate::Error> {
    input
        .split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (domain, hosts) = match entry.split_once('=') {
                Some((domain, hosts)) => (domain.trim(), Some(hosts)),
                None => (entry, None),
            };

            if domain.is_empty() {
                return Err(crate::Error::config(format!(
                    "Domain entry '{}' has no domain name",
                    entry
                )));
            }

            let hosts = hosts.map(|hosts| {
                hosts
                    .split(',')
                    .map(str::trim)
                    .filter(|label| !label.is_empty())
                    .map(|label| {
                        if label == APEX_LABEL {
                            String::new()
                        } else {
                            label.to_string()
                        }
                    })
                    .collect()
            });

            Ok(DomainConfig {
                domain: domain.to_string(),
                hosts,
                record_type: None,
            })
        })
        .collect()
}

/// IP source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IpSourceConfig {
    /// HTTP-based IP source (uses external service)
    Http {
        /// URL to fetch IP from
        url: String,
    },
}

impl IpSourceConfig {
    /// Validate the IP source configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            IpSourceConfig::Http { url } => {
                if url.is_empty() {
                    return Err(crate::Error::config("HTTP IP source URL cannot be empty"));
                }
                if !url.starts_with("https://") && !url.starts_with("http://") {
                    return Err(crate::Error::config(format!(
                        "HTTP IP source URL must use HTTP or HTTPS scheme. Got: {}",
                        url
                    )));
                }
                Ok(())
            }
        }
    }
}

impl Default for IpSourceConfig {
    fn default() -> Self {
        IpSourceConfig::Http {
            url: DEFAULT_IP_SOURCE_URL.to_string(),
        }
    }
}

/// Record API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// NameSilo batch API
    #[serde(rename = "namesilo")]
    NameSilo {
        /// API key; absence is reported but not rejected
        #[serde(default)]
        api_key: Option<String>,
        /// Override for the API base URL
        #[serde(default)]
        base_url: Option<String>,
        /// Log mutating calls instead of sending them
        #[serde(default)]
        dry_run: bool,
    },
}

impl ProviderConfig {
    /// Whether a non-empty credential is configured
    pub fn has_credential(&self) -> bool {
        match self {
            ProviderConfig::NameSilo { api_key, .. } => {
                api_key.as_deref().is_some_and(|key| !key.is_empty())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::NameSilo { .. } => "namesilo",
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig::NameSilo {
            api_key: None,
            base_url: None,
            dry_run: false,
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Extra attempts for a domain pass that failed with a retryable error
    ///
    /// 0 disables retries.
    #[serde(default)]
    pub max_retries: usize,

    /// Delay between retry attempts (in seconds)
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            retry_delay_secs: default_retry_delay_secs(),
        }
    }
}

fn default_ttl() -> u32 {
    DEFAULT_TTL
}

fn default_retry_delay_secs() -> u64 {
    5
}
