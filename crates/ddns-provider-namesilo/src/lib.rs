// # NameSilo Record API Client
//
// This crate provides the record API client for NameSilo's batch API.
//
// ## Scope
//
// - ✅ Four operations: dnsListRecords, dnsAddRecord, dnsUpdateRecord, dnsDeleteRecord
// - ✅ One HTTP request per call, over a single long-lived client
// - ✅ HTTP timeout configured (30 seconds)
// - ✅ Reply code validation (only `300` is success)
// - ✅ Dry-run mode for safe testing
// - ❌ NO retry logic (owned by the orchestrator)
// - ❌ NO caching (owned by DomainRecordStore)
//
// ## Security Requirements
//
// - API key NEVER appears in logs or Debug output
// - A missing key is sent as empty; NameSilo rejects it with a reply code
//
// ## API Reference
//
// - Request: `GET https://www.namesilo.com/apibatch/{operation}?version=1&type=xml&key=..&domain=..`
// - Reply: `<namesilo><request/><reply><code>300</code><detail>success</detail>...</reply></namesilo>`

use async_trait::async_trait;
use ddns_core::config::ProviderConfig;
use ddns_core::traits::{Operation, RecordApi, RecordEntry};
use ddns_core::{Error, ProviderFailure, Result};
use serde::Deserialize;
use std::time::Duration;

/// NameSilo batch API base URL
pub const NAMESILO_API_BASE: &str = "https://www.namesilo.com/apibatch";

/// Reply code NameSilo uses for success
const SUCCESS_CODE: &str = "300";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const PROVIDER_NAME: &str = "namesilo";

/// Parsed `<reply>` of a successful call
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Reply {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    /// Present on dnsListRecords replies only
    #[serde(rename = "resource_record", default)]
    pub records: Vec<RecordEntry>,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    reply: Option<Reply>,
}

/// Validate a raw response body and extract its reply
///
/// Only the reply code is trusted: any other code, a missing code, or a
/// body that is not the expected XML is a provider error.
pub fn parse_reply(body: &str) -> Result<Reply> {
    let envelope: Envelope = quick_xml::de::from_str(body).map_err(|e| {
        Error::provider(PROVIDER_NAME, ProviderFailure::Unparseable(e.to_string()))
    })?;

    let reply = envelope
        .reply
        .ok_or_else(|| Error::provider(PROVIDER_NAME, ProviderFailure::MissingStatus))?;

    match reply.code.as_deref().map(str::trim) {
        Some(SUCCESS_CODE) => Ok(reply),
        Some(code) => Err(Error::provider(
            PROVIDER_NAME,
            ProviderFailure::Code(code.to_string()),
        )),
        None => Err(Error::provider(PROVIDER_NAME, ProviderFailure::MissingStatus)),
    }
}

/// NameSilo record API client
///
/// # Trust Level: Untrusted
///
/// Stateless apart from the reused HTTP client. All coordination is owned
/// by the reconciliation engine and the orchestrator.
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the client will:
/// - Perform dnsListRecords calls
/// - Log the intended mutating call
/// - **NOT** send it, acknowledging it as successful
pub struct NameSiloClient {
    /// API key
    /// ⚠️ NEVER log this value
    api_key: Option<String>,

    /// Base URL, without the operation segment
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, list calls go out but mutations are skipped
    dry_run: bool,
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for NameSiloClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NameSiloClient")
            .field("api_key", &self.api_key.as_ref().map(|_| "<REDACTED>"))
            .field("base_url", &self.base_url)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl NameSiloClient {
    /// Create a client against the public NameSilo API
    pub fn new(api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            api_key,
            base_url: NAMESILO_API_BASE.to_string(),
            client,
            dry_run: false,
        }
    }

    /// Create a client from its configuration
    pub fn from_config(config: &ProviderConfig) -> Self {
        match config {
            ProviderConfig::NameSilo {
                api_key,
                base_url,
                dry_run,
            } => {
                let client = Self::new(api_key.clone()).dry_run(*dry_run);
                match base_url {
                    Some(url) => client.with_base_url(url),
                    None => client,
                }
            }
        }
    }

    /// Point the client at another endpoint (test servers, proxies)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Enable or disable dry-run mode
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Issue one API call by operation name
    ///
    /// The name is checked against the implemented operations before
    /// anything else; an unknown name fails with
    /// [`Error::UnsupportedOperation`] without touching the network.
    ///
    /// # API Call
    ///
    /// ```http
    /// GET {base}/{operation}?version=1&type=xml&key=<key>&domain=<domain>&<params>
    /// ```
    pub async fn call(&self, operation: &str, domain: &str, params: &[(&str, &str)]) -> Result<Reply> {
        let operation: Operation = operation.parse()?;

        if domain.trim().is_empty() {
            return Err(Error::config("Domain name cannot be empty"));
        }

        if self.dry_run && operation.is_mutating() {
            tracing::info!(
                "[DRY-RUN] Would call {} for {} with {:?}",
                operation,
                domain,
                params
            );
            return Ok(Reply {
                code: Some(SUCCESS_CODE.to_string()),
                detail: Some("dry-run".to_string()),
                records: Vec::new(),
            });
        }

        let url = format!("{}/{}", self.base_url, operation.wire_name());
        tracing::debug!("NameSilo {} for {} {:?}", operation, domain, params);

        let mut query: Vec<(&str, &str)> = vec![
            ("version", "1"),
            ("type", "xml"),
            ("key", self.api_key.as_deref().unwrap_or_default()),
            ("domain", domain),
        ];
        query.extend_from_slice(params);

        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| Error::transport(format!("{} request failed: {}", operation, e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::transport(format!(
                "{} returned HTTP {}",
                operation, status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::transport(format!("Failed to read {} response: {}", operation, e.without_url())))?;

        parse_reply(&body)
    }
}

#[async_trait]
impl RecordApi for NameSiloClient {
    async fn list(&self, domain: &str) -> Result<Vec<RecordEntry>> {
        let reply = self
            .call(Operation::List.wire_name(), domain, &[])
            .await?;
        Ok(reply.records)
    }

    async fn create(
        &self,
        domain: &str,
        host: &str,
        record_type: &str,
        value: &str,
        ttl: u32,
    ) -> Result<()> {
        let ttl = ttl.to_string();
        self.call(
            Operation::Create.wire_name(),
            domain,
            &[
                ("rrtype", record_type),
                ("rrhost", host),
                ("rrvalue", value),
                ("rrttl", &ttl),
            ],
        )
        .await?;
        Ok(())
    }

    async fn update(
        &self,
        domain: &str,
        record_id: &str,
        host: &str,
        value: &str,
        ttl: u32,
    ) -> Result<()> {
        let ttl = ttl.to_string();
        self.call(
            Operation::Update.wire_name(),
            domain,
            &[
                ("rrid", record_id),
                ("rrhost", host),
                ("rrvalue", value),
                ("rrttl", &ttl),
            ],
        )
        .await?;
        Ok(())
    }

    async fn delete(&self, domain: &str, record_id: &str) -> Result<()> {
        self.call(
            Operation::Delete.wire_name(),
            domain,
            &[("rrid", record_id)],
        )
        .await?;
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}
