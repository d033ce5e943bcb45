// # HTTP IP Source
//
// This crate provides an HTTP-based IP oracle for the DDNS system.
//
// ## Architecture
//
// Asks an external service (e.g., api.ipify.org) for the caller's public IP,
// once per run. The body may be a bare address or a JSON object with an
// `ip` field. Any failure is an `Error::IpSource`, which aborts the run.

use ddns_core::config::IpSourceConfig;
use ddns_core::traits::IpSource;
use ddns_core::{Error, Result};
use serde::Deserialize;
use std::net::IpAddr;
use std::time::Duration;

/// Default HTTP timeout for the oracle request
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// JSON body returned by ipify-style services
#[derive(Debug, Deserialize)]
struct IpReply {
    ip: String,
}

/// HTTP-based IP source
pub struct HttpIpSource {
    /// URL to fetch IP from
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a new HTTP IP source
    ///
    /// # Parameters
    ///
    /// - `url`: URL to fetch IP from (e.g., "https://api.ipify.org/?format=json")
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::builder()
                .timeout(DEFAULT_HTTP_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Create a source from its configuration
    pub fn from_config(config: &IpSourceConfig) -> Self {
        match config {
            IpSourceConfig::Http { url } => Self::new(url.clone()),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch current IP from HTTP service
    async fn fetch_ip(&self) -> Result<IpAddr> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::ip_source(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::ip_source(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::ip_source(format!("Failed to read response: {}", e)))?;

        parse_ip(&body)
    }
}

/// Extract the address from an oracle response body
pub fn parse_ip(body: &str) -> Result<IpAddr> {
    let body = body.trim();

    let ip_text = if body.starts_with('{') {
        serde_json::from_str::<IpReply>(body)
            .map_err(|e| Error::ip_source(format!("Malformed JSON reply: {}", e)))?
            .ip
    } else {
        body.to_string()
    };

    ip_text
        .trim()
        .parse()
        .map_err(|_| Error::ip_source(format!("Invalid IP address: {}", ip_text)))
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<IpAddr> {
        let ip = self.fetch_ip().await?;
        tracing::debug!("Public IP from {}: {}", self.url, ip);
        Ok(ip)
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}
