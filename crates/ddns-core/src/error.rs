//! Error types for the DDNS system
//!
//! This module defines all error types used throughout the crate.
//!
//! Propagation rules:
//! - Failures while listing records are fatal for the affected domain
//! - Failures of individual create/update/delete calls are caught by the
//!   engine and counted in a [`BatchOutcome`](crate::engine::BatchOutcome)
//! - IP source failures are fatal for the whole run

use std::fmt;
use thiserror::Error;

/// Result type alias for DDNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Why a provider response was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderFailure {
    /// The response carried a status code other than the success code
    Code(String),
    /// The response parsed but had no status code field
    MissingStatus,
    /// The response body could not be parsed at all
    Unparseable(String),
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderFailure::Code(code) => write!(f, "operation failed with code {}", code),
            ProviderFailure::MissingStatus => write!(f, "response has no status code"),
            ProviderFailure::Unparseable(reason) => {
                write!(f, "could not parse response: {}", reason)
            }
        }
    }
}

/// Core error type for the DDNS system
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors (invalid domain, missing settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Host list absent for a domain
    #[error("Invalid host list for domain {0}")]
    InvalidHostList(String),

    /// Value is not an IP literal and no record type was given
    #[error("Cannot infer record type: {0} is not a valid IPv4/IPv6 address")]
    TypeResolution(String),

    /// Network or HTTP-layer failure reaching the record API
    #[error("Transport error: {0}")]
    Transport(String),

    /// The record API answered but did not signal success
    #[error("Provider error ({provider}): {failure}")]
    Provider {
        /// Provider name
        provider: String,
        /// What was wrong with the response
        failure: ProviderFailure,
    },

    /// An operation outside the implemented set was requested
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// A record entry lacked a required field
    #[error("Malformed record entry: {0}")]
    Parse(String),

    /// The local snapshot was invalidated and has not been re-fetched
    #[error("Record snapshot for {0} is stale")]
    StaleSnapshot(String),

    /// IP source-related errors
    #[error("IP source error: {0}")]
    IpSource(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a provider error
    pub fn provider(provider: impl Into<String>, failure: ProviderFailure) -> Self {
        Self::Provider {
            provider: provider.into(),
            failure,
        }
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create an IP source error
    pub fn ip_source(msg: impl Into<String>) -> Self {
        Self::IpSource(msg.into())
    }

    /// Errors caused by configuration rather than by the remote side
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Config(_) | Self::InvalidHostList(_))
    }

    /// Whether repeating the same call could succeed
    ///
    /// Only transport failures qualify. A provider that answered with a
    /// non-success code will answer the same way again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Programming-contract violations that must never be retried
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::UnsupportedOperation(_))
    }
}
