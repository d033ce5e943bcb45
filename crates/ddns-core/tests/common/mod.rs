//! Test doubles and common utilities for contract tests
//!
//! This module provides an in-memory record API and fixed IP sources so
//! the reconciliation contracts can be checked without a network.

#![allow(dead_code)]

use ddns_core::config::{DdnsConfig, DomainConfig, EngineConfig, ProviderConfig};
use ddns_core::error::{Error, ProviderFailure, Result};
use ddns_core::traits::{IpSource, RecordApi, RecordEntry};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One call received by [`MockRecordApi`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List {
        domain: String,
    },
    Create {
        domain: String,
        host: String,
        record_type: String,
        value: String,
        ttl: u32,
    },
    Update {
        domain: String,
        record_id: String,
        host: String,
        value: String,
        ttl: u32,
    },
    Delete {
        domain: String,
        record_id: String,
    },
}

impl Call {
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Call::List { .. })
    }
}

/// Failure to inject into a mock call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// Provider answered with a non-success code
    Provider,
    /// Connection-level failure
    Transport,
    /// Client rejected the operation name before sending it
    Unsupported,
}

impl Failure {
    fn to_error(self) -> Error {
        match self {
            Failure::Provider => Error::provider("mock", ProviderFailure::Code("280".to_string())),
            Failure::Transport => Error::transport("connection reset by peer"),
            Failure::Unsupported => Error::UnsupportedOperation("dnsMoveRecord".to_string()),
        }
    }
}

#[derive(Default)]
struct MockState {
    /// Records per domain, in provider order
    records: HashMap<String, Vec<RecordEntry>>,
    calls: Vec<Call>,
    next_id: usize,
    /// Mutations on these record ids fail
    failing_ids: HashMap<String, Failure>,
    /// Creates for these short labels fail
    failing_labels: HashMap<String, Failure>,
    /// Remaining list failures per domain
    failing_lists: HashMap<String, (Failure, usize)>,
}

/// In-memory record API with a call log and failure injection
///
/// Cloning shares the underlying state, so a test can keep a handle after
/// boxing a clone into the code under test.
#[derive(Clone, Default)]
pub struct MockRecordApi {
    state: Arc<Mutex<MockState>>,
}

impl MockRecordApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record; hosts are fully qualified like the provider returns them
    pub fn with_record(
        self,
        domain: &str,
        record_id: &str,
        host: &str,
        record_type: &str,
        value: &str,
    ) -> Self {
        self.state
            .lock()
            .unwrap()
            .records
            .entry(domain.to_string())
            .or_default()
            .push(entry(record_id, host, record_type, value));
        self
    }

    /// Add a record provider-side after the code under test has started
    pub fn insert_record(
        &self,
        domain: &str,
        record_id: &str,
        host: &str,
        record_type: &str,
        value: &str,
    ) {
        self.state
            .lock()
            .unwrap()
            .records
            .entry(domain.to_string())
            .or_default()
            .push(entry(record_id, host, record_type, value));
    }

    /// Seed a raw entry (possibly malformed)
    pub fn with_entry(self, domain: &str, entry: RecordEntry) -> Self {
        self.state
            .lock()
            .unwrap()
            .records
            .entry(domain.to_string())
            .or_default()
            .push(entry);
        self
    }

    /// Make every update/delete of `record_id` fail
    pub fn failing_record(self, record_id: &str, failure: Failure) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_ids
            .insert(record_id.to_string(), failure);
        self
    }

    /// Make every create for the short `label` fail
    pub fn failing_create(self, label: &str, failure: Failure) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_labels
            .insert(label.to_string(), failure);
        self
    }

    /// Make the next `times` list calls for `domain` fail
    pub fn failing_list(self, domain: &str, failure: Failure, times: usize) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_lists
            .insert(domain.to_string(), (failure, times));
        self
    }

    /// All calls received so far
    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn list_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::List { .. }))
            .count()
    }

    pub fn mutating_calls(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutating).collect()
    }

    pub fn updates(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, Call::Update { .. }))
            .collect()
    }

    pub fn creates(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, Call::Create { .. }))
            .collect()
    }

    pub fn deletes(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, Call::Delete { .. }))
            .collect()
    }

    /// Current provider-side records of a domain
    pub fn records(&self, domain: &str) -> Vec<RecordEntry> {
        self.state
            .lock()
            .unwrap()
            .records
            .get(domain)
            .cloned()
            .unwrap_or_default()
    }

    /// Forget the call log, keeping records and failures
    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }
}

#[async_trait::async_trait]
impl RecordApi for MockRecordApi {
    async fn list(&self, domain: &str) -> Result<Vec<RecordEntry>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::List {
            domain: domain.to_string(),
        });

        if let Some((failure, remaining)) = state.failing_lists.get_mut(domain)
            && *remaining > 0
        {
            *remaining -= 1;
            return Err(failure.to_error());
        }

        Ok(state.records.get(domain).cloned().unwrap_or_default())
    }

    async fn create(
        &self,
        domain: &str,
        host: &str,
        record_type: &str,
        value: &str,
        ttl: u32,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Create {
            domain: domain.to_string(),
            host: host.to_string(),
            record_type: record_type.to_string(),
            value: value.to_string(),
            ttl,
        });

        if let Some(failure) = state.failing_labels.get(host) {
            return Err(failure.to_error());
        }

        state.next_id += 1;
        let record_id = format!("new{}", state.next_id);
        let fqdn = if host.is_empty() {
            domain.to_string()
        } else {
            format!("{}.{}", host, domain)
        };
        let mut created = entry(&record_id, &fqdn, record_type, value);
        created.ttl = Some(ttl.to_string());
        state
            .records
            .entry(domain.to_string())
            .or_default()
            .push(created);
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
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Update {
            domain: domain.to_string(),
            record_id: record_id.to_string(),
            host: host.to_string(),
            value: value.to_string(),
            ttl,
        });

        if let Some(failure) = state.failing_ids.get(record_id) {
            return Err(failure.to_error());
        }

        let record = state
            .records
            .get_mut(domain)
            .and_then(|records| {
                records
                    .iter_mut()
                    .find(|r| r.record_id.as_deref() == Some(record_id))
            })
            .ok_or_else(|| Error::provider("mock", ProviderFailure::Code("280".to_string())))?;
        record.value = Some(value.to_string());
        record.ttl = Some(ttl.to_string());
        Ok(())
    }

    async fn delete(&self, domain: &str, record_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Delete {
            domain: domain.to_string(),
            record_id: record_id.to_string(),
        });

        if let Some(failure) = state.failing_ids.get(record_id) {
            return Err(failure.to_error());
        }

        if let Some(records) = state.records.get_mut(domain) {
            records.retain(|r| r.record_id.as_deref() != Some(record_id));
        }
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Build a well-formed record entry
pub fn entry(record_id: &str, host: &str, record_type: &str, value: &str) -> RecordEntry {
    RecordEntry {
        record_id: Some(record_id.to_string()),
        record_type: Some(record_type.to_string()),
        host: Some(host.to_string()),
        value: Some(value.to_string()),
        ttl: Some("7207".to_string()),
        distance: Some("0".to_string()),
    }
}

/// An IP source that always answers with the same address
pub struct FixedIpSource {
    ip: IpAddr,
    /// Call counter for current()
    current_call_count: Arc<AtomicUsize>,
}

impl FixedIpSource {
    pub fn new(ip: IpAddr) -> Self {
        Self {
            ip,
            current_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the number of times current() was called
    pub fn current_call_count(&self) -> usize {
        self.current_call_count.load(Ordering::SeqCst)
    }

    /// Create a new FixedIpSource that shares counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            ip: other.ip,
            current_call_count: Arc::clone(&other.current_call_count),
        }
    }
}

#[async_trait::async_trait]
impl IpSource for FixedIpSource {
    async fn current(&self) -> Result<IpAddr> {
        self.current_call_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.ip)
    }

    fn source_name(&self) -> &'static str {
        "fixed"
    }
}

/// An IP source whose oracle is unreachable
pub struct FailingIpSource;

#[async_trait::async_trait]
impl IpSource for FailingIpSource {
    async fn current(&self) -> Result<IpAddr> {
        Err(Error::ip_source("oracle unreachable"))
    }

    fn source_name(&self) -> &'static str {
        "failing"
    }
}

/// Helper to create a minimal DdnsConfig for testing
pub fn minimal_config(domains: Vec<DomainConfig>) -> DdnsConfig {
    DdnsConfig {
        domains,
        ttl: 3600,
        provider: ProviderConfig::NameSilo {
            api_key: Some("test-key".to_string()),
            base_url: None,
            dry_run: false,
        },
        ip_source: Default::default(),
        engine: EngineConfig {
            max_retries: 0,
            retry_delay_secs: 0,
        },
    }
}
