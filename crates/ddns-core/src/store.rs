//! Domain record store
//!
//! An in-memory snapshot of one domain's resource records, fetched from the
//! record API on demand.
//!
//! ## Staleness
//!
//! The snapshot is only trusted at the moment it was fetched. After any
//! mutating call the owner invalidates it, and reading an invalidated
//! snapshot is an [`Error::StaleSnapshot`] until [`DomainRecordStore::refresh`]
//! succeeds. The store never patches records in place.

use crate::error::{Error, Result};
use crate::record::ResourceRecord;
use crate::traits::RecordApi;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// Records of one domain as of a single `list` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainSnapshot {
    domain: String,
    records: Vec<ResourceRecord>,
    fetched_at: DateTime<Utc>,
}

impl DomainSnapshot {
    /// Build a snapshot from already-parsed records
    pub fn new(domain: impl Into<String>, records: Vec<ResourceRecord>) -> Self {
        Self {
            domain: domain.into(),
            records,
            fetched_at: Utc::now(),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Records in provider order
    pub fn records(&self) -> &[ResourceRecord] {
        &self.records
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Owner of a domain's snapshot for the duration of one pass
#[derive(Debug)]
pub struct DomainRecordStore {
    domain: String,
    snapshot: Option<DomainSnapshot>,
}

impl DomainRecordStore {
    /// Create a stale store; nothing is fetched until the first refresh
    pub fn new(domain: &str) -> Result<Self> {
        if domain.trim().is_empty() {
            return Err(Error::config("Domain name cannot be empty"));
        }

        Ok(Self {
            domain: domain.to_string(),
            snapshot: None,
        })
    }

    /// Create the store and fetch the initial snapshot
    ///
    /// A failure here means no decision can be made for the domain.
    pub async fn open(api: &dyn RecordApi, domain: &str) -> Result<Self> {
        let mut store = Self::new(domain)?;
        store.refresh(api).await?;
        Ok(store)
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Re-read the domain's records from the provider
    ///
    /// Entries missing required fields fail the whole refresh with
    /// [`Error::Parse`]; they are never skipped. On any failure the store
    /// stays stale.
    pub async fn refresh(&mut self, api: &dyn RecordApi) -> Result<&DomainSnapshot> {
        self.snapshot = None;
        debug!("Retrieving records for {}", self.domain);

        let entries = api.list(&self.domain).await?;
        let records = entries
            .iter()
            .map(ResourceRecord::try_from)
            .collect::<Result<Vec<_>>>()?;

        info!("{} records retrieved for {}", records.len(), self.domain);
        debug!("Records for {}: {:?}", self.domain, records);

        let snapshot = self
            .snapshot
            .insert(DomainSnapshot::new(self.domain.clone(), records));
        Ok(&*snapshot)
    }

    /// Mark the snapshot as no longer reflecting the provider
    pub fn invalidate(&mut self) {
        self.snapshot = None;
    }

    pub fn is_stale(&self) -> bool {
        self.snapshot.is_none()
    }

    /// Current snapshot, if it has not been invalidated
    pub fn snapshot(&self) -> Result<&DomainSnapshot> {
        self.snapshot
            .as_ref()
            .ok_or_else(|| Error::StaleSnapshot(self.domain.clone()))
    }

    /// Current snapshot, re-fetching first if it was invalidated
    pub async fn fresh(&mut self, api: &dyn RecordApi) -> Result<&DomainSnapshot> {
        if self.snapshot.is_none() {
            self.refresh(api).await?;
        }
        self.snapshot()
    }
}
