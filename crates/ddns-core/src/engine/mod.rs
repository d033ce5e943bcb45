//! Reconciliation engine
//!
//! The [`Reconciler`] is responsible for:
//! - Diffing the desired hosts/value against the domain's current records
//! - Updating records whose value differs
//! - Creating records for hosts that have none
//! - Deleting records matching a filter
//! - Re-fetching the snapshot after mutating calls
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐
//! │ DesiredState │   │ DeleteFilter │
//! └──────────────┘   └──────────────┘
//!         │                 │
//!         ▼                 ▼
//!        ┌───────────────────┐        ┌───────────────────┐
//!        │    Reconciler     │◀──────▶│ DomainRecordStore │
//!        └───────────────────┘        └───────────────────┘
//!                  │                            │
//!                  ▼                            ▼
//!        ┌──────────────────────────────────────────┐
//!        │   RecordApi (create / update / delete /  │
//!        │              list)                       │
//!        └──────────────────────────────────────────┘
//! ```
//!
//! ## Pass Flow
//!
//! 1. UPDATE: every record whose host is configured, whose type is the
//!    target type and whose value differs gets one `update` call
//! 2. ADD: every configured host with no record at all (of any type) in
//!    the snapshot taken before the updates gets one `create` call, and
//!    the snapshot is re-fetched after each successful create
//!
//! Every pass, delete included, re-lists the domain before deciding
//! anything, so no decision is made from a snapshot older than the pass.
//!
//! Each call is isolated: failures are counted in a [`BatchOutcome`] and
//! the remaining calls still go out. Only listing failures abort a pass.

mod report;

pub use report::{BatchOutcome, OperationFailure, PassReport};

use crate::error::{Error, Result};
use crate::hosts::{HostMap, fqdn, normalize_host};
use crate::record::{RecordType, ResourceRecord, resolve_record_type};
use crate::store::DomainRecordStore;
use crate::traits::RecordApi;
use std::fmt;
use tracing::{debug, error, info, warn};

/// What a domain should look like after a pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredState {
    hosts: HostMap,
    value: String,
    record_type: RecordType,
}

impl DesiredState {
    /// Resolve the record type and build the desired state
    ///
    /// Fails with [`Error::TypeResolution`] when no type is given and
    /// `value` is not an IP literal.
    pub fn new(
        hosts: HostMap,
        value: impl Into<String>,
        explicit_type: Option<RecordType>,
    ) -> Result<Self> {
        let value = value.into();
        let record_type = resolve_record_type(&value, explicit_type)?;
        Ok(Self {
            hosts,
            value,
            record_type,
        })
    }

    pub fn domain(&self) -> &str {
        self.hosts.domain()
    }

    pub fn hosts(&self) -> &HostMap {
        &self.hosts
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn record_type(&self) -> RecordType {
        self.record_type
    }
}

/// Records to update and hosts to add, as decided from one snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    /// Records whose value must change
    pub updates: Vec<ResourceRecord>,
    /// `(fqdn, label)` of hosts without any record
    pub adds: Vec<(String, String)>,
}

impl Plan {
    /// Decide the pass for `desired` against `records`
    ///
    /// The add check looks for any record on the host regardless of type:
    /// a host that already carries e.g. an `AAAA` record does not get an
    /// `A` record added next to it.
    pub fn compute(records: &[ResourceRecord], desired: &DesiredState) -> Self {
        let domain = desired.domain();

        let updates = records
            .iter()
            .filter(|record| {
                desired.hosts().contains(&normalize_host(&record.host, domain))
                    && record.is_type(desired.record_type())
                    && record.value != desired.value()
            })
            .cloned()
            .collect();

        let adds = desired
            .hosts()
            .iter()
            .filter(|(host, _)| {
                !records
                    .iter()
                    .any(|record| normalize_host(&record.host, domain) == *host)
            })
            .map(|(host, label)| (host.to_string(), label.to_string()))
            .collect();

        Self { updates, adds }
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.adds.is_empty()
    }
}

/// Criteria selecting records to delete
///
/// Every criterion is optional; a record matches when all supplied
/// criteria match. The empty filter matches every record of the domain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteFilter {
    /// Short host label (empty for the apex)
    pub host: Option<String>,
    pub value: Option<String>,
    pub record_type: Option<String>,
}

impl DeleteFilter {
    /// Filter matching every record
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_record_type(mut self, record_type: impl Into<String>) -> Self {
        self.record_type = Some(record_type.into());
        self
    }

    /// Whether `record` on `domain` matches every supplied criterion
    pub fn matches(&self, record: &ResourceRecord, domain: &str) -> bool {
        let host_ok = self
            .host
            .as_deref()
            .is_none_or(|label| normalize_host(&record.host, domain) == fqdn(label, domain));
        let value_ok = self.value.as_deref().is_none_or(|v| record.value == v);
        let type_ok = self
            .record_type
            .as_deref()
            .is_none_or(|t| record.record_type == t);

        host_ok && value_ok && type_ok
    }
}

impl fmt::Display for DeleteFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |v: &Option<String>| v.clone().unwrap_or_else(|| "*".to_string());
        write!(
            f,
            "host {}, type {}, value {}",
            show(&self.host),
            show(&self.record_type),
            show(&self.value)
        )
    }
}

/// Reconciliation engine for one domain
///
/// Owns the domain's [`DomainRecordStore`] exclusively for its lifetime.
/// All calls are awaited one at a time.
///
/// ## Lifecycle
///
/// 1. Create with [`Reconciler::new()`] (no call) or [`Reconciler::open()`]
///    (fetches a snapshot up front)
/// 2. Run [`Reconciler::sync()`] and/or [`Reconciler::delete()`]; each one
///    re-fetches the snapshot at its start
/// 3. Drop
pub struct Reconciler<'a> {
    /// Record API used for every call
    api: &'a dyn RecordApi,

    /// Snapshot owner
    store: DomainRecordStore,

    /// TTL applied to every create/update
    ttl: u32,
}

impl<'a> Reconciler<'a> {
    /// Create a reconciler for `domain` without listing it
    pub fn new(api: &'a dyn RecordApi, domain: &str, ttl: u32) -> Result<Self> {
        if ttl == 0 {
            return Err(Error::config("TTL must be > 0"));
        }
        let store = DomainRecordStore::new(domain)?;
        Ok(Self { api, store, ttl })
    }

    /// Open a reconciler for `domain`
    ///
    /// # Returns
    ///
    /// - `Ok(Reconciler)`: Snapshot fetched
    /// - `Err(Error)`: The initial `list` failed; nothing can be decided
    pub async fn open(api: &'a dyn RecordApi, domain: &str, ttl: u32) -> Result<Self> {
        let mut reconciler = Self::new(api, domain, ttl)?;
        reconciler.store.refresh(api).await?;
        Ok(reconciler)
    }

    pub fn domain(&self) -> &str {
        self.store.domain()
    }

    pub fn store(&self) -> &DomainRecordStore {
        &self.store
    }

    /// Decide the next pass without issuing any mutating call
    ///
    /// Always re-lists the domain first.
    pub async fn plan(&mut self, desired: &DesiredState) -> Result<Plan> {
        self.check_domain(desired)?;
        let snapshot = self.store.refresh(self.api).await?;
        Ok(Plan::compute(snapshot.records(), desired))
    }

    /// Run the update phase then the add phase
    pub async fn sync(&mut self, desired: &DesiredState) -> Result<PassReport> {
        info!(
            "DDNS update starting for domain: {} and record type {}",
            self.domain(),
            desired.record_type()
        );

        let plan = self.plan(desired).await?;
        let updates = self.apply_updates(&plan.updates, desired).await?;
        let adds = self.apply_adds(&plan.adds, desired).await?;

        let report = PassReport {
            domain: self.domain().to_string(),
            record_type: desired.record_type(),
            value: desired.value().to_string(),
            updates,
            adds,
        };
        info!("DDNS pass complete for {}", report);
        Ok(report)
    }

    async fn apply_updates(
        &mut self,
        records: &[ResourceRecord],
        desired: &DesiredState,
    ) -> Result<BatchOutcome> {
        let domain = self.domain().to_string();
        let mut outcome = BatchOutcome::default();

        for record in records {
            let host = normalize_host(&record.host, &domain);
            let label = desired.hosts().label(&host).unwrap_or_default();
            info!(
                "DDNS update required for {} ({} -> {})",
                host,
                record.value,
                desired.value()
            );

            let result = self
                .api
                .update(&domain, &record.record_id, label, desired.value(), self.ttl)
                .await;
            self.store.invalidate();

            match result {
                Ok(()) => info!("DDNS successfully updated {}", host),
                Err(e) if e.is_contract_violation() => {
                    error!("DDNS update of {} hit a contract violation: {}", host, e);
                    return Err(e);
                }
                Err(ref e) => warn!("DDNS failed to update {}: {}", host, e),
            }
            outcome.record(&host, Some(&record.record_id), &result);
        }

        info!(
            "DDNS update complete for {}. {} hosts required updates. {} errors.",
            domain,
            outcome.attempted(),
            outcome.failed()
        );
        Ok(outcome)
    }

    async fn apply_adds(
        &mut self,
        hosts: &[(String, String)],
        desired: &DesiredState,
    ) -> Result<BatchOutcome> {
        let domain = self.domain().to_string();
        let record_type = desired.record_type();
        let mut outcome = BatchOutcome::default();

        if !hosts.is_empty() {
            info!(
                "DDNS add required for {:?}",
                hosts.iter().map(|(host, _)| host).collect::<Vec<_>>()
            );
        }

        for (host, label) in hosts {
            let result = self
                .api
                .create(&domain, label, record_type.as_str(), desired.value(), self.ttl)
                .await;

            match result {
                Ok(()) => {
                    info!(
                        "DDNS successfully added {}, type {}, value {}",
                        host,
                        record_type,
                        desired.value()
                    );
                    self.resync().await;
                }
                Err(e) if e.is_contract_violation() => {
                    error!("DDNS add of {} hit a contract violation: {}", host, e);
                    return Err(e);
                }
                Err(ref e) => warn!(
                    "DDNS failed to add {}, type {}, value {}: {}",
                    host,
                    record_type,
                    desired.value(),
                    e
                ),
            }
            outcome.record(host, None, &result);
        }

        Ok(outcome)
    }

    /// Delete every record matching `filter`
    ///
    /// Matching uses a snapshot fetched at the start of the call. The
    /// snapshot is re-fetched once more after the batch.
    pub async fn delete(&mut self, filter: &DeleteFilter) -> Result<BatchOutcome> {
        let domain = self.domain().to_string();
        info!("DDNS delete starting for domain: {}, {}", domain, filter);

        let targets: Vec<ResourceRecord> = self
            .store
            .refresh(self.api)
            .await?
            .records()
            .iter()
            .filter(|record| filter.matches(record, &domain))
            .cloned()
            .collect();
        debug!("{} records match delete filter on {}", targets.len(), domain);

        let mut outcome = BatchOutcome::default();
        for record in &targets {
            let host = normalize_host(&record.host, &domain);
            let result = self.api.delete(&domain, &record.record_id).await;
            self.store.invalidate();

            match result {
                Ok(()) => info!(
                    "DDNS successfully deleted {} {} {}",
                    host, record.record_type, record.value
                ),
                Err(e) if e.is_contract_violation() => {
                    error!("DDNS delete of {} hit a contract violation: {}", host, e);
                    return Err(e);
                }
                Err(ref e) => warn!("DDNS failed to delete {}: {}", host, e),
            }
            outcome.record(&host, Some(&record.record_id), &result);
        }

        info!(
            "DDNS delete complete for {}. {} hosts required deletes. {} errors.",
            domain,
            outcome.attempted(),
            outcome.failed()
        );
        self.resync().await;
        Ok(outcome)
    }

    /// Re-fetch after mutations; a failure leaves the store stale
    async fn resync(&mut self) {
        let refreshed = self.store.refresh(self.api).await.map(|_| ());
        if let Err(e) = refreshed {
            warn!(
                "Could not re-fetch records for {} after mutation: {}",
                self.domain(),
                e
            );
        }
    }

    fn check_domain(&self, desired: &DesiredState) -> Result<()> {
        if desired.domain() != self.domain() {
            return Err(Error::config(format!(
                "Desired state for {} given to reconciler of {}",
                desired.domain(),
                self.domain()
            )));
        }
        Ok(())
    }
}

/// Run one update/add pass for a configured domain
///
/// Host list and record type are checked before any call is made, so a
/// bad host list or an unresolvable value issues zero API calls.
pub async fn reconcile_domain<S: AsRef<str>>(
    api: &dyn RecordApi,
    domain: &str,
    hosts: Option<&[S]>,
    value: &str,
    explicit_type: Option<RecordType>,
    ttl: u32,
) -> Result<PassReport> {
    let hosts = HostMap::build(domain, hosts)?;
    let desired = DesiredState::new(hosts, value, explicit_type)?;

    let mut reconciler = Reconciler::new(api, domain, ttl)?;
    reconciler.sync(&desired).await
}
