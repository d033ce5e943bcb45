//! Run orchestrator
//!
//! One invocation asks the IP source for the current address once, then
//! reconciles every configured domain in order. A domain that fails is
//! logged and skipped; only an IP source failure aborts the run.

use crate::config::{DdnsConfig, DomainConfig};
use crate::engine::{BatchOutcome, DeleteFilter, PassReport, Reconciler, reconcile_domain};
use crate::error::{Error, Result};
use crate::traits::{IpSource, RecordApi};
use chrono::{DateTime, Local};
use std::net::IpAddr;
use std::time::Duration;
use tracing::{error, info, warn};

/// How one configured domain fared in a run
#[derive(Debug)]
pub enum DomainOutcome {
    /// The pass ran; individual calls may still have failed
    Reconciled(PassReport),
    /// The pass could not run (bad host list, list failure, ...)
    Failed {
        domain: String,
        error: Error,
    },
}

impl DomainOutcome {
    pub fn domain(&self) -> &str {
        match self {
            DomainOutcome::Reconciled(report) => &report.domain,
            DomainOutcome::Failed { domain, .. } => domain,
        }
    }

    pub fn report(&self) -> Option<&PassReport> {
        match self {
            DomainOutcome::Reconciled(report) => Some(report),
            DomainOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&Error> {
        match self {
            DomainOutcome::Reconciled(_) => None,
            DomainOutcome::Failed { error, .. } => Some(error),
        }
    }
}

/// Everything one run did
#[derive(Debug)]
pub struct RunSummary {
    /// Local time the run started
    pub started_at: DateTime<Local>,
    /// Address published during this run
    pub ip: IpAddr,
    /// One entry per configured domain, in configuration order
    pub domains: Vec<DomainOutcome>,
}

impl RunSummary {
    /// Domains whose pass could not run
    pub fn failed_domains(&self) -> usize {
        self.domains
            .iter()
            .filter(|outcome| outcome.error().is_some())
            .count()
    }

    /// Failed create/update calls across all reconciled domains
    pub fn failed_operations(&self) -> usize {
        self.domains
            .iter()
            .filter_map(DomainOutcome::report)
            .map(PassReport::failed)
            .sum()
    }

    /// Whether every domain ran and every call succeeded
    pub fn is_clean(&self) -> bool {
        self.failed_domains() == 0 && self.failed_operations() == 0
    }
}

/// Drives the reconciliation engine over the configured domains
///
/// ## Lifecycle
///
/// 1. Create with [`Orchestrator::new()`]
/// 2. Call [`Orchestrator::run_once()`] (or [`Orchestrator::delete()`])
/// 3. Drop
pub struct Orchestrator {
    /// Record API shared by every domain's pass
    api: Box<dyn RecordApi>,

    /// IP oracle
    ip_source: Box<dyn IpSource>,

    /// Validated configuration
    config: DdnsConfig,
}

impl Orchestrator {
    /// Create a new orchestrator
    ///
    /// Only global settings are validated here. A missing credential is
    /// reported but not rejected; the provider will refuse the calls.
    pub fn new(
        api: Box<dyn RecordApi>,
        ip_source: Box<dyn IpSource>,
        config: DdnsConfig,
    ) -> Result<Self> {
        config.validate()?;

        if !config.provider.has_credential() {
            warn!(
                "No API key configured for {}; requests will be rejected",
                config.provider.type_name()
            );
        }

        Ok(Self {
            api,
            ip_source,
            config,
        })
    }

    pub fn config(&self) -> &DdnsConfig {
        &self.config
    }

    /// Run one reconciliation pass per configured domain
    ///
    /// # Returns
    ///
    /// - `Ok(RunSummary)`: Every domain was attempted
    /// - `Err(Error)`: The IP source failed; no domain was touched
    pub async fn run_once(&self) -> Result<RunSummary> {
        let started_at = Local::now();
        info!(
            "DDNS run started at {}",
            started_at.format("%Y-%m-%d %H:%M:%S")
        );

        let ip = match self.ip_source.current().await {
            Ok(ip) => ip,
            Err(e) => {
                error!(
                    "Could not determine public IP via {}: {}",
                    self.ip_source.source_name(),
                    e
                );
                return Err(e);
            }
        };
        info!("Current public IP: {}", ip);

        let mut domains = Vec::with_capacity(self.config.domains.len());
        for domain in &self.config.domains {
            let outcome = match self.reconcile_with_retry(domain, ip).await {
                Ok(report) => DomainOutcome::Reconciled(report),
                Err(e) => {
                    error!("DDNS pass for {} failed: {}", domain.domain, e);
                    DomainOutcome::Failed {
                        domain: domain.domain.clone(),
                        error: e,
                    }
                }
            };
            domains.push(outcome);
        }

        let summary = RunSummary {
            started_at,
            ip,
            domains,
        };
        info!(
            "DDNS run complete: {} domains, {} failed, {} failed operations",
            summary.domains.len(),
            summary.failed_domains(),
            summary.failed_operations()
        );
        Ok(summary)
    }

    /// Delete every record on `domain` matching `filter`
    pub async fn delete(&self, domain: &str, filter: &DeleteFilter) -> Result<BatchOutcome> {
        let mut reconciler = Reconciler::new(self.api.as_ref(), domain, self.config.ttl)?;
        reconciler.delete(filter).await
    }

    /// Run one domain's pass, repeating it on retryable failures
    ///
    /// The pass is retried as a whole: every attempt re-fetches the
    /// domain's records before deciding anything.
    async fn reconcile_with_retry(&self, domain: &DomainConfig, ip: IpAddr) -> Result<PassReport> {
        let value = ip.to_string();
        let max_retries = self.config.engine.max_retries;

        let mut attempt = 0;
        loop {
            let result = reconcile_domain(
                self.api.as_ref(),
                &domain.domain,
                domain.hosts.as_deref(),
                &value,
                domain.record_type,
                self.config.ttl,
            )
            .await;

            match result {
                Err(e) if e.is_retryable() && attempt < max_retries => {
                    attempt += 1;
                    warn!(
                        "DDNS pass for {} failed (attempt {}/{}): {}",
                        domain.domain,
                        attempt,
                        max_retries + 1,
                        e
                    );
                    tokio::time::sleep(Duration::from_secs(self.config.engine.retry_delay_secs))
                        .await;
                }
                other => return other,
            }
        }
    }
}
