//! Per-item results accumulated into batch outcomes

use crate::error::Result;
use crate::record::RecordType;
use std::fmt;

/// One failed create/update/delete call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationFailure {
    /// Host the call was about
    pub host: String,
    /// Record the call targeted, if it targeted an existing one
    pub record_id: Option<String>,
    /// Rendered error
    pub error: String,
}

/// Counts and failures of a best-effort batch
///
/// Every item is attempted; a failed item is recorded here instead of
/// aborting the items after it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    attempted: usize,
    failures: Vec<OperationFailure>,
}

impl BatchOutcome {
    /// Record the result of one attempted call
    pub fn record(&mut self, host: &str, record_id: Option<&str>, result: &Result<()>) {
        self.attempted += 1;
        if let Err(e) = result {
            self.failures.push(OperationFailure {
                host: host.to_string(),
                record_id: record_id.map(str::to_string),
                error: e.to_string(),
            });
        }
    }

    pub fn attempted(&self) -> usize {
        self.attempted
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn succeeded(&self) -> usize {
        self.attempted - self.failures.len()
    }

    pub fn failures(&self) -> &[OperationFailure] {
        &self.failures
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Result of one update/add pass over a domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    pub domain: String,
    pub record_type: RecordType,
    pub value: String,
    pub updates: BatchOutcome,
    pub adds: BatchOutcome,
}

impl PassReport {
    pub fn failed(&self) -> usize {
        self.updates.failed() + self.adds.failed()
    }

    /// Whether the pass issued no mutating call at all
    pub fn is_noop(&self) -> bool {
        self.updates.attempted() == 0 && self.adds.attempted() == 0
    }
}

impl fmt::Display for PassReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} {}): {} hosts required updates, {} errors; {} hosts required adds, {} errors",
            self.domain,
            self.record_type,
            self.value,
            self.updates.attempted(),
            self.updates.failed(),
            self.adds.attempted(),
            self.adds.failed(),
        )
    }
}
