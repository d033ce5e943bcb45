// # ddns-core
//
// Core library for the NameSilo dynamic DNS updater.
//
// ## Architecture Overview
//
// This library provides the decision logic for keeping hostnames pointed
// at the current public IP:
// - **RecordApi**: Trait for the provider's list/create/update/delete operations
// - **IpSource**: Trait for asking an external oracle for the public IP
// - **HostMap**: Short host labels resolved to fully-qualified names
// - **DomainRecordStore**: Explicitly invalidated snapshot of a domain's records
// - **Reconciler**: Update/add pass and filtered delete for one domain
// - **Orchestrator**: One run over every configured domain
//
// ## Design Principles
//
// 1. **Library-First**: The binary only reads the environment and wires crates
// 2. **Sequential**: One call in flight at a time, one domain after another
// 3. **Re-fetch, never patch**: Local state is discarded after every mutation
// 4. **Best-effort batches**: Per-record failures are counted, not propagated

pub mod config;
pub mod engine;
pub mod error;
pub mod hosts;
pub mod orchestrator;
pub mod record;
pub mod store;
pub mod traits;

// Re-export core types for convenience
pub use config::{DdnsConfig, DomainConfig, EngineConfig, IpSourceConfig, ProviderConfig};
pub use engine::{
    BatchOutcome, DeleteFilter, DesiredState, OperationFailure, PassReport, Plan, Reconciler,
    reconcile_domain,
};
pub use error::{Error, ProviderFailure, Result};
pub use hosts::HostMap;
pub use orchestrator::{DomainOutcome, Orchestrator, RunSummary};
pub use record::{RecordType, ResourceRecord};
pub use store::{DomainRecordStore, DomainSnapshot};
pub use traits::{IpSource, Operation, RecordApi, RecordEntry};
