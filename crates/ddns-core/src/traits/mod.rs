//! Core traits for the DDNS system
//!
//! This module defines the abstract interfaces at the I/O seams.
//!
//! - [`RecordApi`]: List/create/update/delete records at a DNS provider
//! - [`IpSource`]: Discover the current public IP

pub mod ip_source;
pub mod record_api;

pub use ip_source::IpSource;
pub use record_api::{Operation, RecordApi, RecordEntry};
