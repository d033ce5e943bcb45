// # IP Source Trait
//
// Defines the interface for discovering the machine's current public IP.
//
// ## Implementations
//
// - HTTP-based: `ddns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::IpSource;
//
// #[tokio::main]
// async fn main() -> ddns_core::Result<()> {
//     let source = /* IpSource implementation */;
//     let current_ip = source.current().await?;
//     println!("Publishing {}", current_ip);
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::IpAddr;

/// Trait for IP source implementations
///
/// A single blocking question: what is our public address right now?
///
/// # Trust Level: Semi-Trusted
///
/// ## Forbidden Capabilities
/// - ❌ Perform DNS updates (use `RecordApi`)
/// - ❌ Implement retry logic (use the orchestrator)
/// - ❌ Cache the answer across runs
///
/// A failure here aborts the whole run: without an address there is no
/// desired state to reconcile toward.
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Get the current public IP address
    ///
    /// # Returns
    ///
    /// - `Ok(IpAddr)`: The current IP address
    /// - `Err(Error)`: If the address could not be determined
    async fn current(&self) -> Result<IpAddr, crate::Error>;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str {
        "unknown"
    }
}
