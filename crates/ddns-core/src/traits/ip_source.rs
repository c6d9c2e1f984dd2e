// # IP Source Trait
//
// Defines the interface for discovering the host's current public address.
//
// ## Implementations
//
// - HTTP echo services: `ddns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::{IpFamily, IpSource};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* IpSource implementation */;
//
//     let ipv4 = source.current(IpFamily::V4).await?;
//     println!("Current IPv4: {}", ipv4);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::IpAddr;

use crate::types::IpFamily;

/// Trait for IP source implementations
///
/// One call answers one family for one reconciliation pass. Implementations
/// try their endpoints in order and skip the ones that fail; only when
/// every endpoint fails do they return [`crate::Error::IpUnavailable`].
///
/// # Family consistency
///
/// The returned address must belong to the requested family. An IPv6 query
/// answered with an address expressible as IPv4 is a misbehaving endpoint and
/// must be reported as `IpUnavailable` instead of returned.
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Get the current public address for a family
    ///
    /// # Returns
    ///
    /// - `Ok(IpAddr)`: The current address
    /// - `Err(Error::IpUnavailable)`: No endpoint produced a valid address
    async fn current(&self, family: IpFamily) -> Result<IpAddr, crate::Error>;
}
