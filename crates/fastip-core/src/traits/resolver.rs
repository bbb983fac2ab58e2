// # Address Resolver Trait
//
// Defines the interface for looking up the current IPv4 addresses of the
// source ("fast IP") domain.
//
// ## Implementations
//
// - DNS-over-HTTPS JSON: `fastip-resolver-doh` crate
//
// ## Usage
//
// ```rust,ignore
// use fastip_core::AddressResolver;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let resolver = /* AddressResolver implementation */;
//
//     let addrs = resolver.resolve_addresses("zecrimp.top").await?;
//     println!("fast IPs: {:?}", addrs);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::Ipv4Addr;

/// Trait for source-domain resolvers
///
/// A resolver performs a single one-shot lookup per call and holds no state
/// between calls.
///
/// # Empty results
///
/// An empty vector means "nothing to converge to". The job treats it as a
/// reason to skip the provider entirely, never as an instruction to clear the
/// target record.
///
/// # Forbidden Capabilities
/// - ❌ Caching answers across runs (each run computes desired state from scratch)
/// - ❌ Retrying internally (the next scheduled run is the retry)
/// - ❌ Talking to the DNS provider
#[async_trait]
pub trait AddressResolver: Send + Sync {
    /// Resolve the IPv4 addresses currently advertised by `domain`
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<Ipv4Addr>)`: Addresses in answer order (may be empty)
    /// - `Err(Error)`: If the lookup itself failed
    async fn resolve_addresses(&self, domain: &str) -> Result<Vec<Ipv4Addr>, crate::Error>;

    /// Resolver name (for logging/debugging)
    fn resolver_name(&self) -> &'static str;
}
