// # DNS API Trait
//
// Defines the interface to a cloud DNS provider's management API.
//
// ## Implementations
//
// - Huawei Cloud DNS v2: `fastip-provider-huaweicloud` crate
//
// ## Usage
//
// ```rust,ignore
// use fastip_core::DnsApi;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let api = /* DnsApi implementation */;
//
//     let zones = api.list_zones("hw.072103.xyz").await?;
//     let records = api
//         .list_record_sets(&zones[0].id, "cf.hw.072103.xyz", RECORD_TYPE_A)
//         .await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

/// The only record type this system manages
pub const RECORD_TYPE_A: &str = "A";

/// TTL used when a record set has to be created
pub const DEFAULT_TTL: u32 = 300;

/// A DNS zone owned by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    /// Provider-assigned zone ID
    pub id: String,
    /// Zone name, possibly with a trailing dot
    pub name: String,
}

/// A named, typed record set within a zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSet {
    /// Provider-assigned record set ID (canonical key for updates)
    pub id: String,
    /// Record name, possibly with a trailing dot
    pub name: String,
    /// Record type, e.g. "A"
    pub record_type: String,
    /// Time-to-live in seconds
    pub ttl: Option<u32>,
    /// Record values in provider order
    pub records: Vec<String>,
}

/// Body of a create or update call
///
/// `records` always carries the complete desired list; the provider replaces
/// the previous values atomically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSetSpec {
    /// Record name (without trailing dot, the provider adds its own form)
    pub name: String,
    /// Record type
    pub record_type: String,
    /// Time-to-live in seconds; `None` leaves the provider's value alone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    /// Full list of values
    pub records: Vec<String>,
}

impl RecordSetSpec {
    /// Build an A record spec from addresses
    pub fn a(name: impl Into<String>, ttl: Option<u32>, addresses: &[Ipv4Addr]) -> Self {
        Self {
            name: name.into(),
            record_type: RECORD_TYPE_A.to_string(),
            ttl,
            records: addresses.iter().map(|ip| ip.to_string()).collect(),
        }
    }
}

/// Result of a reconciliation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Provider already held the desired addresses (no write)
    Unchanged {
        /// The current addresses
        addresses: Vec<Ipv4Addr>,
    },
    /// Existing record set was replaced
    Updated {
        /// Values held before the update
        previous: Vec<String>,
        /// The new addresses
        addresses: Vec<Ipv4Addr>,
    },
    /// Record set did not exist and was created
    Created {
        /// The created addresses
        addresses: Vec<Ipv4Addr>,
    },
    /// Source domain resolved to nothing; the provider was not contacted
    NoAddresses,
}

impl Outcome {
    /// Short label for logs and the status page
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Unchanged { .. } => "unchanged",
            Outcome::Updated { .. } => "updated",
            Outcome::Created { .. } => "created",
            Outcome::NoAddresses => "aborted: no addresses",
        }
    }

    /// Whether this outcome involved a provider write
    pub fn is_write(&self) -> bool {
        matches!(self, Outcome::Updated { .. } | Outcome::Created { .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |addrs: &[Ipv4Addr]| {
            addrs
                .iter()
                .map(|ip| ip.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };

        match self {
            Outcome::Unchanged { addresses } => {
                write!(f, "already up to date [{}]", join(addresses))
            }
            Outcome::Updated {
                previous,
                addresses,
            } => write!(
                f,
                "updated [{}] -> [{}]",
                previous.join(", "),
                join(addresses)
            ),
            Outcome::Created { addresses } => write!(f, "created [{}]", join(addresses)),
            Outcome::NoAddresses => write!(f, "aborted: source domain returned no addresses"),
        }
    }
}

/// Provider form of a name: lower-cased, with exactly one trailing dot
pub fn fqdn(name: &str) -> String {
    format!("{}.", normalize_name(name))
}

/// Comparison form of a name: lower-cased, without trailing dot
pub fn normalize_name(name: &str) -> String {
    name.trim().trim_end_matches('.').to_ascii_lowercase()
}

/// Trait for DNS provider API clients
///
/// Each method maps to exactly one authenticated HTTP call.
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Perform HTTP/HTTPS API calls to their endpoint only
/// - ✅ Parse provider-specific responses
/// - ✅ Return success or failure (the next scheduled run is the retry)
///
/// ## Forbidden Capabilities
/// - ❌ Retry or back off
/// - ❌ Decide whether an update is needed (owned by `Reconciler`)
/// - ❌ Cache zones or records across calls
/// - ❌ Create zones
#[async_trait]
pub trait DnsApi: Send + Sync {
    /// List zones whose name matches `name` (provider-side filter)
    async fn list_zones(&self, name: &str) -> Result<Vec<Zone>, crate::Error>;

    /// List record sets in a zone filtered by name and type
    async fn list_record_sets(
        &self,
        zone_id: &str,
        name: &str,
        record_type: &str,
    ) -> Result<Vec<RecordSet>, crate::Error>;

    /// Create a record set
    async fn create_record_set(
        &self,
        zone_id: &str,
        spec: &RecordSetSpec,
    ) -> Result<RecordSet, crate::Error>;

    /// Replace an existing record set
    async fn update_record_set(
        &self,
        zone_id: &str,
        record_id: &str,
        spec: &RecordSetSpec,
    ) -> Result<RecordSet, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing DNS API clients from configuration
///
/// The job calls this once per run, after configuration has been validated.
pub trait DnsApiFactory: Send + Sync {
    /// Create a DnsApi instance from configuration
    fn create(
        &self,
        config: &crate::config::ProviderConfig,
    ) -> Result<Box<dyn DnsApi>, crate::Error>;
}
