// # fastip-core
//
// Core library for keeping a cloud DNS record in sync with the addresses
// advertised by a "fast IP" source domain.
//
// ## Architecture Overview
//
// - **AddressResolver**: Trait for looking up the source domain's IPv4 addresses
// - **DnsApi**: Trait for the cloud DNS provider's management API
// - **Reconciler**: Zone lookup → record lookup → single idempotent write
// - **SyncJob**: Resolver + Reconciler, the unit every trigger runs
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Decision logic (`reconciler::plan`) is pure;
//    I/O lives behind the traits
// 2. **Desired state from scratch**: Nothing is cached or persisted between runs
// 3. **Idempotency**: Equal address sets (order-insensitive) never cause a write
// 4. **No hidden retries**: A failed run is reported; the next trigger retries
// 5. **Library-First**: The daemon is a thin adapter over `SyncJob`

pub mod traits;
pub mod reconciler;
pub mod job;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use traits::{AddressResolver, DnsApi, DnsApiFactory, Outcome, RecordSet, RecordSetSpec, Zone};
pub use reconciler::{DesiredState, Reconciler, Stage};
pub use job::{SyncJob, run_reconciliation};
pub use config::{Credential, EndpointConfig, ProviderConfig, ScheduleConfig, SyncConfig};
pub use error::{Error, Result};
