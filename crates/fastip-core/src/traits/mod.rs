//! Core traits for fastip-sync
//!
//! This module defines the abstract interfaces the reconciler is built on.
//!
//! - [`AddressResolver`]: Look up the source domain's addresses
//! - [`DnsApi`]: Talk to the cloud DNS provider

pub mod dns_api;
pub mod resolver;

pub use dns_api::{
    DEFAULT_TTL, DnsApi, DnsApiFactory, Outcome, RECORD_TYPE_A, RecordSet, RecordSetSpec, Zone,
    fqdn, normalize_name,
};
pub use resolver::AddressResolver;
