//! Pure decision logic for the reconciler
//!
//! Nothing in here performs I/O, so every rule about which zone, which record
//! and which write can be tested without a provider.

use crate::error::{Error, Result};
use crate::traits::{
    DEFAULT_TTL, RECORD_TYPE_A, RecordSet, RecordSetSpec, Zone, normalize_name,
};
use std::collections::BTreeSet;
use std::net::Ipv4Addr;

/// Target name plus the addresses it should resolve to for this run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredState {
    /// Target domain name
    pub target: String,
    /// Desired addresses, de-duplicated, first-seen order kept
    pub addresses: Vec<Ipv4Addr>,
}

impl DesiredState {
    /// Build a desired state, dropping repeated addresses
    pub fn new(target: impl Into<String>, addresses: impl IntoIterator<Item = Ipv4Addr>) -> Self {
        let mut seen = BTreeSet::new();
        let addresses = addresses
            .into_iter()
            .filter(|ip| seen.insert(*ip))
            .collect();

        Self {
            target: target.into(),
            addresses,
        }
    }

    /// Whether there is nothing to converge to
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

/// Write (or not) that brings the provider to the desired state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Existing record already matches
    Noop,
    /// No record exists yet
    Create(RecordSetSpec),
    /// Replace the values of an existing record
    Update {
        /// Provider ID of the record set
        record_id: String,
        /// Replacement body
        spec: RecordSetSpec,
        /// Values held before the update
        previous: Vec<String>,
    },
}

/// Candidate zone for a target: the target minus its leftmost label
///
/// `cf.hw.072103.xyz` -> `hw.072103.xyz`. This is a heuristic: it picks the
/// wrong zone when the zone sits more than one label above the target, and
/// under multi-label public suffixes such as `co.uk`.
pub fn derive_zone_name(target: &str) -> Result<String> {
    let target = normalize_name(target);
    match target.split_once('.') {
        Some((label, parent)) if !label.is_empty() && !parent.is_empty() => Ok(parent.to_string()),
        _ => Err(Error::invalid_input(format!(
            "cannot derive a zone from '{}': it has no parent label",
            target
        ))),
    }
}

/// Pick the zone for `candidate` among the provider's matches
///
/// An exact name match wins; otherwise the first zone (provider order) whose
/// name contains the candidate.
pub fn select_zone<'a>(candidate: &str, zones: &'a [Zone]) -> Option<&'a Zone> {
    let candidate = normalize_name(candidate);

    zones
        .iter()
        .find(|zone| normalize_name(&zone.name) == candidate)
        .or_else(|| {
            zones
                .iter()
                .find(|zone| normalize_name(&zone.name).contains(&candidate))
        })
}

/// Record chosen as the reconciliation target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSelection<'a> {
    /// The authoritative record, if any
    pub record: Option<&'a RecordSet>,
    /// How many matching A records the provider holds
    pub matching: usize,
}

impl RecordSelection<'_> {
    /// More than one A record exists for the name
    pub fn has_duplicates(&self) -> bool {
        self.matching > 1
    }
}

/// Pick the authoritative A record for `target`
///
/// Entries whose name or type does not match are ignored (provider filters
/// can be fuzzy). With duplicates the first one in provider order is chosen;
/// they are never merged or deleted.
pub fn select_record<'a>(target: &str, records: &'a [RecordSet]) -> RecordSelection<'a> {
    let target = normalize_name(target);
    let mut candidates = records.iter().filter(|record| {
        normalize_name(&record.name) == target
            && record.record_type.eq_ignore_ascii_case(RECORD_TYPE_A)
    });

    let record = candidates.next();
    let matching = record.map_or(0, |_| 1 + candidates.count());

    RecordSelection { record, matching }
}

/// Order-insensitive comparison of provider values against desired addresses
///
/// A value that is not an IPv4 address never matches.
pub fn same_addresses(existing: &[String], desired: &[Ipv4Addr]) -> bool {
    let existing: Option<BTreeSet<Ipv4Addr>> = existing
        .iter()
        .map(|value| value.trim().parse::<Ipv4Addr>().ok())
        .collect();

    match existing {
        Some(existing) => existing == desired.iter().copied().collect::<BTreeSet<_>>(),
        None => false,
    }
}

/// Decide the write for this run
///
/// Updates keep the existing TTL (or send none when the provider did not
/// report one); creates use [`DEFAULT_TTL`].
pub fn plan(desired: &DesiredState, existing: Option<&RecordSet>) -> Action {
    match existing {
        None => Action::Create(RecordSetSpec::a(
            &desired.target,
            Some(DEFAULT_TTL),
            &desired.addresses,
        )),
        Some(record) if same_addresses(&record.records, &desired.addresses) => Action::Noop,
        Some(record) => Action::Update {
            record_id: record.id.clone(),
            spec: RecordSetSpec::a(
                &desired.target,
                record.ttl,
                &desired.addresses,
            ),
            previous: record.records.clone(),
        },
    }
}
