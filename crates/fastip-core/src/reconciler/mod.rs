//! Cloud DNS reconciler
//!
//! The Reconciler is responsible for:
//! - Locating the provider zone for the target name
//! - Locating the existing A record set, if any
//! - Deciding whether a write is needed
//! - Issuing exactly one create or update call when it is
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────┐  list_zones   ┌──────────────┐  list_record_sets  ┌────────────────┐
//! │ Idle │──────────────▶│ ZoneResolved │───────────────────▶│ RecordResolved │
//! └──────┘               └──────────────┘                    └────────────────┘
//!    │                          │                                    │ plan()
//!    ▼                          ▼                                    ▼
//! ┌────────┐             ┌────────┐                          ┌────────────┐
//! │ Failed │             │ Failed │                          │ Reconciled │
//! └────────┘             └────────┘                          └────────────┘
//! ```
//!
//! Every stage completes before the next one starts. The write, if any, is the
//! last step, so a run that fails or is cancelled earlier leaves the provider
//! untouched.
//!
//! `Failed` is [`Error::Reconcile`]: it carries the [`Stage`] the pipeline had
//! reached, so a 401 on the zone lookup and a 401 on the write stay apart.

pub mod plan;

pub use plan::{Action, DesiredState, RecordSelection};

use crate::error::{Error, Result};
use crate::traits::{DnsApi, Outcome, RECORD_TYPE_A, RecordSet, Zone};
use std::fmt;
use tracing::{debug, info, warn};

/// Pipeline stage, reported with failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Nothing looked up yet
    Idle,
    /// Zone located
    ZoneResolved,
    /// Existing record (or its absence) known
    RecordResolved,
    /// Provider converged
    Reconciled,
}

impl Stage {
    /// The step that runs from this stage
    pub fn next_step(&self) -> &'static str {
        match self {
            Stage::Idle => "zone lookup",
            Stage::ZoneResolved => "record lookup",
            Stage::RecordResolved => "write",
            Stage::Reconciled => "nothing",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::ZoneResolved => "zone-resolved",
            Stage::RecordResolved => "record-resolved",
            Stage::Reconciled => "reconciled",
        };
        f.write_str(name)
    }
}

/// State after the zone lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneResolved {
    /// The zone holding the target
    pub zone: Zone,
}

/// State after the record lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordResolved {
    /// The zone holding the target
    pub zone: Zone,
    /// The authoritative record set, if one exists
    pub existing: Option<RecordSet>,
    /// Number of matching A record sets at the provider
    pub matching: usize,
}

/// Cloud DNS reconciler
///
/// Holds nothing but the API client; zones and records are fetched fresh on
/// every call and dropped afterwards.
pub struct Reconciler {
    /// DNS provider API
    api: Box<dyn DnsApi>,
}

impl Reconciler {
    /// Create a new reconciler on top of a provider client
    pub fn new(api: Box<dyn DnsApi>) -> Self {
        Self { api }
    }

    /// Converge the provider's A record for `desired.target` to `desired.addresses`
    ///
    /// # Returns
    ///
    /// - `Ok(Outcome::Unchanged)`: No write was needed
    /// - `Ok(Outcome::Updated)` / `Ok(Outcome::Created)`: One write was issued
    /// - `Err(Error::Reconcile { stage, .. })`: Discovery or the write failed
    ///   (no retry is attempted)
    pub async fn reconcile(&self, desired: &DesiredState) -> Result<Outcome> {
        if desired.is_empty() {
            return Err(Error::invalid_input(format!(
                "refusing to reconcile {} with an empty address set",
                desired.target
            )));
        }

        let zone = self
            .resolve_zone(&desired.target)
            .await
            .map_err(|e| e.at_stage(Stage::Idle))?;

        let resolved = self
            .resolve_record(zone, &desired.target)
            .await
            .map_err(|e| e.at_stage(Stage::ZoneResolved))?;

        let outcome = self
            .apply(desired, resolved)
            .await
            .map_err(|e| e.at_stage(Stage::RecordResolved))?;

        debug!("{} reached stage {}", desired.target, Stage::Reconciled);
        Ok(outcome)
    }

    /// Locate the zone holding `target`
    ///
    /// The zone must already exist at the provider; it is never created here.
    pub async fn resolve_zone(&self, target: &str) -> Result<ZoneResolved> {
        let candidate = plan::derive_zone_name(target)?;
        debug!("Looking up zone {} for {}", candidate, target);

        let zones = self.api.list_zones(&candidate).await?;

        let zone = plan::select_zone(&candidate, &zones)
            .cloned()
            .ok_or_else(|| {
                Error::zone_not_found(format!(
                    "{} ({} candidate(s) returned by {})",
                    candidate,
                    zones.len(),
                    self.api.provider_name()
                ))
            })?;

        debug!("Found zone {} ({})", zone.name, zone.id);
        Ok(ZoneResolved { zone })
    }

    /// Locate the existing A record set for `target` inside the resolved zone
    pub async fn resolve_record(&self, state: ZoneResolved, target: &str) -> Result<RecordResolved> {
        let ZoneResolved { zone } = state;

        let records = self
            .api
            .list_record_sets(&zone.id, target, RECORD_TYPE_A)
            .await?;

        let selection = plan::select_record(target, &records);

        if selection.has_duplicates() {
            warn!(
                "{} A record sets exist for {}; using {} and leaving the others untouched",
                selection.matching,
                target,
                selection.record.map(|r| r.id.as_str()).unwrap_or_default()
            );
        }

        match selection.record {
            Some(record) => debug!("Found record set {} -> {:?}", record.id, record.records),
            None => debug!("No A record set exists for {}", target),
        }

        Ok(RecordResolved {
            existing: selection.record.cloned(),
            matching: selection.matching,
            zone,
        })
    }

    /// Issue the write decided by [`plan::plan`], if any
    pub async fn apply(&self, desired: &DesiredState, state: RecordResolved) -> Result<Outcome> {
        let RecordResolved { zone, existing, .. } = state;

        match plan::plan(desired, existing.as_ref()) {
            Action::Noop => {
                info!(
                    "{} is already up to date ({} address(es))",
                    desired.target,
                    desired.addresses.len()
                );
                Ok(Outcome::Unchanged {
                    addresses: desired.addresses.clone(),
                })
            }
            Action::Create(spec) => {
                info!(
                    "Creating A record set {} -> {:?} (ttl {:?})",
                    desired.target, spec.records, spec.ttl
                );
                self.api.create_record_set(&zone.id, &spec).await?;
                Ok(Outcome::Created {
                    addresses: desired.addresses.clone(),
                })
            }
            Action::Update {
                record_id,
                spec,
                previous,
            } => {
                info!(
                    "Updating A record set {} -> {:?} (was: {:?})",
                    desired.target, spec.records, previous
                );
                self.api
                    .update_record_set(&zone.id, &record_id, &spec)
                    .await?;
                Ok(Outcome::Updated {
                    previous,
                    addresses: desired.addresses.clone(),
                })
            }
        }
    }

    /// Name of the underlying provider
    pub fn provider_name(&self) -> &'static str {
        self.api.provider_name()
    }
}
