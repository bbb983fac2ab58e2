//! The sync job: resolve the source domain, then reconcile the target
//!
//! Scheduled and manual triggers both call [`SyncJob::run_once`] (usually
//! through [`SyncJob::run_with_deadline`]); there is no behavioural difference
//! between them.

use crate::config::{ProviderConfig, SyncConfig};
use crate::error::{Error, Result};
use crate::reconciler::{DesiredState, Reconciler};
use crate::traits::{AddressResolver, DnsApiFactory, Outcome};
use std::time::Duration;
use tracing::{info, warn};

/// One source -> target synchronisation, runnable any number of times
///
/// Nothing is carried from one run to the next: credentials, the API client,
/// the zone and the record are all rebuilt or re-fetched on every run.
pub struct SyncJob {
    config: SyncConfig,
    resolver: Box<dyn AddressResolver>,
    factory: Box<dyn DnsApiFactory>,
}

impl SyncJob {
    /// Create a new job
    pub fn new(
        config: SyncConfig,
        resolver: Box<dyn AddressResolver>,
        factory: Box<dyn DnsApiFactory>,
    ) -> Self {
        Self {
            config,
            resolver,
            factory,
        }
    }

    /// The job's configuration
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Run once
    pub async fn run_once(&self) -> Result<Outcome> {
        self.config.validate()?;

        run_reconciliation(
            &self.config.source_domain,
            &self.config.target_domain,
            &self.config.provider,
            self.resolver.as_ref(),
            self.factory.as_ref(),
        )
        .await
    }

    /// Run once, giving up after `deadline`
    ///
    /// On expiry the in-flight request is dropped and `Error::Timeout` is
    /// returned. Since the write is the final call, an expired run has either
    /// written nothing or completed its single write.
    pub async fn run_with_deadline(&self, deadline: Duration) -> Result<Outcome> {
        match tokio::time::timeout(deadline, self.run_once()).await {
            Ok(result) => result,
            Err(_) => Err(Error::timeout(format!(
                "sync of {} did not finish within {:?}",
                self.config.target_domain, deadline
            ))),
        }
    }
}

/// Resolve `source_domain` and converge `target_domain` to its addresses
///
/// # Order of checks
///
/// 1. Provider configuration (credentials) is validated; nothing touches the
///    network if it is incomplete.
/// 2. The source domain is resolved. No addresses means
///    [`Outcome::NoAddresses`] and the provider is never contacted.
/// 3. A provider client is built and the [`Reconciler`] runs.
pub async fn run_reconciliation(
    source_domain: &str,
    target_domain: &str,
    provider: &ProviderConfig,
    resolver: &dyn AddressResolver,
    factory: &dyn DnsApiFactory,
) -> Result<Outcome> {
    provider.validate()?;

    info!(
        "Resolving {} via {}",
        source_domain,
        resolver.resolver_name()
    );
    let addresses = resolver
        .resolve_addresses(source_domain)
        .await
        .map_err(|e| match e {
            Error::Resolution(_) => e,
            other => Error::resolution(format!("{}: {}", source_domain, other)),
        })?;

    let desired = DesiredState::new(target_domain, addresses);
    if desired.is_empty() {
        warn!(
            "No addresses found for {}; not updating {}",
            source_domain, target_domain
        );
        return Ok(Outcome::NoAddresses);
    }
    info!(
        "Got {} address(es) for {}: {:?}",
        desired.addresses.len(),
        source_domain,
        desired.addresses
    );

    let api = factory.create(provider)?;
    let reconciler = Reconciler::new(api);
    let outcome = reconciler.reconcile(&desired).await?;

    info!(
        "Sync {} -> {} via {}: {}",
        source_domain,
        target_domain,
        reconciler.provider_name(),
        outcome
    );
    Ok(outcome)
}
