//! Contract Test: Sync Job Ordering
//!
//! Constraints verified:
//! - No source addresses means no provider client and no provider calls
//! - Incomplete credentials fail before anything touches the network
//! - Resolver failures are reported as resolution errors
//! - A run that outlives its deadline is abandoned without a write

mod common;

use common::*;
use fastip_core::config::{Credential, EndpointConfig, ProviderConfig, SyncConfig};
use fastip_core::error::Error;
use fastip_core::job::SyncJob;
use fastip_core::traits::Outcome;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

const TARGET: &str = "cf.hw.072103.xyz";

fn job_with(
    config: SyncConfig,
    resolver: &StaticResolver,
    factory: &MockFactory,
) -> SyncJob {
    SyncJob::new(
        config,
        Box::new(resolver.clone()),
        Box::new(MockFactory::sharing_counters_with(factory)),
    )
}

#[tokio::test]
async fn empty_source_aborts_before_provider() {
    let api = MockDnsApi::new().with_zone("zone-1", "hw.072103.xyz.");
    let factory = MockFactory::new(&api);
    let resolver = StaticResolver::new(&[]);
    let job = job_with(minimal_config(TARGET), &resolver, &factory);

    let outcome = assert_ok!(job.run_once().await);

    assert_eq!(outcome, Outcome::NoAddresses);
    assert_eq!(resolver.calls(), 1);
    assert_eq!(factory.create_calls(), 0, "no client is built");
    assert_eq!(api.total_calls(), 0);
}

#[tokio::test]
async fn full_run_creates_the_record() {
    let api = MockDnsApi::new().with_zone("zone-1", "hw.072103.xyz.");
    let factory = MockFactory::new(&api);
    let resolver = StaticResolver::new(&["104.16.1.1", "104.16.2.2", "104.16.1.1"]);
    let job = job_with(minimal_config(TARGET), &resolver, &factory);

    let outcome = assert_ok!(job.run_once().await);

    assert_eq!(
        outcome,
        Outcome::Created {
            addresses: ips(&["104.16.1.1", "104.16.2.2"])
        }
    );
    assert_eq!(factory.create_calls(), 1);
    assert_eq!(
        api.writes()[0].spec().records,
        vec!["104.16.1.1", "104.16.2.2"],
        "duplicates from the resolver are dropped"
    );
}

#[tokio::test]
async fn missing_credentials_fail_before_resolution() {
    let api = MockDnsApi::new().with_zone("zone-1", "hw.072103.xyz.");
    let factory = MockFactory::new(&api);
    let resolver = StaticResolver::new(&["1.1.1.1"]);
    let config = SyncConfig::new(
        "zecrimp.top",
        TARGET,
        ProviderConfig::huawei_cloud(Credential::new("test-ak", "  "), EndpointConfig::default()),
    );
    let job = job_with(config, &resolver, &factory);

    let err = assert_err!(job.run_once().await);

    assert!(matches!(err, Error::Config(_)), "got {:?}", err);
    assert_eq!(resolver.calls(), 0);
    assert_eq!(factory.create_calls(), 0);
    assert_eq!(api.total_calls(), 0);
}

#[tokio::test]
async fn resolver_failure_is_a_resolution_error() {
    let api = MockDnsApi::new().with_zone("zone-1", "hw.072103.xyz.");
    let factory = MockFactory::new(&api);
    let resolver = StaticResolver::failing("upstream returned 503");
    let job = job_with(minimal_config(TARGET), &resolver, &factory);

    let err = assert_err!(job.run_once().await);

    assert!(matches!(err, Error::Resolution(_)), "got {:?}", err);
    assert_eq!(err.category(), "resolution");
    assert!(err.to_string().contains("upstream returned 503"));
    assert_eq!(api.total_calls(), 0);
}

#[tokio::test]
async fn deadline_abandons_a_slow_run_without_writing() {
    let api = MockDnsApi::new()
        .with_zone("zone-1", "hw.072103.xyz.")
        .with_delay(Duration::from_millis(200));
    let factory = MockFactory::new(&api);
    let resolver = StaticResolver::new(&["1.1.1.1"]);
    let job = job_with(minimal_config(TARGET), &resolver, &factory);

    let err = assert_err!(job.run_with_deadline(Duration::from_millis(50)).await);

    assert!(matches!(err, Error::Timeout(_)), "got {:?}", err);
    assert_eq!(api.write_count(), 0);
}

#[tokio::test]
async fn repeated_runs_share_no_state() {
    let api = MockDnsApi::new()
        .with_zone("zone-1", "hw.072103.xyz.")
        .with_record("zone-1", "rs-1", "cf.hw.072103.xyz.", 300, &["1.1.1.1"]);
    let factory = MockFactory::new(&api);
    let resolver = StaticResolver::new(&["2.2.2.2"]);
    let job = job_with(minimal_config(TARGET), &resolver, &factory);

    assert!(assert_ok!(job.run_once().await).is_write());
    assert!(!assert_ok!(job.run_once().await).is_write());

    // Zone and record are looked up again on every run
    assert_eq!(api.list_zone_calls(), 2);
    assert_eq!(api.list_record_calls(), 2);
    assert_eq!(factory.create_calls(), 2);
}
