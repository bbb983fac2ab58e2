//! Test doubles for daemon tests

use crate::runner::Runner;
use async_trait::async_trait;
use fastip_core::config::{Credential, EndpointConfig, ProviderConfig, SyncConfig};
use fastip_core::traits::{
    AddressResolver, DnsApi, DnsApiFactory, RecordSet, RecordSetSpec, Zone, normalize_name,
};
use fastip_core::{Error, Result, SyncJob};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Resolver with a canned answer
#[derive(Clone)]
pub struct StubResolver {
    answer: Option<Vec<Ipv4Addr>>,
    calls: Arc<AtomicUsize>,
    delay: Option<Duration>,
}

impl StubResolver {
    pub fn answering(addresses: &[&str]) -> Self {
        Self {
            answer: Some(addresses.iter().map(|a| a.parse().unwrap()).collect()),
            calls: Arc::new(AtomicUsize::new(0)),
            delay: None,
        }
    }

    pub fn failing() -> Self {
        Self {
            answer: None,
            calls: Arc::new(AtomicUsize::new(0)),
            delay: None,
        }
    }

    /// Answer only after `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AddressResolver for StubResolver {
    async fn resolve_addresses(&self, _domain: &str) -> Result<Vec<Ipv4Addr>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.answer
            .clone()
            .ok_or_else(|| Error::resolution("stub resolver unavailable"))
    }

    fn resolver_name(&self) -> &'static str {
        "stub"
    }
}

/// In-memory provider holding the `hw.072103.xyz.` zone
#[derive(Clone, Default)]
pub struct MemoryApi {
    records: Arc<Mutex<Vec<RecordSet>>>,
    calls: Arc<AtomicUsize>,
    reject_writes: bool,
}

impl MemoryApi {
    pub fn with_zone() -> Self {
        Self::default()
    }

    /// Fail every create and update with a 403
    pub fn rejecting_writes(mut self) -> Self {
        self.reject_writes = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check_write(&self) -> Result<()> {
        if self.reject_writes {
            return Err(Error::Authentication {
                status: 403,
                body: "write denied".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DnsApi for MemoryApi {
    async fn list_zones(&self, _name: &str) -> Result<Vec<Zone>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![Zone {
            id: "zone-1".to_string(),
            name: "hw.072103.xyz.".to_string(),
        }])
    }

    async fn list_record_sets(
        &self,
        _zone_id: &str,
        name: &str,
        _record_type: &str,
    ) -> Result<Vec<RecordSet>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let name = normalize_name(name);
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| normalize_name(&r.name) == name)
            .cloned()
            .collect())
    }

    async fn create_record_set(&self, _zone_id: &str, spec: &RecordSetSpec) -> Result<RecordSet> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.check_write()?;
        let record = RecordSet {
            id: "rs-1".to_string(),
            name: format!("{}.", spec.name),
            record_type: spec.record_type.clone(),
            ttl: spec.ttl,
            records: spec.records.clone(),
        };
        self.records.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn update_record_set(
        &self,
        _zone_id: &str,
        record_id: &str,
        spec: &RecordSetSpec,
    ) -> Result<RecordSet> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.check_write()?;
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.id == record_id)
            .ok_or_else(|| Error::not_found(404, record_id.to_string()))?;
        record.records = spec.records.clone();
        Ok(record.clone())
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}

struct MemoryFactory(MemoryApi);

impl DnsApiFactory for MemoryFactory {
    fn create(&self, _config: &ProviderConfig) -> Result<Box<dyn DnsApi>> {
        Ok(Box::new(self.0.clone()))
    }
}

/// A runner over the given doubles, targeting `cf.hw.072103.xyz`
pub fn runner_with(resolver: StubResolver, api: MemoryApi) -> Arc<Runner> {
    let config = SyncConfig::new(
        "zecrimp.top",
        "cf.hw.072103.xyz",
        ProviderConfig::huawei_cloud(
            Credential::new("test-ak", "test-sk"),
            EndpointConfig::default(),
        ),
    );
    let job = SyncJob::new(config, Box::new(resolver), Box::new(MemoryFactory(api)));
    Arc::new(Runner::new(job, Duration::from_secs(5)))
}
