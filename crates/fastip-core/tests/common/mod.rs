//! Test doubles and common utilities for contract tests
//!
//! The in-memory DNS API behaves like a tiny provider: it holds zones and
//! record sets, applies creates and updates, and counts every call.

#![allow(dead_code)]

use fastip_core::config::{Credential, EndpointConfig, ProviderConfig, SyncConfig};
use fastip_core::error::{Error, Result};
use fastip_core::traits::{
    AddressResolver, DnsApi, DnsApiFactory, RecordSet, RecordSetSpec, Zone, normalize_name,
};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Shared provider state
#[derive(Default)]
struct ProviderState {
    zones: Vec<Zone>,
    records: Vec<(String, RecordSet)>,
    writes: Vec<WriteCall>,
    next_id: usize,
    fail_writes: Option<(u16, String)>,
    fail_zone_lookups: Option<(u16, String)>,
}

/// A recorded create or update call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteCall {
    Create {
        zone_id: String,
        spec: RecordSetSpec,
    },
    Update {
        zone_id: String,
        record_id: String,
        spec: RecordSetSpec,
    },
}

impl WriteCall {
    pub fn spec(&self) -> &RecordSetSpec {
        match self {
            WriteCall::Create { spec, .. } | WriteCall::Update { spec, .. } => spec,
        }
    }
}

/// An in-memory DnsApi that tracks calls
#[derive(Clone, Default)]
pub struct MockDnsApi {
    state: Arc<Mutex<ProviderState>>,
    list_zone_calls: Arc<AtomicUsize>,
    list_record_calls: Arc<AtomicUsize>,
    /// Artificial latency applied to every call
    delay: Option<Duration>,
}

impl MockDnsApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a zone
    pub fn with_zone(self, id: &str, name: &str) -> Self {
        self.state.lock().unwrap().zones.push(Zone {
            id: id.to_string(),
            name: name.to_string(),
        });
        self
    }

    /// Add an A record set
    pub fn with_record(self, zone_id: &str, id: &str, name: &str, ttl: u32, values: &[&str]) -> Self {
        self.state.lock().unwrap().records.push((
            zone_id.to_string(),
            RecordSet {
                id: id.to_string(),
                name: name.to_string(),
                record_type: "A".to_string(),
                ttl: Some(ttl),
                records: values.iter().map(|v| v.to_string()).collect(),
            },
        ));
        self
    }

    /// Make every create/update fail with the given status and body
    pub fn failing_writes(self, status: u16, body: &str) -> Self {
        self.state.lock().unwrap().fail_writes = Some((status, body.to_string()));
        self
    }

    /// Make every zone lookup fail with the given status and body
    pub fn failing_zone_lookups(self, status: u16, body: &str) -> Self {
        self.state.lock().unwrap().fail_zone_lookups = Some((status, body.to_string()));
        self
    }

    /// Delay every call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn list_zone_calls(&self) -> usize {
        self.list_zone_calls.load(Ordering::SeqCst)
    }

    pub fn list_record_calls(&self) -> usize {
        self.list_record_calls.load(Ordering::SeqCst)
    }

    /// Total calls of any kind
    pub fn total_calls(&self) -> usize {
        self.list_zone_calls() + self.list_record_calls() + self.write_count()
    }

    /// Attempted creates and updates, including failed ones
    pub fn write_count(&self) -> usize {
        self.state.lock().unwrap().writes.len()
    }

    pub fn writes(&self) -> Vec<WriteCall> {
        self.state.lock().unwrap().writes.clone()
    }

    /// Current values of a record set, by id
    pub fn record_values(&self, record_id: &str) -> Option<Vec<String>> {
        self.state
            .lock()
            .unwrap()
            .records
            .iter()
            .find(|(_, r)| r.id == record_id)
            .map(|(_, r)| r.records.clone())
    }

    /// All A record sets currently held for `name`
    pub fn records_named(&self, name: &str) -> Vec<RecordSet> {
        let name = normalize_name(name);
        self.state
            .lock()
            .unwrap()
            .records
            .iter()
            .filter(|(_, r)| normalize_name(&r.name) == name)
            .map(|(_, r)| r.clone())
            .collect()
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn check_write(&self) -> Result<()> {
        match &self.state.lock().unwrap().fail_writes {
            Some((status, body)) => Err(Error::api("mock", *status, body.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl DnsApi for MockDnsApi {
    async fn list_zones(&self, name: &str) -> Result<Vec<Zone>> {
        self.list_zone_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;

        if let Some((status, body)) = &self.state.lock().unwrap().fail_zone_lookups {
            return Err(Error::Authentication {
                status: *status,
                body: body.clone(),
            });
        }

        // Fuzzy like the real provider: substring match on the name
        let name = normalize_name(name);
        Ok(self
            .state
            .lock()
            .unwrap()
            .zones
            .iter()
            .filter(|z| normalize_name(&z.name).contains(&name))
            .cloned()
            .collect())
    }

    async fn list_record_sets(
        &self,
        zone_id: &str,
        name: &str,
        record_type: &str,
    ) -> Result<Vec<RecordSet>> {
        self.list_record_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;

        let name = normalize_name(name);
        Ok(self
            .state
            .lock()
            .unwrap()
            .records
            .iter()
            .filter(|(z, r)| {
                z == zone_id && normalize_name(&r.name) == name && r.record_type == record_type
            })
            .map(|(_, r)| r.clone())
            .collect())
    }

    async fn create_record_set(&self, zone_id: &str, spec: &RecordSetSpec) -> Result<RecordSet> {
        self.pause().await;
        self.state.lock().unwrap().writes.push(WriteCall::Create {
            zone_id: zone_id.to_string(),
            spec: spec.clone(),
        });
        self.check_write()?;

        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let record = RecordSet {
            id: format!("created-{}", state.next_id),
            name: format!("{}.", spec.name),
            record_type: spec.record_type.clone(),
            ttl: spec.ttl,
            records: spec.records.clone(),
        };
        state.records.push((zone_id.to_string(), record.clone()));
        Ok(record)
    }

    async fn update_record_set(
        &self,
        zone_id: &str,
        record_id: &str,
        spec: &RecordSetSpec,
    ) -> Result<RecordSet> {
        self.pause().await;
        self.state.lock().unwrap().writes.push(WriteCall::Update {
            zone_id: zone_id.to_string(),
            record_id: record_id.to_string(),
            spec: spec.clone(),
        });
        self.check_write()?;

        let mut state = self.state.lock().unwrap();

        let (_, record) = state
            .records
            .iter_mut()
            .find(|(z, r)| z == zone_id && r.id == record_id)
            .ok_or_else(|| Error::not_found(404, record_id.to_string()))?;
        record.records = spec.records.clone();
        if spec.ttl.is_some() {
            record.ttl = spec.ttl;
        }
        Ok(record.clone())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Factory handing out clients that share one MockDnsApi state
pub struct MockFactory {
    api: MockDnsApi,
    create_calls: Arc<AtomicUsize>,
}

impl MockFactory {
    pub fn new(api: &MockDnsApi) -> Self {
        Self {
            api: api.clone(),
            create_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            api: other.api.clone(),
            create_calls: Arc::clone(&other.create_calls),
        }
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }
}

impl DnsApiFactory for MockFactory {
    fn create(&self, _config: &ProviderConfig) -> Result<Box<dyn DnsApi>> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(self.api.clone()))
    }
}

/// A resolver returning a fixed answer
#[derive(Clone)]
pub struct StaticResolver {
    answer: std::result::Result<Vec<Ipv4Addr>, String>,
    calls: Arc<AtomicUsize>,
}

impl StaticResolver {
    pub fn new(addresses: &[&str]) -> Self {
        Self {
            answer: Ok(addresses.iter().map(|a| a.parse().unwrap()).collect()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            answer: Err(message.to_string()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl AddressResolver for StaticResolver {
    async fn resolve_addresses(&self, _domain: &str) -> Result<Vec<Ipv4Addr>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer.clone().map_err(Error::http)
    }

    fn resolver_name(&self) -> &'static str {
        "static"
    }
}

/// Helper to create a minimal SyncConfig for testing
pub fn minimal_config(target: &str) -> SyncConfig {
    SyncConfig::new(
        "zecrimp.top",
        target,
        ProviderConfig::huawei_cloud(Credential::new("test-ak", "test-sk"), EndpointConfig::default()),
    )
}

/// Parse a list of addresses
pub fn ips(addresses: &[&str]) -> Vec<Ipv4Addr> {
    addresses.iter().map(|a| a.parse().unwrap()).collect()
}
