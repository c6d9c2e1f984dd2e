//! Test doubles and common utilities for reconciliation contract tests
//!
//! The doubles keep their state behind `Arc`s, so a test keeps one clone for
//! assertions and hands another to the engine.

#![allow(dead_code)]

use async_trait::async_trait;
use ddns_core::error::{Error, Result};
use ddns_core::{
    Cache, CacheStore, DdnsConfig, DnsProvider, IpFamily, IpSource, RecordType, Zone,
};
use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// An IpSource answering from a fixed table; missing families are unavailable
#[derive(Clone, Default)]
pub struct StaticIpSource {
    addresses: Arc<Mutex<HashMap<IpFamily, IpAddr>>>,
    call_count: Arc<AtomicUsize>,
}

impl StaticIpSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, family: IpFamily, ip: &str) -> Self {
        self.set(family, ip);
        self
    }

    pub fn set(&self, family: IpFamily, ip: &str) {
        self.addresses
            .lock()
            .unwrap()
            .insert(family, ip.parse().unwrap());
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IpSource for StaticIpSource {
    async fn current(&self, family: IpFamily) -> Result<IpAddr> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.addresses
            .lock()
            .unwrap()
            .get(&family)
            .copied()
            .ok_or_else(|| Error::ip_unavailable(format!("no {} address in test table", family)))
    }
}

/// A provider call, as observed by [`MockDnsProvider`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListZones,
    ResolveRecord {
        domain: String,
        record_type: RecordType,
    },
    Create {
        domain: String,
        ip: IpAddr,
        proxied: bool,
    },
    Update {
        domain: String,
        ip: IpAddr,
        zone_id: Option<String>,
        record_id: Option<String>,
        proxied: bool,
    },
    Delete {
        domain: String,
        record_type: RecordType,
    },
}

#[derive(Default)]
struct ProviderState {
    zones: Vec<Zone>,
    records: HashMap<(String, RecordType), String>,
    failing_domains: HashSet<String>,
    stale_record_ids: HashSet<String>,
    token_valid: bool,
    calls: Vec<Call>,
}

/// A mock DnsProvider that records every call
///
/// Write calls for domains marked failing return a provider error; updates
/// that name a stale record id fail as if the record was removed remotely.
#[derive(Clone)]
pub struct MockDnsProvider {
    state: Arc<Mutex<ProviderState>>,
}

impl MockDnsProvider {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ProviderState {
                token_valid: true,
                ..ProviderState::default()
            })),
        }
    }

    pub fn with_zone(self, id: &str, name: &str) -> Self {
        self.state.lock().unwrap().zones.push(Zone {
            id: id.to_string(),
            name: name.to_string(),
        });
        self
    }

    pub fn with_record(self, domain: &str, record_type: RecordType, id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .records
            .insert((domain.to_string(), record_type), id.to_string());
        self
    }

    pub fn failing_for(self, domain: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_domains
            .insert(domain.to_string());
        self
    }

    pub fn with_stale_record_id(self, record_id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .stale_record_ids
            .insert(record_id.to_string());
        self
    }

    pub fn with_invalid_token(self) -> Self {
        self.state.lock().unwrap().token_valid = false;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Calls that change records (create/update/delete)
    pub fn write_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| {
                matches!(
                    call,
                    Call::Create { .. } | Call::Update { .. } | Call::Delete { .. }
                )
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn is_failing(&self, domain: &str) -> bool {
        self.state.lock().unwrap().failing_domains.contains(domain)
    }
}

#[async_trait]
impl DnsProvider for MockDnsProvider {
    async fn verify_token(&self) -> Result<()> {
        if self.state.lock().unwrap().token_valid {
            Ok(())
        } else {
            Err(Error::token_invalid("Invalid API token"))
        }
    }

    async fn list_zones(&self) -> Result<Vec<Zone>> {
        self.record(Call::ListZones);
        Ok(self.state.lock().unwrap().zones.clone())
    }

    async fn resolve_record(&self, domain: &str, record_type: RecordType) -> Result<String> {
        self.record(Call::ResolveRecord {
            domain: domain.to_string(),
            record_type,
        });
        self.state
            .lock()
            .unwrap()
            .records
            .get(&(domain.to_string(), record_type))
            .cloned()
            .ok_or_else(|| Error::record_not_found(domain, record_type))
    }

    async fn create_record(&self, domain: &str, ip: IpAddr, proxied: bool) -> Result<String> {
        self.record(Call::Create {
            domain: domain.to_string(),
            ip,
            proxied,
        });
        if self.is_failing(domain) {
            return Err(Error::provider("mock", "create rejected"));
        }

        let id = format!("created-{}", domain);
        self.state
            .lock()
            .unwrap()
            .records
            .insert((domain.to_string(), RecordType::for_ip(ip)), id.clone());
        Ok(id)
    }

    async fn update_record(
        &self,
        domain: &str,
        ip: IpAddr,
        zone_id: Option<&str>,
        record_id: Option<&str>,
        proxied: bool,
    ) -> Result<()> {
        self.record(Call::Update {
            domain: domain.to_string(),
            ip,
            zone_id: zone_id.map(str::to_string),
            record_id: record_id.map(str::to_string),
            proxied,
        });
        if self.is_failing(domain) {
            return Err(Error::provider("mock", "update rejected"));
        }
        let stale = record_id
            .is_some_and(|id| self.state.lock().unwrap().stale_record_ids.contains(id));
        if stale {
            return Err(Error::provider("mock", "record does not exist"));
        }
        Ok(())
    }

    async fn delete_record(&self, domain: &str, record_type: RecordType) -> Result<()> {
        self.record(Call::Delete {
            domain: domain.to_string(),
            record_type,
        });
        self.state
            .lock()
            .unwrap()
            .records
            .remove(&(domain.to_string(), record_type));
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// A CacheStore that loads an empty cache and refuses every save
#[derive(Clone, Default)]
pub struct UnwritableCacheStore {
    save_attempts: Arc<AtomicUsize>,
}

impl UnwritableCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save_attempts(&self) -> usize {
        self.save_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheStore for UnwritableCacheStore {
    async fn load(&self) -> Result<Cache> {
        Ok(Cache::new())
    }

    async fn save(&self, _cache: &Cache) -> Result<()> {
        self.save_attempts.fetch_add(1, Ordering::SeqCst);
        Err(Error::cache("Failed to write cache file: read-only file system"))
    }

    async fn delete(&self) -> Result<()> {
        Ok(())
    }

    fn location(&self) -> String {
        "read-only".to_string()
    }
}

/// Helper to create a minimal config for the given domains (IPv4 only)
pub fn config_for(domains: &[&str]) -> DdnsConfig {
    let mut config = DdnsConfig::new(domains.iter().map(|d| d.to_string()).collect());
    config.cache_path = std::path::PathBuf::from("unused-in-memory");
    config
}

pub fn ip(addr: &str) -> IpAddr {
    addr.parse().unwrap()
}
