//! Test doubles and common utilities for reconciliation contract tests
//!
//! [`FakeBackend`] is an in-memory zone store that counts every call,
//! rejects duplicate creates the way a strict backend would, and can be told
//! to fail specific calls.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use zonesync_core::error::{Error, Result};
use zonesync_core::{Endpoint, RecordType, Zone, ZoneBackend, ZoneRecord};

#[derive(Default)]
struct FakeState {
    zones: Vec<Zone>,
    /// zone name -> records
    records: BTreeMap<String, Vec<ZoneRecord>>,
    /// domains whose mutations fail
    failing_domains: HashSet<String>,
    /// zones whose reads fail
    failing_zones: HashSet<String>,
    fail_zone_listing: bool,
    /// cancel this token when the given domain is mutated
    cancel_after: Option<(String, CancellationToken)>,
    /// every mutation call in order, as "action domain"
    calls: Vec<String>,
}

/// In-memory backend with call counters
#[derive(Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<FakeState>>,
    list_calls: Arc<AtomicUsize>,
    read_calls: Arc<AtomicUsize>,
    create_calls: Arc<AtomicUsize>,
    update_calls: Arc<AtomicUsize>,
    delete_calls: Arc<AtomicUsize>,
    /// Successful mutations only
    mutations: Arc<AtomicUsize>,
}

impl FakeBackend {
    pub fn with_zones(zones: Vec<Zone>) -> Self {
        let backend = Self::default();
        {
            let mut state = backend.state.lock().unwrap();
            for zone in &zones {
                state.records.entry(zone.name.clone()).or_default();
            }
            state.zones = zones;
        }
        backend
    }

    /// Seed a record directly, bypassing counters
    pub fn seed(&self, zone: &str, domain: &str, record_type: &str, ttl: Option<u32>, answers: &[&str]) {
        let mut state = self.state.lock().unwrap();
        state.records.entry(zone.to_string()).or_default().push(ZoneRecord {
            zone: zone.to_string(),
            domain: domain.to_string(),
            record_type: record_type.to_string(),
            ttl,
            answers: answers.iter().map(|a| a.to_string()).collect(),
        });
    }

    pub fn fail_mutations_for(&self, domain: &str) {
        self.state.lock().unwrap().failing_domains.insert(domain.to_string());
    }

    pub fn fail_reads_for(&self, zone: &str) {
        self.state.lock().unwrap().failing_zones.insert(zone.to_string());
    }

    pub fn fail_zone_listing(&self) {
        self.state.lock().unwrap().fail_zone_listing = true;
    }

    pub fn cancel_after(&self, domain: &str, token: CancellationToken) {
        self.state.lock().unwrap().cancel_after = Some((domain.to_string(), token));
    }

    pub fn records_in(&self, zone: &str) -> Vec<ZoneRecord> {
        self.state
            .lock()
            .unwrap()
            .records
            .get(zone)
            .cloned()
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn read_calls(&self) -> usize {
        self.read_calls.load(Ordering::SeqCst)
    }

    /// Number of create/update/delete calls attempted
    pub fn mutation_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
            + self.update_calls.load(Ordering::SeqCst)
            + self.delete_calls.load(Ordering::SeqCst)
    }

    /// Number of mutations that changed backend state
    pub fn mutations(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    fn record_call(&self, state: &mut FakeState, action: &str, domain: &str) -> Result<()> {
        state.calls.push(format!("{} {}", action, domain));
        if let Some((trigger, token)) = &state.cancel_after
            && trigger == domain
        {
            token.cancel();
        }
        if state.failing_domains.contains(domain) {
            return Err(Error::provider("fake", format!("injected failure for {}", domain)));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ZoneBackend for FakeBackend {
    async fn list_zones(&self) -> Result<Vec<Zone>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        if state.fail_zone_listing {
            return Err(Error::http("connection reset"));
        }
        Ok(state.zones.clone())
    }

    async fn zone_records(&self, zone: &Zone) -> Result<Vec<ZoneRecord>> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        if state.failing_zones.contains(&zone.name) {
            return Err(Error::http(format!("zone {} read failed", zone.name)));
        }
        Ok(state.records.get(&zone.name).cloned().unwrap_or_default())
    }

    async fn create_record(&self, record: &ZoneRecord) -> Result<()> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        self.record_call(&mut state, "create", &record.domain)?;

        let records = state.records.entry(record.zone.clone()).or_default();
        if records
            .iter()
            .any(|r| r.domain == record.domain && r.record_type == record.record_type)
        {
            return Err(Error::already_exists(format!(
                "{} {}",
                record.domain, record.record_type
            )));
        }
        records.push(record.clone());
        self.mutations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn update_record(&self, record: &ZoneRecord) -> Result<()> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        self.record_call(&mut state, "update", &record.domain)?;

        let records = state.records.entry(record.zone.clone()).or_default();
        let existing = records
            .iter_mut()
            .find(|r| r.domain == record.domain && r.record_type == record.record_type)
            .ok_or_else(|| Error::not_found(record.domain.clone()))?;
        *existing = record.clone();
        self.mutations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete_record(&self, zone: &Zone, domain: &str, record_type: &str) -> Result<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        self.record_call(&mut state, "delete", domain)?;

        let records = state.records.entry(zone.name.clone()).or_default();
        let before = records.len();
        records.retain(|r| !(r.domain == domain && r.record_type == record_type));
        if records.len() == before {
            return Err(Error::not_found(domain.to_string()));
        }
        self.mutations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "fake"
    }
}

pub fn a_record(name: &str, target: &str) -> Endpoint {
    Endpoint::new(name, RecordType::A, [target]).expect("valid endpoint")
}

/// The three zones used across contract tests
pub fn standard_zones() -> Vec<Zone> {
    vec![
        Zone::new("z-b", "b.example.com").with_type("public"),
        Zone::new("z-a", "a.example.com").with_type("public"),
        Zone::new("z-c", "c.other.org").with_type("private"),
    ]
}
