// Copyright 2026 The bind-rest-api Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex, Once,
    },
};

use async_trait::async_trait;
use bindapi::{
    audit::{AuditEntry, AuditSink, AuditTrail, Outcome},
    error::Result,
    update::UpdateTransaction,
    DnsTransport, KeyStore,
};
use hickory_proto::{
    op::ResponseCode,
    rr::{rdata::SOA, DNSClass, Name, RData, Record, RecordType},
    ProtoError,
};
use tracing::debug;

/// Registers a global default tracing subscriber when called for the first time. This is intended
/// for use in tests.
pub fn subscribe() {
    static INSTALL_TRACING_SUBSCRIBER: Once = Once::new();
    INSTALL_TRACING_SUBSCRIBER.call_once(|| {
        let subscriber = tracing_subscriber::FmtSubscriber::builder()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .finish();
        tracing::subscriber::set_global_default(subscriber).unwrap();
    });
}

/// Key table with `alice,alice-secret` and `bob,bob-secret`
pub fn test_keys() -> KeyStore {
    [("alice", "alice-secret"), ("bob", "bob-secret")]
        .into_iter()
        .collect()
}

/// Audit sink keeping every entry in memory
#[derive(Default)]
pub struct MemoryAuditSink {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAuditSink {
    /// A sink and a trail writing to it
    pub fn trail() -> (Arc<Self>, AuditTrail) {
        let sink = Arc::new(Self::default());
        let trail = AuditTrail::new(sink.clone());
        (sink, trail)
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub fn outcomes(&self) -> Vec<Outcome> {
        self.entries().iter().map(|entry| entry.outcome).collect()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, entry: &AuditEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

struct Zone {
    origin: Name,
    serial: u32,
    records: Vec<Record>,
}

impl Zone {
    fn soa(&self) -> Record {
        Record::from_rdata(
            self.origin.clone(),
            3600,
            RData::SOA(SOA::new(
                Name::from_ascii("ns1").unwrap().append_domain(&self.origin).unwrap(),
                Name::from_ascii("hostmaster").unwrap().append_domain(&self.origin).unwrap(),
                self.serial,
                7200,
                900,
                1209600,
                300,
            )),
        )
    }

    /// Applies an RFC 2136 update section, all or nothing
    fn apply(&mut self, update: &[Record]) -> ResponseCode {
        let mut records = self.records.clone();

        for record in update {
            if !self.origin.zone_of(record.name()) {
                return ResponseCode::NotZone;
            }

            match record.dns_class() {
                DNSClass::IN => {
                    records.retain(|r| !same_rr(r, record));
                    records.push(record.clone());
                }
                DNSClass::ANY => {
                    let RData::Update0(rtype) = record.data() else {
                        return ResponseCode::FormErr;
                    };
                    records.retain(|r| {
                        r.name() != record.name()
                            || (*rtype != RecordType::ANY && r.record_type() != *rtype)
                    });
                }
                DNSClass::NONE => records.retain(|r| !same_rr(r, record)),
                _ => return ResponseCode::FormErr,
            }
        }

        self.records = records;
        self.serial += 1;
        ResponseCode::NoError
    }
}

fn same_rr(a: &Record, b: &Record) -> bool {
    a.name() == b.name() && a.record_type() == b.record_type() && a.data() == b.data()
}

/// An authoritative server living in memory
///
/// Updates are applied from the update section of the rendered message, so they exercise the
/// same encoding of operations the real server receives. Every call is counted.
#[derive(Default)]
pub struct InMemoryServer {
    zones: Mutex<Vec<Zone>>,
    update_response: Mutex<Option<ResponseCode>>,
    unreachable: AtomicBool,
    updates: AtomicUsize,
    transfers: AtomicUsize,
    lookups: AtomicUsize,
}

impl InMemoryServer {
    /// A server authoritative for `zones`, each holding only its SOA
    pub fn new(zones: &[&str]) -> Arc<Self> {
        let server = Self::default();
        server.zones.lock().unwrap().extend(zones.iter().map(|zone| Zone {
            origin: Name::from_ascii(zone).unwrap(),
            serial: 1,
            records: Vec::new(),
        }));
        Arc::new(server)
    }

    /// Adds `record` to the zone it belongs to, bypassing the update path
    pub fn insert(&self, record: Record) {
        let mut zones = self.zones.lock().unwrap();
        let zone = zones
            .iter_mut()
            .find(|zone| zone.origin.zone_of(record.name()))
            .expect("record outside of every zone");
        zone.records.push(record);
    }

    /// Answers every following update with `code` without applying it
    pub fn respond_to_updates_with(&self, code: ResponseCode) {
        *self.update_response.lock().unwrap() = Some(code);
    }

    /// Makes every following call fail at the transport level
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Number of updates, transfers and lookups received
    pub fn calls(&self) -> usize {
        self.updates() + self.transfers.load(Ordering::SeqCst) + self.lookups.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    /// Records of `rtype` at `name`, as currently stored
    pub fn records(&self, name: &str, rtype: RecordType) -> Vec<Record> {
        let name = Name::from_ascii(name).unwrap();
        self.zones
            .lock()
            .unwrap()
            .iter()
            .flat_map(|zone| zone.records.iter())
            .filter(|r| r.name() == &name && r.record_type() == rtype)
            .cloned()
            .collect()
    }

    fn check_reachable(&self) -> Result<()> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(ProtoError::from("connection refused").into());
        }
        Ok(())
    }
}

#[async_trait]
impl DnsTransport for InMemoryServer {
    async fn update(&self, transaction: &UpdateTransaction) -> Result<ResponseCode> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.check_reachable()?;

        if let Some(code) = *self.update_response.lock().unwrap() {
            return Ok(code);
        }

        let message = transaction.to_message();
        let Some(zone_name) = message.queries().first().map(|q| q.name().clone()) else {
            return Ok(ResponseCode::FormErr);
        };

        let mut zones = self.zones.lock().unwrap();
        let Some(zone) = zones.iter_mut().find(|zone| zone.origin == zone_name) else {
            return Ok(ResponseCode::NotAuth);
        };

        let code = zone.apply(message.name_servers());
        debug!("in-memory update of {zone_name}: {code}");
        Ok(code)
    }

    async fn zone_transfer(&self, zone: &Name) -> Result<Vec<Record>> {
        self.transfers.fetch_add(1, Ordering::SeqCst);
        self.check_reachable()?;

        let zones = self.zones.lock().unwrap();
        let Some(zone) = zones.iter().find(|z| &z.origin == zone) else {
            return Err(bindapi::ErrorKind::from(ResponseCode::NotAuth).into());
        };

        let soa = zone.soa();
        let mut records = vec![soa.clone()];
        records.extend(zone.records.iter().cloned());
        records.push(soa);
        Ok(records)
    }

    async fn lookup(&self, name: &Name, record_type: RecordType) -> Result<Vec<Record>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.check_reachable()?;

        let zones = self.zones.lock().unwrap();
        let mut found = Vec::new();
        for zone in zones.iter() {
            if record_type == RecordType::SOA && &zone.origin == name {
                found.push(zone.soa());
            }
            found.extend(
                zone.records
                    .iter()
                    .filter(|r| r.name() == name && r.record_type() == record_type)
                    .cloned(),
            );
        }
        Ok(found)
    }
}
