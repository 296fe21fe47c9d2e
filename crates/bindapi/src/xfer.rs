// Copyright 2026 The bind-rest-api Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Zone transfers and the snapshot they produce

use std::collections::BTreeMap;
use std::sync::Arc;

use hickory_proto::rr::{self, Name, RData};
use serde::Serialize;
use tracing::debug;

use crate::error::{ErrorKind, Result};
use crate::transport::DnsTransport;

/// Structured copy of a whole zone
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ZoneSnapshot {
    /// Authority record of the zone
    #[serde(rename = "SOA", skip_serializing_if = "Option::is_none")]
    pub soa: Option<SoaSnapshot>,
    /// Every other record, keyed by owner name relative to the zone (`@` for the apex)
    pub records: BTreeMap<String, Vec<RecordSnapshot>>,
}

/// Fields of the zone's SOA record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[allow(missing_docs)]
pub struct SoaSnapshot {
    pub ttl: u32,
    pub expire: i32,
    pub minimum: u32,
    pub refresh: i32,
    pub retry: i32,
    pub rname: String,
    pub mname: String,
    pub serial: u32,
}

/// One record of a [`ZoneSnapshot`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordSnapshot {
    /// Record data in presentation form
    pub response: String,
    /// Type code, e.g. `MX`
    pub rrtype: String,
    /// Time to live, in seconds
    pub ttl: u32,
}

impl ZoneSnapshot {
    /// Builds a snapshot of `zone` from the records of an AXFR stream
    ///
    /// A stream opening with an SOA must close with an SOA of the same serial, the closing one is
    /// dropped. Any other SOA, or an empty stream, is a protocol error. Records keep their stream
    /// order, duplicates included.
    pub fn from_records(zone: &Name, records: Vec<rr::Record>) -> Result<Self> {
        let mut records = records.into_iter();
        let first = records
            .next()
            .ok_or_else(|| ErrorKind::Protocol(format!("empty transfer of {zone}")))?;

        let mut snapshot = Self::default();
        let mut pending = Some(first);

        if let Some(soa) = pending.as_ref().and_then(|r| SoaSnapshot::from_record(r)) {
            let closing = records.next_back().and_then(|r| SoaSnapshot::from_record(&r));
            match closing {
                Some(closing) if closing.serial == soa.serial => {}
                Some(closing) => {
                    return Err(ErrorKind::Protocol(format!(
                        "transfer of {zone} closed with serial {} instead of {}",
                        closing.serial, soa.serial
                    ))
                    .into())
                }
                None => {
                    return Err(ErrorKind::Protocol(format!(
                        "transfer of {zone} was not terminated by its SOA"
                    ))
                    .into())
                }
            }

            snapshot.soa = Some(soa);
            pending = None;
        }

        for record in pending.into_iter().chain(records) {
            if record.record_type() == rr::RecordType::SOA {
                return Err(ErrorKind::Protocol(format!(
                    "unexpected SOA for {} in transfer of {zone}",
                    record.name()
                ))
                .into());
            }

            snapshot
                .records
                .entry(relative_owner(record.name(), zone))
                .or_default()
                .push(RecordSnapshot {
                    response: record.data().to_string(),
                    rrtype: record.record_type().to_string(),
                    ttl: record.ttl(),
                });
        }

        Ok(snapshot)
    }

    /// Number of non SOA records
    pub fn len(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }

    /// True if the zone holds nothing besides its SOA
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SoaSnapshot {
    fn from_record(record: &rr::Record) -> Option<Self> {
        let RData::SOA(soa) = record.data() else {
            return None;
        };

        Some(Self {
            ttl: record.ttl(),
            expire: soa.expire(),
            minimum: soa.minimum(),
            refresh: soa.refresh(),
            retry: soa.retry(),
            rname: soa.rname().to_string(),
            mname: soa.mname().to_string(),
            serial: soa.serial(),
        })
    }
}

fn relative_owner(name: &Name, zone: &Name) -> String {
    if name == zone {
        return "@".to_string();
    }

    if zone.zone_of(name) {
        let depth = name.iter().count() - zone.iter().count();
        if let Ok(mut relative) = Name::from_labels(name.iter().take(depth)) {
            relative.set_fqdn(false);
            return relative.to_string();
        }
    }

    name.to_string()
}

/// Reads whole zones from the authoritative server
#[derive(Clone)]
pub struct ZoneTransferClient {
    transport: Arc<dyn DnsTransport>,
}

impl ZoneTransferClient {
    /// Creates a client transferring through `transport`
    pub fn new(transport: Arc<dyn DnsTransport>) -> Self {
        Self { transport }
    }

    /// Transfers `zone`, nothing is cached between calls
    pub async fn transfer(&self, zone: &Name) -> Result<ZoneSnapshot> {
        let records = self.transport.zone_transfer(zone).await?;
        let snapshot = ZoneSnapshot::from_records(zone, records)?;
        debug!("snapshot of {zone} holds {} records", snapshot.len());
        Ok(snapshot)
    }
}
