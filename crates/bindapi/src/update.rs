// Copyright 2026 The bind-rest-api Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Dynamic update transactions, see [RFC 2136](https://tools.ietf.org/html/rfc2136)

use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::{self, DNSClass, Name, RData};

use crate::error::{ErrorKind, Result};
use crate::record::RecordType;

/// One change held by an [`UpdateTransaction`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    /// Add the record to its RRset
    Add(rr::Record),
    /// Replace the whole RRset of the record's name and type with the record
    Replace(rr::Record),
    /// Delete every record of `record_type` at `name`
    DeleteRrset {
        /// owner of the RRset
        name: Name,
        /// type of the RRset
        record_type: rr::RecordType,
    },
    /// Delete the record with matching name, type and data
    DeleteRecord(rr::Record),
}

impl Operation {
    /// The records this operation contributes to the update section
    fn update_records(&self) -> Vec<rr::Record> {
        match self {
            Self::Add(record) => vec![record.clone()],
            Self::Replace(record) => vec![
                delete_rrset(record.name().clone(), record.record_type()),
                record.clone(),
            ],
            Self::DeleteRrset { name, record_type } => {
                vec![delete_rrset(name.clone(), *record_type)]
            }
            Self::DeleteRecord(record) => {
                // 2.5.4 - Delete An RR From An RRset
                let mut record = record.clone();
                record.set_ttl(0).set_dns_class(DNSClass::NONE);
                vec![record]
            }
        }
    }
}

/// 2.5.2 - Delete An RRset
fn delete_rrset(name: Name, record_type: rr::RecordType) -> rr::Record {
    let mut record = rr::Record::from_rdata(name, 0, RData::Update0(record_type));
    record.set_dns_class(DNSClass::ANY);
    record
}

/// An ordered list of changes to a single zone
///
/// Building a transaction never touches the network, it only becomes a message with
/// [`UpdateTransaction::to_message`] and is signed when it is sent. Each builder method consumes
/// the transaction and returns it extended by one operation.
///
/// ```
/// use bindapi::proto::rr::Name;
/// use bindapi::record::RecordType;
/// use bindapi::update::UpdateTransaction;
///
/// let zone = Name::from_ascii("example.org.").unwrap();
/// let www = Name::from_ascii("www.example.org.").unwrap();
///
/// let transaction = UpdateTransaction::new(zone)
///     .replace(&www, 300, RecordType::A, "192.0.2.10")
///     .unwrap()
///     .delete(&www, RecordType::AAAA, None)
///     .unwrap();
/// assert_eq!(transaction.operations().len(), 2);
/// ```
#[derive(Clone, Debug)]
pub struct UpdateTransaction {
    zone: Name,
    operations: Vec<Operation>,
}

impl UpdateTransaction {
    /// An empty transaction bound to `zone`
    pub fn new(zone: Name) -> Self {
        Self {
            zone,
            operations: Vec::new(),
        }
    }

    /// The zone every operation applies to
    pub fn zone(&self) -> &Name {
        &self.zone
    }

    /// The operations, in the order they were added
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// True if nothing was added yet
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Appends an addition of `value` to the RRset of `name` and `rtype`
    pub fn add(self, name: &Name, ttl: u32, rtype: RecordType, value: &str) -> Result<Self> {
        let record = self.record(name, ttl, rtype, value)?;
        Ok(self.push(Operation::Add(record)))
    }

    /// Appends a replacement of the whole RRset of `name` and `rtype` by `value`
    pub fn replace(self, name: &Name, ttl: u32, rtype: RecordType, value: &str) -> Result<Self> {
        let record = self.record(name, ttl, rtype, value)?;
        Ok(self.push(Operation::Replace(record)))
    }

    /// Appends a deletion
    ///
    /// Without `value` the whole RRset of `name` and `rtype` goes, with it only the matching
    /// record.
    pub fn delete(self, name: &Name, rtype: RecordType, value: Option<&str>) -> Result<Self> {
        let operation = match value {
            Some(value) => Operation::DeleteRecord(self.record(name, 0, rtype, value)?),
            None => {
                self.check_name(name)?;
                Operation::DeleteRrset {
                    name: name.clone(),
                    record_type: rtype.into(),
                }
            }
        };

        Ok(self.push(operation))
    }

    /// Renders the transaction as an UPDATE message
    ///
    /// The zone section holds `(zone, IN, SOA)`, the update section the operations in order.
    /// The message id is left for the connection to assign.
    pub fn to_message(&self) -> Message {
        let mut zone = Query::new();
        zone.set_name(self.zone.clone())
            .set_query_class(DNSClass::IN)
            .set_query_type(rr::RecordType::SOA);

        let mut message = Message::new();
        message
            .set_message_type(MessageType::Query)
            .set_op_code(OpCode::Update)
            .set_recursion_desired(false)
            .add_query(zone);

        for operation in &self.operations {
            for record in operation.update_records() {
                message.add_name_server(record);
            }
        }

        message
    }

    fn record(&self, name: &Name, ttl: u32, rtype: RecordType, value: &str) -> Result<rr::Record> {
        self.check_name(name)?;
        let rdata = rtype.parse_rdata(value, &self.zone)?;
        Ok(rr::Record::from_rdata(name.clone(), ttl, rdata))
    }

    fn check_name(&self, name: &Name) -> Result<()> {
        if self.zone.zone_of(name) {
            Ok(())
        } else {
            Err(ErrorKind::DomainZoneNotPermitted(name.to_string()).into())
        }
    }

    fn push(mut self, operation: Operation) -> Self {
        self.operations.push(operation);
        self
    }
}
