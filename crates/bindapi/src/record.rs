// Copyright 2026 The bind-rest-api Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Record types and record values as they cross the API boundary

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use hickory_proto::rr::rdata::{A, AAAA, CNAME, MX, NS, SOA, TXT};
use hickory_proto::rr::{self, Name, RData};
use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, Result};

/// Default TTL applied when a record is submitted without one
pub const DEFAULT_TTL: u32 = 3600;

/// The record types that may be read and written through the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordType {
    /// IPv4 address
    A,
    /// IPv6 address
    AAAA,
    /// Canonical name
    CNAME,
    /// Mail exchange
    MX,
    /// Name server
    NS,
    /// Text
    TXT,
    /// Start of authority
    SOA,
}

impl RecordType {
    /// Every supported type, in the order the API reports them
    pub const ALL: [Self; 7] = [
        Self::A,
        Self::AAAA,
        Self::CNAME,
        Self::MX,
        Self::NS,
        Self::TXT,
        Self::SOA,
    ];

    /// The textual code of this type, e.g. `"AAAA"`
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::AAAA => "AAAA",
            Self::CNAME => "CNAME",
            Self::MX => "MX",
            Self::NS => "NS",
            Self::TXT => "TXT",
            Self::SOA => "SOA",
        }
    }

    /// Parses the presentation form of a value of this type into record data
    ///
    /// Names without a trailing `.` are taken relative to `origin`.
    pub fn parse_rdata(self, value: &str, origin: &Name) -> Result<RData> {
        let invalid = |reason: String| ErrorKind::InvalidRecord {
            rrtype: self,
            value: value.to_string(),
            reason,
        };

        let value = value.trim();
        let rdata = match self {
            Self::A => Ipv4Addr::from_str(value)
                .map(|ip| RData::A(A::from(ip)))
                .map_err(|e| invalid(e.to_string()))?,
            Self::AAAA => Ipv6Addr::from_str(value)
                .map(|ip| RData::AAAA(AAAA::from(ip)))
                .map_err(|e| invalid(e.to_string()))?,
            Self::CNAME => RData::CNAME(CNAME(parse_name(value, origin).map_err(invalid)?)),
            Self::NS => RData::NS(NS(parse_name(value, origin).map_err(invalid)?)),
            Self::MX => {
                let mut fields = value.split_whitespace();
                let (Some(preference), Some(exchange), None) =
                    (fields.next(), fields.next(), fields.next())
                else {
                    return Err(invalid("expected `preference exchange`".to_string()).into());
                };

                let preference = preference
                    .parse::<u16>()
                    .map_err(|e| invalid(format!("bad preference: {e}")))?;
                RData::MX(MX::new(
                    preference,
                    parse_name(exchange, origin).map_err(invalid)?,
                ))
            }
            Self::TXT => RData::TXT(TXT::new(parse_txt(value).map_err(invalid)?)),
            Self::SOA => {
                let fields = value.split_whitespace().collect::<Vec<_>>();
                let &[mname, rname, serial, refresh, retry, expire, minimum] = fields.as_slice() else {
                    return Err(invalid(
                        "expected `mname rname serial refresh retry expire minimum`".to_string(),
                    )
                    .into());
                };

                let number = |field: &str, what: &str| {
                    field
                        .parse::<u32>()
                        .map_err(|e| invalid(format!("bad {what}: {e}")))
                };
                let interval = |field: &str, what: &str| {
                    field
                        .parse::<i32>()
                        .map_err(|e| invalid(format!("bad {what}: {e}")))
                };

                RData::SOA(SOA::new(
                    parse_name(mname, origin).map_err(invalid)?,
                    parse_name(rname, origin).map_err(invalid)?,
                    number(serial, "serial")?,
                    interval(refresh, "refresh")?,
                    interval(retry, "retry")?,
                    interval(expire, "expire")?,
                    number(minimum, "minimum")?,
                ))
            }
        };

        Ok(rdata)
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = UnknownRecordType;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.as_str() == s)
            .ok_or_else(|| UnknownRecordType(s.to_string()))
    }
}

impl From<RecordType> for rr::RecordType {
    fn from(ty: RecordType) -> Self {
        match ty {
            RecordType::A => Self::A,
            RecordType::AAAA => Self::AAAA,
            RecordType::CNAME => Self::CNAME,
            RecordType::MX => Self::MX,
            RecordType::NS => Self::NS,
            RecordType::TXT => Self::TXT,
            RecordType::SOA => Self::SOA,
        }
    }
}

impl TryFrom<rr::RecordType> for RecordType {
    type Error = UnknownRecordType;

    fn try_from(ty: rr::RecordType) -> std::result::Result<Self, Self::Error> {
        match ty {
            rr::RecordType::A => Ok(Self::A),
            rr::RecordType::AAAA => Ok(Self::AAAA),
            rr::RecordType::CNAME => Ok(Self::CNAME),
            rr::RecordType::MX => Ok(Self::MX),
            rr::RecordType::NS => Ok(Self::NS),
            rr::RecordType::TXT => Ok(Self::TXT),
            rr::RecordType::SOA => Ok(Self::SOA),
            other => Err(UnknownRecordType(other.to_string())),
        }
    }
}

/// A record type code outside of [`RecordType`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported record type: {0}")]
pub struct UnknownRecordType(pub String);

/// A record as submitted by a caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// The record data in presentation form, e.g. `10.9.1.135`
    pub response: String,
    /// The type of the record
    pub rrtype: RecordType,
    /// Time to live, in seconds
    #[serde(default = "default_ttl")]
    pub ttl: u32,
}

impl Record {
    /// A record with the default TTL
    pub fn new(rrtype: RecordType, response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            rrtype,
            ttl: DEFAULT_TTL,
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "response={:?} rrtype={} ttl={}",
            self.response, self.rrtype, self.ttl
        )
    }
}

fn default_ttl() -> u32 {
    DEFAULT_TTL
}

fn parse_name(value: &str, origin: &Name) -> std::result::Result<Name, String> {
    let name = Name::from_ascii(value).map_err(|e| e.to_string())?;
    if name.is_fqdn() {
        return Ok(name);
    }

    name.append_domain(origin).map_err(|e| e.to_string())
}

/// Splits TXT data into its character strings
///
/// Unquoted text is a single string, quoted text may hold several `"..."` strings separated by
/// whitespace. Inside quotes `\"` and `\\` are unescaped.
fn parse_txt(value: &str) -> std::result::Result<Vec<String>, String> {
    if !value.starts_with('"') {
        return Ok(vec![value.to_string()]);
    }

    let mut strings = Vec::new();
    let mut chars = value.chars();
    loop {
        match chars.next() {
            None => break,
            Some(c) if c.is_whitespace() => continue,
            Some('"') => {
                let mut current = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(escaped) => current.push(escaped),
                            None => return Err("dangling escape".to_string()),
                        },
                        Some(c) => current.push(c),
                        None => return Err("unterminated quoted string".to_string()),
                    }
                }
                strings.push(current);
            }
            Some(c) => return Err(format!("unexpected {c:?} outside of quotes")),
        }
    }

    Ok(strings)
}
