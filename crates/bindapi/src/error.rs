// Copyright 2026 The bind-rest-api Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Error types for the crate

use std::fmt;

use hickory_client::ClientError;
use hickory_proto::op::ResponseCode;
use hickory_proto::ProtoError;
use hickory_resolver::ResolveError;
use thiserror::Error;

use crate::record::RecordType;

/// An alias for results returned by functions of this crate
pub type Result<T> = ::std::result::Result<T, Error>;

/// The error kind for errors that get returned in the crate
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The caller supplied no API key, or one that is not in the key table
    #[error("invalid api key")]
    InvalidApiKey,

    /// A zone transfer was requested for a zone that is not on the allow-list
    #[error("zone {0} is not permitted")]
    ZoneNotPermitted(String),

    /// A lookup was requested for a name outside every allowed zone
    #[error("domain {0} is not permitted")]
    DomainNotPermitted(String),

    /// A mutation was requested for a name outside every allowed zone
    #[error("zone of domain {0} is not permitted")]
    DomainZoneNotPermitted(String),

    /// The record value could not be parsed for its type
    #[error("invalid {rrtype} record data {value:?}: {reason}")]
    InvalidRecord {
        /// type the value was parsed as
        rrtype: RecordType,
        /// the offending value
        value: String,
        /// why it was rejected
        reason: String,
    },

    // foreign
    /// The authoritative server could not be reached, or the exchange broke down
    #[error("transport error: {0}")]
    Transport(#[from] ProtoError),

    /// The client connection to the authoritative server failed
    #[error("client error: {0}")]
    Client(#[from] ClientError),

    /// The authoritative server answered an update with an error code
    #[error("server rejected the request: {0}")]
    ResponseCode(ResponseCode),

    /// The server answered with something that does not follow the protocol
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A lookup failed for another reason than the absence of data
    #[error("resolution failed: {0}")]
    Resolve(#[from] ResolveError),

    /// A mutation task ended without producing a result
    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

/// The error type for errors that get returned in the crate
#[derive(Debug)]
pub struct Error {
    kind: Box<ErrorKind>,
}

impl Error {
    /// Get the kind of the error
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// True for the authorization failure, raised before any zone or protocol work
    pub fn is_auth(&self) -> bool {
        matches!(*self.kind, ErrorKind::InvalidApiKey)
    }

    /// True for failures caused by what the caller asked for: a name outside the allowed zones
    /// or a record value that does not parse
    pub fn is_validation(&self) -> bool {
        matches!(
            *self.kind,
            ErrorKind::ZoneNotPermitted(_)
                | ErrorKind::DomainNotPermitted(_)
                | ErrorKind::DomainZoneNotPermitted(_)
                | ErrorKind::InvalidRecord { .. }
        )
    }

    /// True for transport, protocol and unexpected failures
    ///
    /// The details of these must never be shown to the caller.
    pub fn is_internal(&self) -> bool {
        !self.is_auth() && !self.is_validation()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.kind, f)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.kind.source()
    }
}

impl<E> From<E> for Error
where
    E: Into<ErrorKind>,
{
    fn from(error: E) -> Self {
        let kind: ErrorKind = error.into();

        Self {
            kind: Box::new(kind),
        }
    }
}

impl From<ResponseCode> for ErrorKind {
    fn from(code: ResponseCode) -> Self {
        // this should never be a NoError
        debug_assert!(code != ResponseCode::NoError);
        Self::ResponseCode(code)
    }
}
