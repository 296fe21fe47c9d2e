// Copyright 2026 The bind-rest-api Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

// LIBRARY WARNINGS
#![warn(
    clippy::default_trait_access,
    clippy::unimplemented,
    missing_copy_implementations,
    missing_docs
)]
#![allow(clippy::upper_case_acronyms)]

//! bindapi is the core of bind-rest-api: it lets authorized callers inspect and mutate records
//! on an authoritative name server.
//!
//! Mutations are sent as TSIG signed dynamic updates ([RFC 2136]), whole zones are read with
//! AXFR, and single names are looked up with ordinary resolution. The request pipeline lives in
//! [`DnsApi`]:
//!
//! ```text
//! authorize (KeyStore) -> qualify -> ZoneValidator -> UpdateTransaction -> UpdateExecutor
//!                                                  \-> ZoneTransferClient / Resolver
//! ```
//!
//! Every mutation attempt is wrapped by the [`audit::AuditTrail`], which emits exactly one entry
//! whatever the outcome.
//!
//! The network is reached through the [`transport::DnsTransport`] trait; [`BindTransport`] is the
//! hickory based implementation used in production.
//!
//! [RFC 2136]: https://tools.ietf.org/html/rfc2136

pub use hickory_proto as proto;

pub mod api;
pub mod audit;
pub mod config;
pub mod error;
pub mod executor;
pub mod key_store;
pub mod record;
pub mod resolve;
pub mod transport;
pub mod update;
pub mod xfer;
pub mod zone;

pub use self::api::DnsApi;
pub use self::config::{Config, ConfigError};
pub use self::error::{Error, ErrorKind};
pub use self::key_store::KeyStore;
pub use self::record::{Record, RecordType};
pub use self::transport::{BindTransport, DnsTransport};

/// Returns the current version of bindapi
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
