// Copyright 2026 The bind-rest-api Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Point lookups of one name, for several record types at once

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use futures_util::future::try_join_all;
use hickory_proto::rr::Name;
use tracing::debug;

use crate::error::Result;
use crate::record::RecordType;
use crate::transport::DnsTransport;

/// Record data found for a name, keyed by type
pub type Resolution = BTreeMap<RecordType, Vec<String>>;

/// Runs one lookup per requested type, concurrently
#[derive(Clone)]
pub struct Resolver {
    transport: Arc<dyn DnsTransport>,
}

impl Resolver {
    /// Creates a resolver looking up through `transport`
    pub fn new(transport: Arc<dyn DnsTransport>) -> Self {
        Self { transport }
    }

    /// Resolves `domain` for each of `types`
    ///
    /// Types without data, and a name that does not exist, leave no key in the result. Any other
    /// failure fails the whole call. Repeated types are looked up once.
    pub async fn resolve_many(&self, domain: &Name, types: &[RecordType]) -> Result<Resolution> {
        let types = types.iter().copied().collect::<BTreeSet<_>>();

        let answers = try_join_all(types.into_iter().map(|rtype| async move {
            let records = self.transport.lookup(domain, rtype.into()).await?;
            Ok::<_, crate::Error>((rtype, records))
        }))
        .await?;

        let resolution = answers
            .into_iter()
            .filter(|(_, records)| !records.is_empty())
            .map(|(rtype, records)| {
                let data = records.iter().map(|r| r.data().to_string()).collect();
                (rtype, data)
            })
            .collect::<Resolution>();

        debug!(
            "{domain} resolved for {:?}",
            resolution.keys().collect::<Vec<_>>()
        );
        Ok(resolution)
    }
}
