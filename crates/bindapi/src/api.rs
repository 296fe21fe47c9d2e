// Copyright 2026 The bind-rest-api Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The request pipeline behind every route

use std::collections::BTreeSet;
use std::sync::Arc;

use hickory_proto::rr::Name;
use tracing::debug;

use crate::audit::{AuditContext, AuditTrail, Operation};
use crate::config::Config;
use crate::error::{ErrorKind, Result};
use crate::executor::UpdateExecutor;
use crate::key_store::KeyStore;
use crate::record::{Record, RecordType};
use crate::resolve::{Resolution, Resolver};
use crate::transport::DnsTransport;
use crate::update::UpdateTransaction;
use crate::xfer::{ZoneSnapshot, ZoneTransferClient};
use crate::zone::{qualify, ValidationResult, ZoneValidator};

/// Entry point of every request
///
/// Each operation authorizes the caller's token before anything else, then qualifies and
/// validates the requested name, and only then talks to the server. Mutations run in their own
/// task: once validated, a mutation completes and is audited even if the caller goes away.
///
/// Cloning is cheap, all clones share the same state.
#[derive(Clone)]
pub struct DnsApi {
    inner: Arc<Inner>,
}

struct Inner {
    keys: KeyStore,
    zones: ZoneValidator,
    executor: UpdateExecutor,
    xfer: ZoneTransferClient,
    resolver: Resolver,
    audit: AuditTrail,
}

impl DnsApi {
    /// Creates the API over the allowed zones of `config`, auditing through tracing
    pub fn from_config(config: &Config, keys: KeyStore, transport: Arc<dyn DnsTransport>) -> Self {
        Self::new(
            ZoneValidator::new(config.allowed_zones.iter().cloned()),
            keys,
            transport,
            AuditTrail::tracing(),
        )
    }

    /// Creates the API from its parts
    pub fn new(
        zones: ZoneValidator,
        keys: KeyStore,
        transport: Arc<dyn DnsTransport>,
        audit: AuditTrail,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                keys,
                zones,
                executor: UpdateExecutor::new(transport.clone()),
                xfer: ZoneTransferClient::new(transport.clone()),
                resolver: Resolver::new(transport),
                audit,
            }),
        }
    }

    /// Transfers a whole allowed zone
    pub async fn get_zone(&self, token: Option<&str>, zone_name: &str) -> Result<ZoneSnapshot> {
        let identity = self.inner.keys.authorize(token)?;
        debug!("api key {identity} requested zone {zone_name}");

        let validated = self.inner.zones.for_transfer(&qualify(zone_name))?;
        let snapshot = self.inner.xfer.transfer(&validated.zone).await?;

        debug!(
            "api key {identity} requested zone {} - sending zone",
            validated.zone
        );
        Ok(snapshot)
    }

    /// Looks up the records of `types` at `domain`, all types if `types` is empty
    pub async fn get_records(
        &self,
        token: Option<&str>,
        domain: &str,
        types: &[RecordType],
    ) -> Result<Resolution> {
        let identity = self.inner.keys.authorize(token)?;
        let types: &[RecordType] = if types.is_empty() {
            &RecordType::ALL
        } else {
            types
        };
        debug!("api key {identity} requested domain records {domain} with types {types:?}");

        let validated = self.inner.zones.for_lookup(&qualify(domain))?;
        self.inner
            .resolver
            .resolve_many(&validated.domain, types)
            .await
    }

    /// Adds `record` to its RRset at `domain`
    pub async fn create_record(&self, token: Option<&str>, domain: &str, record: Record) -> Result<()> {
        self.mutate(token, domain, Change::Create(record)).await
    }

    /// Replaces the RRset of `record`'s type at `domain` with `record`
    pub async fn replace_record(&self, token: Option<&str>, domain: &str, record: Record) -> Result<()> {
        self.mutate(token, domain, Change::Replace(record)).await
    }

    /// Deletes the record matching `record` at `domain`
    pub async fn delete_record(&self, token: Option<&str>, domain: &str, record: Record) -> Result<()> {
        self.mutate(token, domain, Change::Delete(record)).await
    }

    /// Deletes the RRsets of `types` at `domain`, all types if `types` is empty
    ///
    /// All deletions travel in a single update.
    pub async fn delete_record_types(
        &self,
        token: Option<&str>,
        domain: &str,
        types: &[RecordType],
    ) -> Result<()> {
        let types = if types.is_empty() {
            RecordType::ALL.into_iter().collect()
        } else {
            types.iter().copied().collect::<BTreeSet<_>>()
        };
        self.mutate(token, domain, Change::DeleteTypes(types)).await
    }

    async fn mutate(&self, token: Option<&str>, domain: &str, change: Change) -> Result<()> {
        let identity = self.inner.keys.authorize(token)?.to_string();
        let validated = self.inner.zones.for_update(&qualify(domain))?;
        debug!(
            "api key {identity} requested {} of {} in zone {}",
            change.operation(),
            validated.domain,
            validated.zone
        );

        let context = change.audit_context(&validated.domain, identity);
        let inner = self.inner.clone();
        let task = tokio::spawn(async move {
            let guard = inner.audit.begin(context);
            let result = inner.apply(validated, change).await;
            guard.finish(&result);
            result
        });

        match task.await {
            Ok(result) => result,
            Err(e) => Err(ErrorKind::Unexpected(format!("mutation task failed: {e}")).into()),
        }
    }
}

impl Inner {
    async fn apply(&self, validated: ValidationResult, change: Change) -> Result<()> {
        let ValidationResult {
            domain,
            zone,
            transaction,
        } = validated;

        let transaction = transaction.unwrap_or_else(|| UpdateTransaction::new(zone));
        let transaction = change.build(transaction, &domain)?;
        self.executor.execute(&transaction).await
    }
}

/// A requested mutation, before it becomes a transaction
enum Change {
    Create(Record),
    Replace(Record),
    Delete(Record),
    DeleteTypes(BTreeSet<RecordType>),
}

impl Change {
    fn operation(&self) -> Operation {
        match self {
            Self::Create(_) => Operation::Create,
            Self::Replace(_) => Operation::Replace,
            Self::Delete(_) | Self::DeleteTypes(_) => Operation::Delete,
        }
    }

    fn audit_context(&self, domain: &Name, identity: String) -> AuditContext {
        let (types, records) = match self {
            Self::Create(record) | Self::Replace(record) | Self::Delete(record) => {
                (record.rrtype.to_string(), record.to_string())
            }
            Self::DeleteTypes(types) => {
                let types = types.iter().map(|t| t.as_str()).collect::<Vec<_>>();
                (types.join(","), format!("{types:?}"))
            }
        };

        AuditContext {
            operation: self.operation(),
            domain: domain.to_string(),
            types,
            records,
            identity,
        }
    }

    fn build(self, transaction: UpdateTransaction, domain: &Name) -> Result<UpdateTransaction> {
        match self {
            Self::Create(record) => {
                transaction.add(domain, record.ttl, record.rrtype, &record.response)
            }
            Self::Replace(record) => {
                transaction.replace(domain, record.ttl, record.rrtype, &record.response)
            }
            Self::Delete(record) => {
                transaction.delete(domain, record.rrtype, Some(&record.response))
            }
            Self::DeleteTypes(types) => types
                .into_iter()
                .try_fold(transaction, |transaction, rtype| {
                    debug!("deleting {domain} type {rtype}");
                    transaction.delete(domain, rtype, None)
                }),
        }
    }
}
