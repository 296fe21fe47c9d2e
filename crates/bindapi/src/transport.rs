// Copyright 2026 The bind-rest-api Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Network access to the authoritative server

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::TryStreamExt;
use hickory_client::client::{Client, ClientHandle};
use hickory_proto::dnssec::tsig::TSigner;
use hickory_proto::op::{MessageFinalizer, ResponseCode};
use hickory_proto::runtime::TokioRuntimeProvider;
use hickory_proto::rr::{self, Name};
use hickory_proto::tcp::TcpClientStream;
use hickory_proto::xfer::{DnsHandle, DnsMultiplexer, DnsRequest, DnsRequestOptions, Protocol};
use hickory_proto::{ProtoError, ProtoErrorKind};
use hickory_resolver::config::{NameServerConfig, ResolverConfig};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::{Resolver, TokioResolver};
use tracing::debug;

use crate::config::{Config, ConfigError};
use crate::error::{ErrorKind, Result};
use crate::update::UpdateTransaction;

/// Fudge, in seconds, accepted between our clock and the server's on signed messages
const TSIG_FUDGE: u16 = 300;

/// The three exchanges the API has with the authoritative server
///
/// Implementations must be usable from many tasks at once.
#[async_trait]
pub trait DnsTransport: Send + Sync {
    /// Sends `transaction` as a signed UPDATE and returns the server's response code
    ///
    /// Exactly one attempt is made.
    async fn update(&self, transaction: &UpdateTransaction) -> Result<ResponseCode>;

    /// Transfers `zone` and returns every record of the stream, in stream order
    ///
    /// The opening and closing SOA records are part of the result.
    async fn zone_transfer(&self, zone: &Name) -> Result<Vec<rr::Record>>;

    /// Looks up the records of `record_type` at `name`
    ///
    /// A name without such records, or a name that does not exist, yields an empty list.
    async fn lookup(&self, name: &Name, record_type: rr::RecordType) -> Result<Vec<rr::Record>>;
}

/// [`DnsTransport`] talking to a BIND server
///
/// Updates and transfers use a fresh TCP connection per call; updates are signed with the
/// configured TSIG key. Lookups go through a resolver whose only name server is the configured
/// one and whose cache is disabled, so reads see preceding writes.
pub struct BindTransport {
    server: SocketAddr,
    timeout: Duration,
    signer: Arc<dyn MessageFinalizer>,
    resolver: TokioResolver,
}

impl BindTransport {
    /// Creates a transport for the server and key of `config`
    pub fn new(config: &Config) -> std::result::Result<Self, ConfigError> {
        let signer = TSigner::new(
            config.tsig_secret.clone(),
            config.tsig_algorithm.clone(),
            config.tsig_key_name.clone(),
            TSIG_FUDGE,
        )
        .map_err(|e| ConfigError::Invalid {
            field: "tsig_secret",
            reason: e.to_string(),
        })?;

        let mut resolver_config = ResolverConfig::new();
        resolver_config.add_name_server(NameServerConfig::new(config.server, Protocol::Udp));
        resolver_config.add_name_server(NameServerConfig::new(config.server, Protocol::Tcp));

        let mut builder =
            Resolver::builder_with_config(resolver_config, TokioConnectionProvider::default());
        let options = builder.options_mut();
        options.cache_size = 0;
        options.timeout = config.timeout;
        options.recursion_desired = false;

        Ok(Self {
            server: config.server,
            timeout: config.timeout,
            signer: Arc::new(signer),
            resolver: builder.build(),
        })
    }

    async fn connect(&self, signer: Option<Arc<dyn MessageFinalizer>>) -> Result<Client> {
        let (stream, sender) = TcpClientStream::new(
            self.server,
            None,
            Some(self.timeout),
            TokioRuntimeProvider::default(),
        );
        let multiplexer = DnsMultiplexer::new(stream, sender, signer);

        let (client, bg) = Client::connect(multiplexer).await?;
        tokio::spawn(bg);
        Ok(client)
    }

    async fn timed<T>(&self, exchange: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(result) => result,
            Err(_) => Err(ProtoError::from(ProtoErrorKind::Timeout).into()),
        }
    }
}

#[async_trait]
impl DnsTransport for BindTransport {
    async fn update(&self, transaction: &UpdateTransaction) -> Result<ResponseCode> {
        let message = transaction.to_message();

        self.timed(async {
            let client = self.connect(Some(self.signer.clone())).await?;
            let mut responses = client.send(DnsRequest::new(message, DnsRequestOptions::default()));

            let response = responses.try_next().await?.ok_or_else(|| {
                ErrorKind::Protocol(format!("no response to update of {}", transaction.zone()))
            })?;
            debug!(
                "update of {} answered with {}",
                transaction.zone(),
                response.response_code()
            );
            Ok(response.response_code())
        })
        .await
    }

    async fn zone_transfer(&self, zone: &Name) -> Result<Vec<rr::Record>> {
        self.timed(async {
            let mut client = self.connect(None).await?;
            let mut responses = client.zone_transfer(zone.clone(), None);

            let mut records = Vec::new();
            while let Some(response) = responses.try_next().await? {
                if response.response_code() != ResponseCode::NoError {
                    return Err(ErrorKind::from(response.response_code()).into());
                }
                records.extend(response.answers().iter().cloned());
            }

            debug!("transfer of {zone} returned {} records", records.len());
            Ok(records)
        })
        .await
    }

    async fn lookup(&self, name: &Name, record_type: rr::RecordType) -> Result<Vec<rr::Record>> {
        match self.resolver.lookup(name.clone(), record_type).await {
            Ok(lookup) => Ok(lookup
                .record_iter()
                .filter(|record| record.record_type() == record_type)
                .cloned()
                .collect()),
            Err(e) if e.is_no_records_found() || e.is_nx_domain() => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}
