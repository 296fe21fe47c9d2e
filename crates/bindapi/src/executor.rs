// Copyright 2026 The bind-rest-api Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::sync::Arc;

use hickory_proto::op::ResponseCode;
use tracing::debug;

use crate::error::{ErrorKind, Result};
use crate::transport::DnsTransport;
use crate::update::UpdateTransaction;

/// Ships update transactions and classifies the outcome
///
/// One attempt per transaction, no retry and no serialization of concurrent writes. Failure
/// details are logged at debug level only.
#[derive(Clone)]
pub struct UpdateExecutor {
    transport: Arc<dyn DnsTransport>,
}

impl UpdateExecutor {
    /// Creates an executor sending through `transport`
    pub fn new(transport: Arc<dyn DnsTransport>) -> Self {
        Self { transport }
    }

    /// Sends `transaction`, succeeding only if the server answers NOERROR
    pub async fn execute(&self, transaction: &UpdateTransaction) -> Result<()> {
        debug!(
            "sending update of {} with {} operations",
            transaction.zone(),
            transaction.operations().len()
        );

        match self.transport.update(transaction).await {
            Ok(ResponseCode::NoError) => Ok(()),
            Ok(code) => {
                debug!("update of {} rejected: {code}", transaction.zone());
                Err(ErrorKind::from(code).into())
            }
            Err(e) => {
                debug!("update of {} failed: {e}", transaction.zone());
                Err(e)
            }
        }
    }
}
