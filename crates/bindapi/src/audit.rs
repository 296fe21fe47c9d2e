// Copyright 2026 The bind-rest-api Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Audit entries for mutations
//!
//! Every mutation attempt is wrapped in an [`AuditGuard`]. The guard emits one entry when it is
//! finished with the outcome, or a `FAILED` entry if it is dropped unfinished, which covers early
//! returns and panics alike.

use std::fmt;
use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{error, info};

use crate::error::Result;

/// Target of the tracing events carrying audit entries
pub const AUDIT_TARGET: &str = "bindapi::audit";

/// Kind of mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Record added
    Create,
    /// RRset replaced
    Replace,
    /// Record or RRsets deleted
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "CREATE",
            Self::Replace => "REPLACE",
            Self::Delete => "DELETE",
        })
    }
}

/// Whether the audited mutation took effect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The server accepted the change
    Succeeded,
    /// The change was not applied, or its fate is unknown
    Failed,
}

/// What a mutation attempt is about, known before it runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditContext {
    /// Kind of mutation
    pub operation: Operation,
    /// Qualified name being changed
    pub domain: String,
    /// Record types involved, e.g. `A` or `A,MX`
    pub types: String,
    /// Description of the records involved
    pub records: String,
    /// Identity of the caller's API key
    pub identity: String,
}

/// One audited mutation attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    /// When the attempt ended
    pub timestamp: OffsetDateTime,
    /// What was attempted, and by whom
    pub context: AuditContext,
    /// How it ended
    pub outcome: Outcome,
}

impl fmt::Display for AuditEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let AuditContext {
            operation,
            domain,
            types,
            records,
            identity,
        } = &self.context;

        if self.outcome == Outcome::Failed {
            f.write_str("FAILED:")?;
        }
        write!(
            f,
            "{operation} {domain} {types} {identity} -> {domain} record {records} for key {identity}"
        )
    }
}

/// Destination of audit entries
pub trait AuditSink: Send + Sync {
    /// Records `entry`; must not interleave with concurrent calls
    fn record(&self, entry: &AuditEntry);
}

/// Emits entries as tracing events with target [`AUDIT_TARGET`]
///
/// Successes are logged at info level, failures at error level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, entry: &AuditEntry) {
        let context = &entry.context;
        match entry.outcome {
            Outcome::Succeeded => info!(
                target: AUDIT_TARGET,
                operation = %context.operation,
                domain = %context.domain,
                identity = %context.identity,
                "{entry}"
            ),
            Outcome::Failed => error!(
                target: AUDIT_TARGET,
                operation = %context.operation,
                domain = %context.domain,
                identity = %context.identity,
                "{entry}"
            ),
        }
    }
}

/// Hands out guards writing to one sink
#[derive(Clone)]
pub struct AuditTrail {
    sink: Arc<dyn AuditSink>,
}

impl AuditTrail {
    /// A trail writing to `sink`
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    /// A trail writing tracing events
    pub fn tracing() -> Self {
        Self::new(Arc::new(TracingAuditSink))
    }

    /// Opens the audit scope of one mutation attempt
    pub fn begin(&self, context: AuditContext) -> AuditGuard {
        AuditGuard {
            sink: self.sink.clone(),
            context: Some(context),
        }
    }
}

impl Default for AuditTrail {
    fn default() -> Self {
        Self::tracing()
    }
}

/// Emits exactly one entry for its mutation attempt
#[must_use = "dropping the guard audits the attempt as failed"]
pub struct AuditGuard {
    sink: Arc<dyn AuditSink>,
    context: Option<AuditContext>,
}

impl AuditGuard {
    /// Emits the entry for `result` and disarms the guard
    pub fn finish<T>(mut self, result: &Result<T>) {
        let outcome = match result {
            Ok(_) => Outcome::Succeeded,
            Err(_) => Outcome::Failed,
        };
        self.emit(outcome);
    }

    fn emit(&mut self, outcome: Outcome) {
        if let Some(context) = self.context.take() {
            self.sink.record(&AuditEntry {
                timestamp: OffsetDateTime::now_utc(),
                context,
                outcome,
            });
        }
    }
}

impl Drop for AuditGuard {
    fn drop(&mut self) {
        self.emit(Outcome::Failed);
    }
}
