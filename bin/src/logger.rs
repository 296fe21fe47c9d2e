// Copyright 2026 The bind-rest-api Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Tracing setup: console output plus the audit and debug log files

use std::{
    env, fmt,
    fs::{self, File, OpenOptions},
    io,
    path::Path,
    sync::Mutex,
};

use bindapi::audit::AUDIT_TARGET;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    filter::Targets,
    fmt::{format, FmtContext, FormatEvent, FormatFields, FormattedFields},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// File receiving the audit entries
pub const AUDIT_LOG: &str = "dns-api-audit.log";

/// File receiving every debug message of the crates
pub const DEBUG_LOG: &str = "dns-api-debug.log";

/// The log files, opened for appending
pub struct LogFiles {
    audit: File,
    debug: File,
}

impl LogFiles {
    /// Opens, or creates, both files in `dir`
    pub fn open(dir: &Path) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let open = |name: &str| OpenOptions::new().create(true).append(true).open(dir.join(name));

        Ok(Self {
            audit: open(AUDIT_LOG)?,
            debug: open(DEBUG_LOG)?,
        })
    }
}

/// Formats events as `<rfc3339 time> == <application> == <level>:<target>:<line>:<spans>: <fields>`
struct ApiFormatter {
    application_name: String,
}

impl<S, N> FormatEvent<S, N> for ApiFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let now = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(|_| fmt::Error)?;

        let metadata = event.metadata();
        write!(
            &mut writer,
            "{now} == {} == {}:{}",
            self.application_name,
            metadata.level(),
            metadata.target()
        )?;

        if let Some(line) = metadata.line() {
            write!(&mut writer, ":{line}")?;
        }

        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                write!(writer, ":{}", span.name())?;

                let ext = span.extensions();
                if let Some(fields) = ext.get::<FormattedFields<N>>() {
                    if !fields.is_empty() {
                        write!(writer, "{{{fields}}}")?;
                    }
                }
            }
        }

        write!(writer, ": ")?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

fn get_env() -> String {
    env::var("RUST_LOG").unwrap_or_default()
}

fn all_bind_rest_api(level: impl ToString) -> String {
    format!(
        "bindapi={level},bind_rest_api={level},{env}",
        level = level.to_string().to_lowercase(),
        env = get_env()
    )
}

/// Installs the global subscriber
///
/// The console shows `level` and above for the crates, adjusted by `RUST_LOG`. When `files` are
/// given, the audit file receives the audit entries only and the debug file every debug message
/// of the crates, audit entries included, whatever `level` is.
pub fn logger(level: Level, application_name: &str, files: Option<LogFiles>) -> Result<(), String> {
    let filter = EnvFilter::builder()
        .with_default_directive(Level::WARN.into())
        .parse(all_bind_rest_api(level))
        .map_err(|err| format!("failed to configure tracing/logging: {err}"))?;

    let formatter = || ApiFormatter {
        application_name: application_name.to_string(),
    };

    let console = tracing_subscriber::fmt::layer()
        .event_format(formatter())
        .with_filter(filter);

    let (audit, debug) = match files {
        Some(LogFiles { audit, debug }) => (
            Some(
                tracing_subscriber::fmt::layer()
                    .event_format(formatter())
                    .with_ansi(false)
                    .with_writer(Mutex::new(audit))
                    .with_filter(Targets::new().with_target(AUDIT_TARGET, Level::INFO)),
            ),
            Some(
                tracing_subscriber::fmt::layer()
                    .event_format(formatter())
                    .with_ansi(false)
                    .with_writer(Mutex::new(debug))
                    .with_filter(
                        Targets::new()
                            .with_target("bindapi", Level::DEBUG)
                            .with_target("bind_rest_api", Level::DEBUG),
                    ),
            ),
        ),
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console)
        .with(audit)
        .with(debug)
        .try_init()
        .map_err(|err| format!("failed to install the tracing subscriber: {err}"))
}
