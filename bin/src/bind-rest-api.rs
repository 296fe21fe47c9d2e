// Copyright 2026 The bind-rest-api Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The `bind-rest-api` binary, serving the HTTP API in front of a BIND server
//!
//! ```text
//! Usage: bind-rest-api [options]
//!        bind-rest-api (-h | --help | -V | --version)
//!
//! Options:
//!    -H, --host IP           Address to listen on, default 127.0.0.1
//!    -P, --port PORT         Port to listen on, default 8000
//!    -w, --workers N         Number of runtime workers, default 3
//!    -n, --dry-run           Print the listening options and exit
//!    -c, --config FILE       Read the configuration from FILE instead of the environment
//!    -q, --quiet             Disable INFO messages, WARN and ERROR will remain
//!    -d, --debug             Turn on DEBUG messages (default is only INFO)
//! ```

// BINARY WARNINGS
#![warn(
    clippy::dbg_macro,
    clippy::unimplemented,
    missing_copy_implementations,
    missing_docs,
    non_snake_case,
    non_upper_case_globals,
    rust_2018_idioms,
    unreachable_pub
)]
#![allow(clippy::print_stdout)]

use std::{
    net::{IpAddr, SocketAddr},
    num::NonZeroUsize,
    path::PathBuf,
    sync::Arc,
};

use clap::Parser;
#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};
use tokio::{net::TcpListener, runtime};
use tracing::{error, info, warn, Level};

use bind_rest_api::{
    logger::{logger, LogFiles},
    router,
};
use bindapi::{BindTransport, Config, DnsApi, KeyStore};

/// Cli struct for all options managed with clap derive api.
#[derive(Debug, Parser)]
#[clap(name = "bind-rest-api", version, about)]
struct Cli {
    /// Address to listen on
    #[clap(short = 'H', long = "host", default_value = "127.0.0.1", value_name = "IP")]
    pub(crate) host: IpAddr,

    /// Port to listen on
    #[clap(short = 'P', long = "port", default_value_t = 8000, value_name = "PORT")]
    pub(crate) port: u16,

    /// Number of runtime workers
    #[clap(short = 'w', long = "workers", default_value = "3", value_name = "N")]
    pub(crate) workers: NonZeroUsize,

    /// Print the options the server would run with, then exit
    #[clap(short = 'n', long = "dry-run")]
    pub(crate) dry_run: bool,

    /// Path to a TOML configuration file, the environment is used when absent
    #[clap(
        short = 'c',
        long = "config",
        value_name = "FILE",
        value_hint=clap::ValueHint::FilePath,
    )]
    pub(crate) config: Option<PathBuf>,

    /// Disable INFO messages, WARN and ERROR will remain
    #[clap(short = 'q', long = "quiet", conflicts_with = "debug")]
    pub(crate) quiet: bool,

    /// Turn on `DEBUG` messages (default is only `INFO`)
    #[clap(short = 'd', long = "debug", conflicts_with = "quiet")]
    pub(crate) debug: bool,
}

/// Main method for running the API server.
fn main() -> Result<(), String> {
    // print the error ourselves, the Termination output of a returned error is not pretty
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<(), String> {
    let args = Cli::parse();

    if args.dry_run {
        println!("would run with the following options:");
        println!("  host: {}", args.host);
        println!("  port: {}", args.port);
        println!("  workers: {}", args.workers);
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => Config::read_config(path)
            .map_err(|err| format!("failed to read config file from {path:?}: {err}"))?,
        None => Config::from_env()
            .map_err(|err| format!("failed to read configuration from the environment: {err}"))?,
    };

    let files = LogFiles::open(&config.log_dir)
        .map_err(|err| format!("failed to open log files in {:?}: {err}", config.log_dir))?;
    let level = if args.quiet {
        Level::ERROR
    } else if args.debug {
        Level::DEBUG
    } else {
        Level::INFO
    };
    logger(level, &config.application_name, Some(files))?;

    info!("bind-rest-api {} starting...", bindapi::version());

    let keys = KeyStore::read(&config.api_key_file).map_err(|err| {
        format!(
            "failed to read api keys from {:?}: {err}",
            config.api_key_file
        )
    })?;
    if keys.is_empty() {
        warn!(
            "no api key in {:?}, every request will be rejected",
            config.api_key_file
        );
    }

    let runtime = runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("bind-rest-api-runtime")
        .worker_threads(args.workers.get())
        .build()
        .map_err(|err| format!("failed to initialize Tokio runtime: {err}"))?;

    runtime.block_on(serve(SocketAddr::new(args.host, args.port), config, keys))?;

    info!("bind-rest-api {} stopping", bindapi::version());
    Ok(())
}

async fn serve(addr: SocketAddr, config: Config, keys: KeyStore) -> Result<(), String> {
    let transport = BindTransport::new(&config)
        .map_err(|err| format!("failed to set up the DNS transport: {err}"))?;
    let api = DnsApi::from_config(&config, keys, Arc::new(transport));

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|err| format!("failed to bind {addr}: {err}"))?;

    info!(
        "listening on {addr}, updating {} for zones {:?}",
        config.server, config.allowed_zones
    );

    axum::serve(listener, router(api))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| format!("server failed: {err}"))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(e) => {
                error!("failed to register signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown requested");
}
