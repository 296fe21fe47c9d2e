// Copyright 2026 The bind-rest-api Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Process wide configuration, read once at startup

use std::{
    env, fmt, fs, io,
    net::{IpAddr, SocketAddr},
    path::{Path, PathBuf},
    time::Duration,
};

use data_encoding::BASE64;
use hickory_proto::dnssec::rdata::tsig::TsigAlgorithm;
use hickory_proto::rr::Name;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::zone::qualify;

/// Port of the authoritative server when the address carries none
pub const DEFAULT_DNS_PORT: u16 = 53;

/// Timeout for a single exchange with the authoritative server
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Immutable settings shared by every component
///
/// Built once, at startup, either from the environment ([`Config::from_env`]) or from a TOML
/// file ([`Config::read_config`]); both go through the same validation.
#[derive(Clone)]
pub struct Config {
    /// Address of the authoritative server
    pub server: SocketAddr,
    /// Name of the TSIG key known to the server
    pub tsig_key_name: Name,
    /// Decoded TSIG shared secret
    pub tsig_secret: Vec<u8>,
    /// MAC algorithm of the TSIG key
    pub tsig_algorithm: TsigAlgorithm,
    /// Zones that may be read and written, in match order
    pub allowed_zones: Vec<Name>,
    /// Path of the API key table
    pub api_key_file: PathBuf,
    /// Directory receiving the audit and debug logs
    pub log_dir: PathBuf,
    /// Name stamped on every log line
    pub application_name: String,
    /// Timeout for each exchange with the server
    pub timeout: Duration,
}

impl Config {
    /// read a Config file from the file specified at path.
    pub fn read_config(path: &Path) -> Result<Self, ConfigError> {
        let toml = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&toml)
    }

    /// Read a [`Config`] from the given TOML string.
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(toml)?;
        file.try_into()
    }

    /// Read a [`Config`] from the process environment
    ///
    /// | variable | meaning |
    /// |---|---|
    /// | `BIND_SERVER` | `ip` or `ip:port` of the authoritative server |
    /// | `TSIG_USERNAME` | TSIG key name |
    /// | `TSIG_PASSWORD` | base64 TSIG secret |
    /// | `TSIG_ALGORITHM` | optional, `hmac-sha256` by default |
    /// | `BIND_ALLOWED_ZONES` | comma separated zone list |
    /// | `API_KEY_FILE` | path of the key table |
    /// | `LOGGING_DIR` | optional, `./logs` by default |
    /// | `LOGGING_APPLICATION_NAME` | optional |
    /// | `DNS_TIMEOUT_SECS` | optional, 5 by default |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|key| env::var(key).ok())
    }

    /// Same as [`Config::from_env`], with variables looked up through `var`
    pub fn from_env_with(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &'static str| var(key).ok_or(ConfigError::Missing(key));

        let timeout_secs = match var("DNS_TIMEOUT_SECS") {
            Some(secs) => secs.trim().parse().map_err(|e| ConfigError::Invalid {
                field: "DNS_TIMEOUT_SECS",
                reason: format!("{e}"),
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        ConfigFile {
            server: required("BIND_SERVER")?,
            tsig_key_name: required("TSIG_USERNAME")?,
            tsig_secret: required("TSIG_PASSWORD")?,
            tsig_algorithm: var("TSIG_ALGORITHM"),
            allowed_zones: required("BIND_ALLOWED_ZONES")?
                .split(',')
                .map(str::to_string)
                .collect(),
            api_key_file: required("API_KEY_FILE")?.into(),
            log_dir: var("LOGGING_DIR").map_or_else(default_log_dir, PathBuf::from),
            application_name: var("LOGGING_APPLICATION_NAME")
                .unwrap_or_else(default_application_name),
            timeout_secs,
        }
        .try_into()
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("server", &self.server)
            .field("tsig_key_name", &self.tsig_key_name)
            .field("tsig_secret", &"<redacted>")
            .field("tsig_algorithm", &self.tsig_algorithm)
            .field("allowed_zones", &self.allowed_zones)
            .field("api_key_file", &self.api_key_file)
            .field("log_dir", &self.log_dir)
            .field("application_name", &self.application_name)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Configuration as written in a file, before validation
#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    server: String,
    tsig_key_name: String,
    tsig_secret: String,
    #[serde(default)]
    tsig_algorithm: Option<String>,
    allowed_zones: Vec<String>,
    api_key_file: PathBuf,
    #[serde(default = "default_log_dir")]
    log_dir: PathBuf,
    #[serde(default = "default_application_name")]
    application_name: String,
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
}

impl TryFrom<ConfigFile> for Config {
    type Error = ConfigError;

    fn try_from(file: ConfigFile) -> Result<Self, Self::Error> {
        let server = parse_server(&file.server)?;

        let tsig_key_name =
            Name::from_ascii(qualify(file.tsig_key_name.trim())).map_err(|e| {
                ConfigError::Invalid {
                    field: "tsig_key_name",
                    reason: e.to_string(),
                }
            })?;

        let tsig_secret =
            BASE64
                .decode(file.tsig_secret.trim().as_bytes())
                .map_err(|e| ConfigError::Invalid {
                    field: "tsig_secret",
                    reason: e.to_string(),
                })?;

        let tsig_algorithm = match file.tsig_algorithm.as_deref() {
            Some(algorithm) => parse_tsig_algorithm(algorithm)?,
            None => TsigAlgorithm::HmacSha256,
        };

        let allowed_zones = file
            .allowed_zones
            .iter()
            .map(|zone| zone.trim())
            .filter(|zone| !zone.is_empty())
            .map(|zone| {
                Name::from_ascii(qualify(zone)).map_err(|e| ConfigError::Invalid {
                    field: "allowed_zones",
                    reason: format!("{zone}: {e}"),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        if allowed_zones.is_empty() {
            return Err(ConfigError::Invalid {
                field: "allowed_zones",
                reason: "at least one zone must be allowed".to_string(),
            });
        }

        let config = Self {
            server,
            tsig_key_name,
            tsig_secret,
            tsig_algorithm,
            allowed_zones,
            api_key_file: file.api_key_file,
            log_dir: file.log_dir,
            application_name: file.application_name,
            timeout: Duration::from_secs(file.timeout_secs),
        };

        debug!("loaded configuration: {config:?}");
        Ok(config)
    }
}

fn parse_server(server: &str) -> Result<SocketAddr, ConfigError> {
    let server = server.trim();
    if let Ok(addr) = server.parse::<SocketAddr>() {
        return Ok(addr);
    }

    server
        .parse::<IpAddr>()
        .map(|ip| SocketAddr::new(ip, DEFAULT_DNS_PORT))
        .map_err(|_| ConfigError::Invalid {
            field: "server",
            reason: format!("{server:?} is neither an IP address nor an IP:port pair"),
        })
}

fn parse_tsig_algorithm(algorithm: &str) -> Result<TsigAlgorithm, ConfigError> {
    match algorithm
        .trim()
        .trim_end_matches('.')
        .to_ascii_lowercase()
        .as_str()
    {
        "hmac-sha256" => Ok(TsigAlgorithm::HmacSha256),
        "hmac-sha384" => Ok(TsigAlgorithm::HmacSha384),
        "hmac-sha512" => Ok(TsigAlgorithm::HmacSha512),
        other => Err(ConfigError::Invalid {
            field: "tsig_algorithm",
            reason: format!("unsupported algorithm {other:?}"),
        }),
    }
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("./logs")
}

fn default_application_name() -> String {
    "bind-rest-api".to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Errors raised while loading the configuration or the key table
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A file could not be read
    #[error("failed to read {path:?}: {source}")]
    Io {
        /// the file being read
        path: PathBuf,
        /// the underlying error
        source: io::Error,
    },

    /// An error occurred while decoding toml data
    #[error("toml decode error: {0}")]
    TomlDecode(#[from] toml::de::Error),

    /// A required environment variable is not set
    #[error("environment variable {0} is not set")]
    Missing(&'static str),

    /// A setting is present but unusable
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// the offending setting
        field: &'static str,
        /// why it was rejected
        reason: String,
    },

    /// A line of the API key table is malformed
    #[error("{path:?} line {line}: {reason}")]
    KeyTable {
        /// the key table
        path: PathBuf,
        /// 1-based line number
        line: usize,
        /// why it was rejected
        reason: &'static str,
    },
}
