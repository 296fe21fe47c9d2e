// Copyright 2026 The bind-rest-api Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! API key table, mapping secrets to the identity used in audit entries

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::config::ConfigError;
use crate::error::{ErrorKind, Result};

/// Secrets accepted by the API and the identity each one stands for
///
/// The table is read once at startup and never changes afterwards. Each line of the file is
/// `identity,secret`; the line is split on the first comma only, so secrets may contain commas.
/// Blank lines and lines starting with `#` are ignored.
#[derive(Clone, Default)]
pub struct KeyStore {
    identities: HashMap<String, String>,
}

impl KeyStore {
    /// Reads the key table stored at `path`
    pub fn read(path: &Path) -> std::result::Result<Self, ConfigError> {
        let table = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&table, path)
    }

    /// Parses a key table, `path` is only used in error messages
    pub fn parse(table: &str, path: &Path) -> std::result::Result<Self, ConfigError> {
        let mut identities = HashMap::new();

        for (idx, line) in table.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let invalid = |reason| ConfigError::KeyTable {
                path: path.to_path_buf(),
                line: idx + 1,
                reason,
            };

            let (identity, secret) = line
                .split_once(',')
                .ok_or_else(|| invalid("expected `identity,secret`"))?;
            let (identity, secret) = (identity.trim(), secret.trim());
            if identity.is_empty() {
                return Err(invalid("empty identity"));
            }
            if secret.is_empty() {
                return Err(invalid("empty secret"));
            }

            if let Some(previous) = identities.insert(secret.to_string(), identity.to_string()) {
                warn!(
                    "{path:?} line {}: secret of {previous} reused by {identity}, keeping {identity}",
                    idx + 1
                );
            }
        }

        debug!("loaded {} api keys from {path:?}", identities.len());
        Ok(Self { identities })
    }

    /// Returns the identity bound to `token`
    ///
    /// A missing token and an unknown token fail identically.
    pub fn authorize(&self, token: Option<&str>) -> Result<&str> {
        token
            .and_then(|token| self.identities.get(token))
            .map(String::as_str)
            .ok_or_else(|| ErrorKind::InvalidApiKey.into())
    }

    /// Number of accepted secrets
    pub fn len(&self) -> usize {
        self.identities.len()
    }

    /// True if no secret is accepted at all
    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}

impl<I, S> FromIterator<(I, S)> for KeyStore
where
    I: Into<String>,
    S: Into<String>,
{
    /// Builds a table from `(identity, secret)` pairs
    fn from_iter<T: IntoIterator<Item = (I, S)>>(iter: T) -> Self {
        Self {
            identities: iter
                .into_iter()
                .map(|(identity, secret)| (secret.into(), identity.into()))
                .collect(),
        }
    }
}
