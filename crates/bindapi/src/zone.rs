// Copyright 2026 The bind-rest-api Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Name qualification and the zone allow-list

use std::fmt;
use std::sync::Arc;

use hickory_proto::rr::Name;

use crate::error::{ErrorKind, Result};
use crate::update::UpdateTransaction;

/// A caller supplied name that ends with the root separator
///
/// Only [`qualify`] creates these, so every name reaching the allow-list or the protocol layer has
/// been qualified first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName(String);

impl QualifiedName {
    /// The qualified name as text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn to_name(&self) -> Option<Name> {
        Name::from_ascii(&self.0).ok()
    }
}

impl AsRef<str> for QualifiedName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Appends the trailing `.` to `name` if it is missing
///
/// `qualify(qualify(x).as_str()) == qualify(x)` for every input.
pub fn qualify(name: &str) -> QualifiedName {
    if name.ends_with('.') {
        QualifiedName(name.to_string())
    } else {
        QualifiedName(format!("{name}."))
    }
}

/// Outcome of a successful validation, the only input of the downstream steps
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// The requested name
    pub domain: Name,
    /// The allow-listed zone the name falls under
    pub zone: Name,
    /// An empty update bound to `zone`, present for mutations only
    pub transaction: Option<UpdateTransaction>,
}

/// Matches names against the allowed zones
///
/// Zones are scanned in configured order and the first zone containing the name wins. Matching
/// works on whole labels and ignores case, `badexample.org.` is not under `example.org.`.
/// Overlapping entries (`b.example.org.` and `example.org.`) are resolved by that order only.
#[derive(Debug, Clone)]
pub struct ZoneValidator {
    zones: Arc<[Name]>,
}

impl ZoneValidator {
    /// Creates a validator over `zones`, keeping their order
    pub fn new(zones: impl IntoIterator<Item = Name>) -> Self {
        Self {
            zones: zones.into_iter().collect(),
        }
    }

    /// The allowed zones, in match order
    pub fn zones(&self) -> &[Name] {
        &self.zones
    }

    /// Validates the target of a record lookup
    pub fn for_lookup(&self, domain: &QualifiedName) -> Result<ValidationResult> {
        self.containing(domain)
            .map(|(domain, zone)| ValidationResult {
                domain,
                zone,
                transaction: None,
            })
            .ok_or_else(|| ErrorKind::DomainNotPermitted(domain.to_string()).into())
    }

    /// Validates the target of a mutation and binds a new transaction to its zone
    pub fn for_update(&self, domain: &QualifiedName) -> Result<ValidationResult> {
        self.containing(domain)
            .map(|(domain, zone)| ValidationResult {
                transaction: Some(UpdateTransaction::new(zone.clone())),
                domain,
                zone,
            })
            .ok_or_else(|| ErrorKind::DomainZoneNotPermitted(domain.to_string()).into())
    }

    /// Validates a zone transfer request, `zone` must be listed as is
    pub fn for_transfer(&self, zone: &QualifiedName) -> Result<ValidationResult> {
        zone.to_name()
            .and_then(|name| self.zones.iter().find(|allowed| **allowed == name).cloned())
            .map(|zone| ValidationResult {
                domain: zone.clone(),
                zone,
                transaction: None,
            })
            .ok_or_else(|| ErrorKind::ZoneNotPermitted(zone.to_string()).into())
    }

    fn containing(&self, domain: &QualifiedName) -> Option<(Name, Name)> {
        let domain = domain.to_name()?;
        let zone = self.zones.iter().find(|zone| zone.zone_of(&domain))?;
        Some((domain, zone.clone()))
    }
}
