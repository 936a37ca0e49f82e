//! Record model
//!
//! A record set is identified by its zone and relative name, holds values of
//! a single [`RecordKind`], and carries one reconciled TTL.
//!
//! Values are always kept in canonical form (see [`codec`]) so that equality
//! between declared and observed values does not depend on how the literal
//! was written or how the server formats its answers.

pub mod codec;
pub mod ordering;

use crate::error::{Error, Result};
use hickory_proto::rr::{Name, RecordType};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::net::IpAddr;

pub use codec::{AddressCodec, CanonicalNameCodec, RecordCodec, ServiceCodec};
pub use ordering::{AddressOrdering, NameOrdering, ServiceOrdering, ValueOrdering};

/// Unordered set of canonical values, the unit the differ works on
pub type ValueSet = HashSet<RecordValue>;

/// Record types managed by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordKind {
    /// IPv4 address records
    A,
    /// IPv6 address records
    Aaaa,
    /// Canonical name record (single-valued)
    Cname,
    /// Service records
    Srv,
}

impl RecordKind {
    /// Wire record type
    pub fn record_type(self) -> RecordType {
        match self {
            RecordKind::A => RecordType::A,
            RecordKind::Aaaa => RecordType::AAAA,
            RecordKind::Cname => RecordType::CNAME,
            RecordKind::Srv => RecordType::SRV,
        }
    }

    /// Whether a record set of this kind holds at most one value
    pub fn is_single_valued(self) -> bool {
        matches!(self, RecordKind::Cname)
    }

    /// Codec translating values of this kind to and from the wire
    pub fn codec(self) -> &'static dyn RecordCodec {
        match self {
            RecordKind::A => &codec::IPV4_CODEC,
            RecordKind::Aaaa => &codec::IPV6_CODEC,
            RecordKind::Cname => &CanonicalNameCodec,
            RecordKind::Srv => &ServiceCodec,
        }
    }

    /// Presentation ordering for values of this kind
    pub fn ordering(self) -> &'static dyn ValueOrdering {
        match self {
            RecordKind::A | RecordKind::Aaaa => &AddressOrdering,
            RecordKind::Cname => &NameOrdering,
            RecordKind::Srv => &ServiceOrdering,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.record_type())
    }
}

/// Service record tuple
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceTarget {
    pub priority: u16,
    pub weight: u16,
    pub port: u16,
    pub target: Name,
}

impl ServiceTarget {
    /// Create a service tuple, validating the target name
    pub fn new(priority: u16, weight: u16, port: u16, target: &str) -> Result<Self> {
        Ok(Self {
            priority,
            weight,
            port,
            target: codec::parse_fqdn(target)?,
        })
    }
}

impl fmt::Display for ServiceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.priority,
            self.weight,
            self.port,
            self.target.to_ascii()
        )
    }
}

/// A canonical record value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordValue {
    /// IPv4 or IPv6 address
    Address(IpAddr),
    /// Absolute domain name
    CanonicalName(Name),
    /// Service tuple
    Service(ServiceTarget),
}

impl fmt::Display for RecordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordValue::Address(ip) => write!(f, "{ip}"),
            RecordValue::CanonicalName(name) => f.write_str(&name.to_ascii()),
            RecordValue::Service(srv) => write!(f, "{srv}"),
        }
    }
}

/// Identity of a record set: its zone and the name relative to it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordSetKey {
    zone: Name,
    name: String,
    fqdn: Name,
}

impl RecordSetKey {
    /// Build a key from a fully-qualified zone and a relative name
    ///
    /// An empty name addresses the zone apex.
    pub fn new(zone: &str, name: &str) -> Result<Self> {
        if !zone.ends_with('.') {
            return Err(Error::config(format!(
                "zone {zone:?} must be fully qualified (end with '.')"
            )));
        }
        if name.ends_with('.') {
            return Err(Error::config(format!(
                "record name {name:?} must be relative to the zone"
            )));
        }

        let zone_name = Name::from_ascii(zone)
            .map_err(|e| Error::config(format!("invalid zone {zone:?}: {e}")))?;
        let fqdn = if name.is_empty() {
            zone_name.clone()
        } else {
            Name::from_ascii(format!("{name}.{zone}"))
                .map_err(|e| Error::config(format!("invalid record name {name:?}: {e}")))?
        };

        Ok(Self {
            zone: zone_name,
            name: name.to_string(),
            fqdn,
        })
    }

    pub fn zone(&self) -> &Name {
        &self.zone
    }

    /// Name relative to the zone, empty at the apex
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fully-qualified name used on the wire
    pub fn fqdn(&self) -> &Name {
        &self.fqdn
    }

    /// Identity string handed back to the configuration layer
    pub fn identity(&self) -> String {
        self.fqdn.to_ascii()
    }
}

/// A record set, either declared or observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSet {
    pub key: RecordSetKey,
    pub kind: RecordKind,
    pub ttl: u32,
    /// Distinct values in presentation order
    pub values: Vec<RecordValue>,
}

impl RecordSet {
    /// Create a record set; duplicate values collapse and the rest are put
    /// into the kind's presentation order
    pub fn new(
        key: RecordSetKey,
        kind: RecordKind,
        ttl: u32,
        values: impl IntoIterator<Item = RecordValue>,
    ) -> Self {
        let set: ValueSet = values.into_iter().collect();
        let mut values: Vec<RecordValue> = set.into_iter().collect();
        kind.ordering().sort(&mut values);

        Self {
            key,
            kind,
            ttl,
            values,
        }
    }

    /// Values as an unordered set, for diffing
    pub fn value_set(&self) -> ValueSet {
        self.values.iter().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
