//! Configuration types for the record set engine
//!
//! - [`ClientConfig`]: where and how to reach the DNS server
//! - [`RecordSetConfig`]: one declared record set
//! - [`ReconcileConfig`]: both together, loadable from JSON

use crate::error::{Error, Result};
use crate::record::{RecordKind, RecordSet, RecordSetKey, RecordValue};
use crate::traits::Transport;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default TTL of declared record sets, in seconds
pub const DEFAULT_TTL: u32 = 3600;

/// Largest TTL allowed on the wire (RFC 2181 section 8)
pub const MAX_TTL: u32 = i32::MAX as u32;

/// Top-level configuration: one server, many record sets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// DNS server to update
    pub client: ClientConfig,

    /// Record sets to reconcile
    #[serde(default)]
    pub record_sets: Vec<RecordSetConfig>,
}

impl ReconcileConfig {
    /// Parse a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.client.validate()?;
        for record_set in &self.record_sets {
            record_set.validate()?;
        }
        Ok(())
    }
}

/// DNS server connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Server host name or IP address
    pub server: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Transport to start with; `tcp` skips the datagram attempt entirely
    #[serde(default = "default_transport")]
    pub transport: Transport,

    /// Per-exchange timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ClientConfig {
    /// Create a configuration with default port, transport and timeout
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            port: default_port(),
            transport: default_transport(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Set the transport
    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Validate the client configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.trim().is_empty() {
            return Err(Error::config("DNS server cannot be empty"));
        }
        if self.port == 0 {
            return Err(Error::config("DNS server port must be > 0"));
        }
        if self.timeout_secs == 0 {
            return Err(Error::config("DNS timeout must be > 0"));
        }
        Ok(())
    }

    /// `host:port` endpoint, with IPv6 literals bracketed
    pub fn endpoint(&self) -> String {
        if self.server.contains(':') && !self.server.starts_with('[') {
            format!("[{}]:{}", self.server, self.port)
        } else {
            format!("{}:{}", self.server, self.port)
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// One declared record set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSetConfig {
    /// Fully-qualified zone, with the trailing dot
    pub zone: String,

    /// Name relative to the zone; empty for the apex
    #[serde(default)]
    pub name: String,

    /// Record type
    #[serde(rename = "type")]
    pub kind: RecordKind,

    /// Time-to-live in seconds
    #[serde(default = "default_ttl")]
    pub ttl: u32,

    /// Declared values in presentation form
    ///
    /// Addresses as literals, canonical names as absolute names, service
    /// records as `priority weight port target`.
    #[serde(default)]
    pub values: Vec<String>,
}

impl RecordSetConfig {
    /// Create a record set declaration with the default TTL
    pub fn new(zone: impl Into<String>, name: impl Into<String>, kind: RecordKind) -> Self {
        Self {
            zone: zone.into(),
            name: name.into(),
            kind,
            ttl: default_ttl(),
            values: Vec::new(),
        }
    }

    /// Set the TTL
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    /// Add a declared value
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.values.push(value.into());
        self
    }

    /// Validate the declaration
    pub fn validate(&self) -> Result<()> {
        self.desired().map(|_| ())
    }

    /// Canonical desired record set
    ///
    /// An empty string declares "no value"; it only makes sense for CNAME
    /// records, where it leads to removal of the current target.
    ///
    /// # Errors
    ///
    /// - `Error::Config` for an invalid zone, name, TTL, or too many values
    /// - `Error::Encoding` for a value that is not valid for the kind
    pub fn desired(&self) -> Result<RecordSet> {
        let key = RecordSetKey::new(&self.zone, &self.name)?;
        if self.ttl > MAX_TTL {
            return Err(Error::config(format!(
                "TTL {} of {} exceeds {MAX_TTL}",
                self.ttl,
                key.identity()
            )));
        }

        let codec = self.kind.codec();
        let values = self
            .values
            .iter()
            .filter(|literal| !literal.trim().is_empty())
            .map(|literal| codec.canonicalize(literal))
            .collect::<Result<Vec<RecordValue>>>()?;

        let set = RecordSet::new(key, self.kind, self.ttl, values);
        if self.kind.is_single_valued() && set.values.len() > 1 {
            return Err(Error::config(format!(
                "{} record {} accepts a single value, got {}",
                self.kind,
                set.key.identity(),
                set.values.len()
            )));
        }
        Ok(set)
    }
}

fn default_port() -> u16 {
    53
}

fn default_transport() -> Transport {
    Transport::Datagram
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_ttl() -> u32 {
    DEFAULT_TTL
}
