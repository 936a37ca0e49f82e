//! RFC2136 update transactions
//!
//! A transaction targets one zone and lists removal directives followed by
//! insertion directives. Removals always come first so that a changed value
//! is replaced in one step instead of briefly coexisting with its successor.
//!
//! ```text
//! zone example.com.
//! update delete www.example.com. 3600 A 192.0.2.1
//! update add www.example.com. 3600 A 192.0.2.2
//! ```

use crate::diff::RecordDiff;
use crate::error::Result;
use crate::record::{RecordKind, RecordValue};
use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::{DNSClass, Name, RData, Record, RecordType};
use std::fmt;

/// One directive of an update transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateEntry {
    pub fqdn: Name,
    pub ttl: u32,
    pub kind: RecordKind,
    pub value: RecordValue,
    rdata: RData,
}

impl UpdateEntry {
    /// Encode a value for the given owner name
    pub fn new(fqdn: &Name, ttl: u32, kind: RecordKind, value: RecordValue) -> Result<Self> {
        let rdata = kind.codec().encode(&value)?;
        Ok(Self {
            fqdn: fqdn.clone(),
            ttl,
            kind,
            value,
            rdata,
        })
    }

    // RFC2136 2.5.4: deleting one RR uses class NONE and TTL zero; the server
    // matches on name, type and rdata only.
    fn removal_record(&self) -> Record {
        let mut record = Record::from_rdata(self.fqdn.clone(), 0, self.rdata.clone());
        record.set_dns_class(DNSClass::NONE);
        record
    }

    fn insertion_record(&self) -> Record {
        let mut record = Record::from_rdata(self.fqdn.clone(), self.ttl, self.rdata.clone());
        record.set_dns_class(DNSClass::IN);
        record
    }
}

impl fmt::Display for UpdateEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.fqdn.to_ascii(),
            self.ttl,
            self.kind,
            self.value
        )
    }
}

/// Ordered set of update directives for one zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateTransaction {
    pub zone: Name,
    pub removals: Vec<UpdateEntry>,
    pub insertions: Vec<UpdateEntry>,
}

impl UpdateTransaction {
    /// An empty transaction is a no-op and must never reach the server
    pub fn is_empty(&self) -> bool {
        self.removals.is_empty() && self.insertions.is_empty()
    }

    /// Number of directives in the transaction
    pub fn len(&self) -> usize {
        self.removals.len() + self.insertions.len()
    }

    /// Wire message for this transaction, with a fresh random id
    pub fn to_message(&self) -> Message {
        let mut message = Message::new();
        message
            .set_id(rand::random::<u16>())
            .set_message_type(MessageType::Query)
            .set_op_code(OpCode::Update);

        // In an UPDATE message the question section holds the zone and the
        // authority section holds the update directives.
        message.add_query(Query::query(self.zone.clone(), RecordType::SOA));
        for entry in &self.removals {
            message.add_name_server(entry.removal_record());
        }
        for entry in &self.insertions {
            message.add_name_server(entry.insertion_record());
        }

        message
    }
}

impl fmt::Display for UpdateTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "zone {}", self.zone.to_ascii())?;
        for entry in &self.removals {
            write!(f, "\nupdate delete {entry}")?;
        }
        for entry in &self.insertions {
            write!(f, "\nupdate add {entry}")?;
        }
        Ok(())
    }
}

/// Render a diff into an update transaction
///
/// Removals are stamped with the currently declared `ttl` as well. Within
/// each section entries follow the kind's presentation order, so the same
/// diff always yields the same transaction text.
///
/// # Errors
///
/// Returns `Error::Encoding` if any value cannot be encoded for `kind`.
pub fn build(
    zone: &Name,
    fqdn: &Name,
    ttl: u32,
    kind: RecordKind,
    diff: &RecordDiff,
) -> Result<UpdateTransaction> {
    let entries = |values: &crate::record::ValueSet| -> Result<Vec<UpdateEntry>> {
        let mut values: Vec<RecordValue> = values.iter().cloned().collect();
        kind.ordering().sort(&mut values);
        values
            .into_iter()
            .map(|value| UpdateEntry::new(fqdn, ttl, kind, value))
            .collect()
    };

    Ok(UpdateTransaction {
        zone: zone.clone(),
        removals: entries(&diff.to_remove)?,
        insertions: entries(&diff.to_add)?,
    })
}
