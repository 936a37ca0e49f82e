//! Reading authoritative record set state
//!
//! A read queries the server for one name and type and turns the answer
//! section into a canonical [`RecordSet`]:
//!
//! 1. No answers (or `NXDomain`) → `Ok(None)`; the record is gone
//! 2. Every answer is decoded with the kind's codec
//! 3. A single-valued kind with several answers is an error
//! 4. The TTL is the minimum over all answers
//! 5. Values are put in presentation order

use crate::error::{Error, Result};
use crate::exchange::exchange;
use crate::record::ordering::ServiceOrdering;
use crate::record::{RecordKind, RecordSet, RecordSetKey, ServiceTarget, ValueSet};
use crate::traits::DnsClient;
use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::{Name, RecordType};
use tracing::debug;

/// Read the current state of a record set
///
/// # Returns
///
/// - `Ok(Some(RecordSet))`: The record set as the server holds it
/// - `Ok(None)`: The record set does not exist
///
/// # Errors
///
/// - `Error::Transport` if the exchange fails
/// - `Error::Decode` if an answer is not of the requested kind
/// - `Error::AmbiguousAnswer` if a single-valued kind has several answers
/// - `Error::QueryRejected` for failure response codes other than `NXDomain`
pub async fn read(
    key: &RecordSetKey,
    kind: RecordKind,
    client: &dyn DnsClient,
) -> Result<Option<RecordSet>> {
    let request = query(key.fqdn(), kind.record_type(), false);
    let (response, transport) = exchange(client, &request).await?;

    match response.response_code() {
        ResponseCode::NoError => {}
        ResponseCode::NXDomain => {
            debug!(fqdn = %key.fqdn(), %kind, "name does not exist");
            return Ok(None);
        }
        rcode => {
            return Err(Error::QueryRejected {
                name: key.identity(),
                rcode,
            });
        }
    }

    let answers = response.answers();
    if answers.is_empty() {
        debug!(fqdn = %key.fqdn(), %kind, "no answers");
        return Ok(None);
    }

    let codec = kind.codec();
    let decoded = answers
        .iter()
        .map(|record| codec.decode(record))
        .collect::<Result<Vec<_>>>()?;

    if kind.is_single_valued() && decoded.len() > 1 {
        return Err(Error::AmbiguousAnswer {
            name: key.identity(),
            kind,
            count: decoded.len(),
        });
    }

    // Servers and caches may report differing TTLs per record; the minimum
    // is stable across repeated reads.
    let ttl = decoded.iter().map(|(_, ttl)| *ttl).min().unwrap_or_default();
    let values: ValueSet = decoded.into_iter().map(|(value, _)| value).collect();

    debug!(
        fqdn = %key.fqdn(),
        %kind,
        ttl,
        values = values.len(),
        %transport,
        "read record set"
    );

    Ok(Some(RecordSet::new(key.clone(), kind, ttl, values)))
}

/// Resolve the service records published under `service`
///
/// Unlike [`read`] this asks for recursion, so it works against any
/// resolver. Answers of other types (e.g. a CNAME chain) are skipped. The
/// result is sorted by priority, weight descending, target, then port.
pub async fn lookup_services(service: &str, client: &dyn DnsClient) -> Result<Vec<ServiceTarget>> {
    let name = Name::from_ascii(service)
        .map_err(|e| Error::config(format!("invalid service name {service:?}: {e}")))?;
    let request = query(&name, RecordType::SRV, true);
    let (response, _) = exchange(client, &request).await?;

    match response.response_code() {
        ResponseCode::NoError => {}
        rcode => {
            return Err(Error::QueryRejected {
                name: service.to_string(),
                rcode,
            });
        }
    }

    let codec = RecordKind::Srv.codec();
    let mut targets = Vec::new();
    for record in response.answers() {
        if record.record_type() != RecordType::SRV {
            continue;
        }
        if let (crate::record::RecordValue::Service(target), _) = codec.decode(record)? {
            targets.push(target);
        }
    }

    ServiceOrdering.sort_targets(&mut targets);
    Ok(targets)
}

fn query(name: &Name, record_type: RecordType, recursion_desired: bool) -> Message {
    let mut message = Message::new();
    message
        .set_id(rand::random::<u16>())
        .set_message_type(MessageType::Query)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(recursion_desired);
    message.add_query(Query::query(name.clone(), record_type));
    message
}
