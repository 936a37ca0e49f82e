//! Test doubles and common utilities for contract tests
//!
//! The scripted client plays back a queue of replies, one per `send`, and
//! records every request it sees so tests can assert on traffic.

#![allow(dead_code)]

use hickory_proto::op::{Message, MessageType, ResponseCode};
use hickory_proto::rr::rdata::{A, AAAA, CNAME, SRV};
use hickory_proto::rr::{Name, RData, Record};
use rrsync_core::error::{Error, Result};
use rrsync_core::traits::{DnsClient, Transport};
use rrsync_core::{RecordKind, RecordSet, RecordSetConfig};
use std::collections::VecDeque;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One scripted reply
#[derive(Debug, Clone)]
pub enum Reply {
    /// `NoError` with the given answer section
    Answers(Vec<Record>),
    /// `NoError` with the truncation flag set and no answers
    Truncated,
    /// Empty response with the given response code
    Code(ResponseCode),
    /// Transport failure
    Fail(&'static str),
    /// Response whose id does not match the request
    WrongId,
}

/// A DnsClient that replies from a script
///
/// Once the script runs out every request gets an empty `NoError` response.
pub struct ScriptedClient {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    send_count: Arc<AtomicUsize>,
    transports: Arc<Mutex<Vec<Transport>>>,
    requests: Arc<Mutex<Vec<Message>>>,
    stream_only: bool,
}

impl ScriptedClient {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into_iter().collect())),
            send_count: Arc::new(AtomicUsize::new(0)),
            transports: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            stream_only: false,
        }
    }

    /// A client that answers every request with an empty `NoError`
    pub fn empty() -> Self {
        Self::new(Vec::<Reply>::new())
    }

    /// A client that must skip the datagram transport
    pub fn stream_only(mut self) -> Self {
        self.stream_only = true;
        self
    }

    /// Create a new ScriptedClient that shares script and counters with an
    /// existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            replies: Arc::clone(&other.replies),
            send_count: Arc::clone(&other.send_count),
            transports: Arc::clone(&other.transports),
            requests: Arc::clone(&other.requests),
            stream_only: other.stream_only,
        }
    }

    /// Append replies to the script
    pub fn push(&self, replies: impl IntoIterator<Item = Reply>) {
        self.replies.lock().unwrap().extend(replies);
    }

    /// Get the number of times send() was called
    pub fn send_count(&self) -> usize {
        self.send_count.load(Ordering::SeqCst)
    }

    /// Transports used, in call order
    pub fn transports(&self) -> Vec<Transport> {
        self.transports.lock().unwrap().clone()
    }

    /// Requests received, in call order
    pub fn requests(&self) -> Vec<Message> {
        self.requests.lock().unwrap().clone()
    }

    /// Replies not consumed yet
    pub fn remaining(&self) -> usize {
        self.replies.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl DnsClient for ScriptedClient {
    async fn send(&self, request: &Message, transport: Transport) -> Result<Message> {
        self.send_count.fetch_add(1, Ordering::SeqCst);
        self.transports.lock().unwrap().push(transport);
        self.requests.lock().unwrap().push(request.clone());

        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Reply::Answers(Vec::new()));

        let mut response = response_to(request);
        match reply {
            Reply::Answers(records) => {
                for record in records {
                    response.add_answer(record);
                }
            }
            Reply::Truncated => {
                response.set_truncated(true);
            }
            Reply::Code(rcode) => {
                response.set_response_code(rcode);
            }
            Reply::Fail(reason) => return Err(Error::transport(transport, reason)),
            Reply::WrongId => {
                response.set_id(request.id().wrapping_add(1));
            }
        }
        Ok(response)
    }

    fn requires_stream(&self) -> bool {
        self.stream_only
    }

    fn client_name(&self) -> &'static str {
        "scripted"
    }
}

/// Empty `NoError` response echoing the request id
pub fn response_to(request: &Message) -> Message {
    let mut response = Message::new();
    response
        .set_id(request.id())
        .set_message_type(MessageType::Response)
        .set_op_code(request.op_code())
        .set_response_code(ResponseCode::NoError);
    response
}

pub fn name(s: &str) -> Name {
    Name::from_ascii(s).unwrap()
}

pub fn a_record(owner: &str, ttl: u32, ip: &str) -> Record {
    let ip: Ipv4Addr = ip.parse().unwrap();
    Record::from_rdata(name(owner), ttl, RData::A(A(ip)))
}

pub fn aaaa_record(owner: &str, ttl: u32, ip: &str) -> Record {
    let ip: Ipv6Addr = ip.parse().unwrap();
    Record::from_rdata(name(owner), ttl, RData::AAAA(AAAA(ip)))
}

pub fn cname_record(owner: &str, ttl: u32, target: &str) -> Record {
    Record::from_rdata(name(owner), ttl, RData::CNAME(CNAME(name(target))))
}

pub fn srv_record(owner: &str, ttl: u32, priority: u16, weight: u16, port: u16, target: &str) -> Record {
    Record::from_rdata(
        name(owner),
        ttl,
        RData::SRV(SRV::new(priority, weight, port, name(target))),
    )
}

/// Declared record set for `name` in `example.com.`
pub fn declared(name: &str, kind: RecordKind, ttl: u32, values: &[&str]) -> RecordSet {
    values
        .iter()
        .fold(
            RecordSetConfig::new("example.com.", name, kind).with_ttl(ttl),
            |config, value| config.with_value(*value),
        )
        .desired()
        .unwrap()
}

/// Update directives of a request as `(class, ttl, rdata)` text tuples
pub fn update_section(request: &Message) -> Vec<String> {
    request
        .name_servers()
        .iter()
        .map(|record| {
            let rdata = record.data().map(ToString::to_string).unwrap_or_default();
            format!("{} {} {}", record.dns_class(), record.ttl(), rdata)
        })
        .collect()
}
