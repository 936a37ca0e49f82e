//! Core traits for the record set engine
//!
//! - [`DnsClient`]: Exchange DNS messages with a configured server

pub mod dns_client;

pub use dns_client::{DnsClient, DnsClientFactory, Transport};
