// # DNS Client Trait
//
// Defines the opaque handle the engine uses to talk to a DNS server.
//
// ## Implementations
//
// - UDP/TCP sockets: `rrsync-client-net` crate
// - Scripted fakes in tests
//
// ## Usage
//
// ```rust,ignore
// use rrsync_core::{DnsClient, Transport};
//
// async fn soa(client: &dyn DnsClient, query: &Message) -> rrsync_core::Result<Message> {
//     client.send(query, Transport::Datagram).await
// }
// ```

use async_trait::async_trait;
use hickory_proto::op::Message;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Transport used for a single exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Transport {
    /// Datagram transport (UDP), the primary transport
    #[serde(rename = "udp")]
    Datagram,
    /// Stream transport (TCP), used when the datagram answer is truncated
    #[serde(rename = "tcp")]
    Stream,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Datagram => f.write_str("udp"),
            Transport::Stream => f.write_str("tcp"),
        }
    }
}

/// Handle to a configured DNS server
///
/// Update transactions and queries both travel through [`DnsClient::send`].
/// The engine never inspects or changes the client's configuration (server
/// address, timeouts); it only chooses the transport of each attempt.
///
/// # Trust Level: Untrusted
///
/// Clients are single-shot:
///
/// - ✅ Perform exactly one network exchange per `send` call
/// - ✅ Bound every exchange by their configured timeout
/// - ❌ Retry or fall back between transports (owned by the exchanger)
/// - ❌ Interpret response codes (owned by the exchanger and reader)
/// - ❌ Cache responses across calls
///
/// # Thread Safety
///
/// Implementations must be usable from independent tasks, one per record set.
#[async_trait]
pub trait DnsClient: Send + Sync {
    /// Send a message over the given transport and return the server's reply
    ///
    /// # Returns
    ///
    /// - `Ok(Message)`: The decoded response, whatever its response code
    /// - `Err(Error::Transport)`: Connection, timeout or framing failure
    async fn send(&self, request: &Message, transport: Transport) -> crate::Result<Message>;

    /// Whether every exchange must use the stream transport
    ///
    /// When `false` (the default) the datagram transport is tried first.
    fn requires_stream(&self) -> bool {
        false
    }

    /// Get the client name (for logging/debugging)
    fn client_name(&self) -> &'static str;
}

/// Helper trait for constructing DNS clients from configuration
pub trait DnsClientFactory: Send + Sync {
    /// Create a DnsClient instance from configuration
    fn create(
        &self,
        config: &crate::config::ClientConfig,
    ) -> Result<Box<dyn DnsClient>, crate::Error>;
}
