// # Network DNS Client
//
// This crate provides the UDP/TCP `DnsClient` implementation for the rrsync
// engine, built on hickory's client streams.
//
// ## Behavior
//
// - One connection per exchange (`UdpClientStream` / `TcpClientStream`),
//   closed when the exchange ends
// - Framing, id matching and timeouts are handled by hickory
// - Every exchange is bounded by the configured timeout
// - NO transport fallback (owned by the core exchanger)
// - NO retries and NO caching
//
// ### Trust Level: Untrusted (DNS Client)
//
// **Allowed Capabilities**:
// - ✅ Open connections to the configured server only
// - ✅ Drive one connection task per exchange; it ends with the exchange
//
// **Forbidden Capabilities**:
// - ❌ Long-lived background tasks
// - ❌ Interpret response codes
// - ❌ Retry or switch transports on its own

use async_trait::async_trait;
use hickory_proto::iocompat::AsyncIoTokioAsStd;
use hickory_proto::op::{Message, NoopMessageFinalizer};
use hickory_proto::tcp::TcpClientStream;
use hickory_proto::udp::UdpClientStream;
use hickory_proto::xfer::{
    DnsExchange, DnsHandle, DnsMultiplexer, DnsRequest, DnsRequestOptions, DnsRequestSender,
    FirstAnswer,
};
use hickory_proto::error::ProtoError;
use hickory_proto::TokioTime;
use rrsync_core::config::ClientConfig;
use rrsync_core::traits::{DnsClient, DnsClientFactory, Transport};
use rrsync_core::{Error, Result};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpStream, UdpSocket};

/// DNS client talking to one server over UDP and TCP
pub struct NetworkClient {
    /// `host:port` of the server
    endpoint: String,

    /// Bound on each exchange, connection setup included
    timeout: Duration,

    /// Skip the datagram transport entirely
    stream_only: bool,
}

impl NetworkClient {
    /// Create a client from validated configuration
    ///
    /// Name resolution of the server happens per exchange, so a server
    /// given by host name follows address changes.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            endpoint: config.endpoint(),
            timeout: config.timeout(),
            stream_only: config.transport == Transport::Stream,
        })
    }

    /// Override the exchange timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn resolve(&self, transport: Transport) -> Result<SocketAddr> {
        let mut addrs = tokio::net::lookup_host(&self.endpoint)
            .await
            .map_err(|e| Error::transport(transport, format!("cannot resolve {}: {e}", self.endpoint)))?;

        addrs.next().ok_or_else(|| {
            Error::transport(transport, format!("{} resolved to no address", self.endpoint))
        })
    }

    /// Run a single request over a freshly connected hickory stream
    async fn exchange_over<F, S>(&self, connect: F, request: Message, transport: Transport) -> Result<Message>
    where
        F: Future<Output = std::result::Result<S, ProtoError>> + Send + Unpin + 'static,
        S: DnsRequestSender + Send + Unpin + 'static,
    {
        let failure = |e: ProtoError| Error::transport(transport, format!("{}: {e}", self.endpoint));

        let (mut exchange, background) = DnsExchange::connect::<_, _, TokioTime>(connect)
            .await
            .map_err(failure)?;
        // Drives the connection; finishes once `exchange` is dropped
        tokio::spawn(background);

        let response = exchange
            .send(DnsRequest::new(request, DnsRequestOptions::default()))
            .first_answer()
            .await
            .map_err(failure)?;
        Ok(response.into_message())
    }
}

impl std::fmt::Debug for NetworkClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkClient")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .field("stream_only", &self.stream_only)
            .finish()
    }
}

#[async_trait]
impl DnsClient for NetworkClient {
    async fn send(&self, request: &Message, transport: Transport) -> Result<Message> {
        let server = self.resolve(transport).await?;
        tracing::debug!(
            endpoint = %self.endpoint,
            %server,
            %transport,
            id = request.id(),
            "sending DNS message"
        );

        let mut response = match transport {
            Transport::Datagram => {
                let connect = UdpClientStream::<UdpSocket>::with_timeout(server, self.timeout);
                self.exchange_over(connect, request.clone(), transport).await?
            }
            Transport::Stream => {
                let (connect, handle) =
                    TcpClientStream::<AsyncIoTokioAsStd<TcpStream>>::with_timeout(server, self.timeout);
                let multiplexer = DnsMultiplexer::with_timeout(
                    connect,
                    handle,
                    self.timeout,
                    None::<Arc<NoopMessageFinalizer>>,
                );
                self.exchange_over(multiplexer, request.clone(), transport).await?
            }
        };

        // hickory matches the reply against the id it put on the wire; report
        // it under the caller's id
        response.set_id(request.id());
        Ok(response)
    }

    fn requires_stream(&self) -> bool {
        self.stream_only
    }

    fn client_name(&self) -> &'static str {
        "network"
    }
}

/// Factory for creating network clients
pub struct NetworkClientFactory;

impl DnsClientFactory for NetworkClientFactory {
    fn create(&self, config: &ClientConfig) -> Result<Box<dyn DnsClient>> {
        Ok(Box::new(NetworkClient::new(config)?))
    }
}
