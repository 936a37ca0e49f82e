//! Sending messages to the server
//!
//! Every exchange starts on the datagram transport unless the client
//! requires the stream transport. A truncated datagram answer is escalated
//! exactly once to the stream transport. That escalation is the only retry
//! performed here; resilience retries belong to the caller.

use crate::error::{Error, Result};
use crate::traits::{DnsClient, Transport};
use crate::update::UpdateTransaction;
use hickory_proto::op::{Message, ResponseCode};
use hickory_proto::rr::Record;
use tracing::debug;

/// Outcome of a successful update exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeResult {
    /// Response code, always `NoError` for a returned result
    pub response_code: ResponseCode,
    /// Answer section of the response, as received
    pub answers: Vec<Record>,
    /// Transport that produced the response; `None` when nothing was sent
    pub transport: Option<Transport>,
}

impl ExchangeResult {
    fn skipped() -> Self {
        Self {
            response_code: ResponseCode::NoError,
            answers: Vec::new(),
            transport: None,
        }
    }

    /// Whether a message actually went out to the server
    pub fn was_sent(&self) -> bool {
        self.transport.is_some()
    }
}

/// Execute an update transaction against the client's server
///
/// An empty transaction returns immediately without any network traffic.
///
/// # Errors
///
/// - `Error::UpdateRejected` when the server answers with any response code
///   other than `NoError`
/// - `Error::Transport` when either transport attempt fails
pub async fn execute(
    transaction: &UpdateTransaction,
    client: &dyn DnsClient,
) -> Result<ExchangeResult> {
    if transaction.is_empty() {
        debug!(zone = %transaction.zone, "empty transaction, nothing to send");
        return Ok(ExchangeResult::skipped());
    }

    let request = transaction.to_message();
    let (response, transport) = exchange(client, &request).await?;

    match response.response_code() {
        ResponseCode::NoError => {
            debug!(
                zone = %transaction.zone,
                directives = transaction.len(),
                %transport,
                "update applied"
            );
            Ok(ExchangeResult {
                response_code: ResponseCode::NoError,
                answers: response.answers().to_vec(),
                transport: Some(transport),
            })
        }
        rcode => Err(Error::UpdateRejected {
            rcode,
            transaction: transaction.to_string(),
        }),
    }
}

/// Send a message with the datagram-to-stream escalation
///
/// Returns the response together with the transport that produced it.
pub(crate) async fn exchange(
    client: &dyn DnsClient,
    request: &Message,
) -> Result<(Message, Transport)> {
    if client.requires_stream() {
        let response = send_checked(client, request, Transport::Stream).await?;
        return Ok((response, Transport::Stream));
    }

    let response = send_checked(client, request, Transport::Datagram).await?;
    if !response.truncated() {
        return Ok((response, Transport::Datagram));
    }

    debug!(
        client = client.client_name(),
        id = request.id(),
        "datagram response truncated, retrying over stream"
    );
    let response = send_checked(client, request, Transport::Stream).await?;
    Ok((response, Transport::Stream))
}

async fn send_checked(
    client: &dyn DnsClient,
    request: &Message,
    transport: Transport,
) -> Result<Message> {
    let response = client.send(request, transport).await?;
    if response.id() != request.id() {
        return Err(Error::transport(
            transport,
            format!(
                "response id {} does not match request id {}",
                response.id(),
                request.id()
            ),
        ));
    }
    Ok(response)
}
