//! Error types for the record set engine
//!
//! Every failure is a structured value carrying the context needed to
//! diagnose it (offending value, transaction text, response code). Text is
//! only produced through `Display`, at the presentation boundary.

use crate::record::RecordKind;
use crate::traits::Transport;
use hickory_proto::op::ResponseCode;
use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the record set engine
#[derive(Error, Debug)]
pub enum Error {
    /// A value could not be rendered into a valid resource record
    #[error("cannot encode record value {value:?}: {reason}")]
    Encoding {
        /// The offending value, as declared
        value: String,
        /// Why it was rejected
        reason: String,
    },

    /// A server answer could not be decoded into a canonical value
    #[error("cannot decode answer `{record}`: {reason}")]
    Decode {
        /// The answer record as received
        record: String,
        /// Why it was rejected
        reason: String,
    },

    /// A single-valued record type received more than one answer
    #[error("{kind} record {name} has {count} answers, expected at most one")]
    AmbiguousAnswer {
        /// Fully-qualified name that was queried
        name: String,
        /// Record kind that was queried
        kind: RecordKind,
        /// Number of answers received
        count: usize,
    },

    /// Connection, timeout or framing failure
    #[error("{transport} transport failure: {reason}")]
    Transport {
        /// Transport the failing attempt used
        transport: Transport,
        /// Failure description
        reason: String,
    },

    /// The server refused an update transaction
    #[error("update rejected with {rcode}:\n{transaction}")]
    UpdateRejected {
        /// Response code returned by the server
        rcode: ResponseCode,
        /// The rejected transaction, rendered as update directives
        transaction: String,
    },

    /// The server answered a query with a failure response code
    #[error("query for {name} failed with {rcode}")]
    QueryRejected {
        /// Fully-qualified name that was queried
        name: String,
        /// Response code returned by the server
        rcode: ResponseCode,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an encoding error
    pub fn encoding(value: impl Into<String>, reason: impl ToString) -> Self {
        Self::Encoding {
            value: value.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a decode error
    pub fn decode(record: impl ToString, reason: impl ToString) -> Self {
        Self::Decode {
            record: record.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a transport error
    pub fn transport(transport: Transport, reason: impl ToString) -> Self {
        Self::Transport {
            transport,
            reason: reason.to_string(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the failure confirms that server state diverged from the
    /// stored identity, so the caller may forget that identity.
    ///
    /// Transport failures leave the outcome unknown: the server may or may
    /// not have applied the transaction, so identity must be kept and the
    /// state re-read on the next reconciliation.
    pub fn clears_identity(&self) -> bool {
        matches!(self, Self::UpdateRejected { .. })
    }

    /// Response code carried by the error, if the server produced one
    pub fn response_code(&self) -> Option<ResponseCode> {
        match self {
            Self::UpdateRejected { rcode, .. } | Self::QueryRejected { rcode, .. } => Some(*rcode),
            _ => None,
        }
    }
}
