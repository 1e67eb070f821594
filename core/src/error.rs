//! Error types for the partner API client.
//!
//! # Design
//! Only failures the caller can act on become errors. A reply that is not a
//! valid response envelope is *not* one of them: the dispatcher turns it into
//! a failed [`ResponseEnvelope`](crate::ResponseEnvelope) instead, so
//! [`DecodeError::Protocol`] never escapes `dispatch`.

use thiserror::Error;

/// Errors returned by `PartnerClient` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// An order line item string was malformed.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// The transport could not deliver the request or the server answered
    /// with a non-2xx status.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The request envelope could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// A registered conversion rejected the `Data` of a well-formed reply.
    #[error("decoding data for '{function}' failed: {source}")]
    DataDecode {
        function: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure reported by a [`Transport`](crate::http::Transport).
#[derive(Debug, Error)]
pub enum TransportError {
    /// The server returned a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Network or I/O failure before a status was received.
    #[error("transport failed: {0}")]
    Io(String),
}

/// A line item string did not match `<amount>x<name>`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid order item '{input}': {reason}")]
pub struct FormatError {
    pub input: String,
    pub reason: &'static str,
}

/// Why a reply could not be decoded.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The body is not JSON or lacks the envelope's top-level fields.
    #[error("invalid response: {0}")]
    Protocol(String),

    /// `Data` did not fit the shape the registered conversion expects.
    #[error("decoding data for '{function}' failed: {source}")]
    Data {
        function: String,
        #[source]
        source: serde_json::Error,
    },
}
