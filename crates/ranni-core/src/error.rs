//! Unified error types for the Ranni core.
//!
//! Framework-level and runtime-level errors live in their own crates; this
//! module holds the errors every layer shares.

use thiserror::Error;

// =============================================================================
// Decode Errors
// =============================================================================

/// Errors produced while turning an inbound frame into an [`Event`](crate::Event).
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The frame is not well-formed JSON.
    #[error("malformed frame: {0}")]
    Malformed(#[source] serde_json::Error),

    /// The frame is JSON but does not fit the event shape.
    #[error("failed to decode {kind} message event: {source}")]
    Event {
        /// The event kind that was being decoded ("group" or "private").
        kind: &'static str,
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for decode operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

// =============================================================================
// Transport Errors
// =============================================================================

/// Errors that can occur in transport operations.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {url} - {reason}")]
    ConnectionFailed {
        /// The URL that failed to connect.
        url: String,
        /// Reason for failure.
        reason: String,
    },

    /// The peer answered with a non-success HTTP status.
    #[error("HTTP {status} error: {body}")]
    HttpStatus {
        /// Status code returned by the peer.
        status: u16,
        /// Response body, if any.
        body: String,
    },

    /// The request did not complete in time.
    #[error("request timed out")]
    Timeout,

    /// Invalid configuration.
    #[error("invalid transport configuration: {0}")]
    InvalidConfig(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

// =============================================================================
// API Errors
// =============================================================================

/// Error type for calls made against the gateway's HTTP API.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The gateway reported a failure for a call whose result is required.
    #[error("API error ({retcode}): {message}")]
    Gateway { retcode: i64, message: String },
    /// The response did not contain the expected payload.
    #[error("response is missing {0}")]
    MissingData(&'static str),
    /// Failed to serialize/deserialize.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// The call is not valid for the event it was made from.
    #[error("unsupported call: {0}")]
    Unsupported(&'static str),
    /// Transport error.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for API calls.
pub type ApiResult<T> = Result<T, ApiError>;
