// Transport error types
// Failures talking to the remote KV service

use thiserror::Error;

use crate::{ErrorDomain, KvGateError};

/// Error codes for transport failures
pub mod codes {
    pub const HTTP: &str = "TRANSPORT_HTTP";
    pub const STATUS: &str = "TRANSPORT_STATUS";
    pub const DECODE: &str = "TRANSPORT_DECODE";
    pub const INVALID_REQUEST: &str = "TRANSPORT_INVALID_REQUEST";
}

/// A failed exchange with the remote KV service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request never produced a response (connect, TLS, timeout, ...)
    #[error("http request failed: {0}")]
    Http(String),

    /// The service answered with a status the KV API does not expect
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be decoded
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The request could not be built from the given key or options
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Convenient Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

impl TransportError {
    pub fn http(message: impl Into<String>) -> Self {
        TransportError::Http(message.into())
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        TransportError::Status {
            status,
            body: body.into().trim().to_string(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        TransportError::Decode(message.into())
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        TransportError::InvalidRequest(message.into())
    }

    /// HTTP status returned by the service, if there was one
    pub fn status_code(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl KvGateError for TransportError {
    fn error_code(&self) -> &'static str {
        match self {
            TransportError::Http(_) => codes::HTTP,
            TransportError::Status { .. } => codes::STATUS,
            TransportError::Decode(_) => codes::DECODE,
            TransportError::InvalidRequest(_) => codes::INVALID_REQUEST,
        }
    }

    fn domain(&self) -> ErrorDomain {
        ErrorDomain::Transport
    }

    fn is_transient(&self) -> bool {
        match self {
            TransportError::Http(_) => true,
            TransportError::Status { status, .. } => *status >= 500 || *status == 429,
            TransportError::Decode(_) | TransportError::InvalidRequest(_) => false,
        }
    }
}
