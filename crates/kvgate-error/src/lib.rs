// kvgate Error Handling
// Central location for error types, traits, and result aliases

use std::error::Error as StdError;
use std::fmt;

// Re-export for crates deriving their own errors against this one
pub use thiserror;

// Module structure
mod client;
mod config;
mod transport;

// Public exports
pub use client::{KeyClientError, KeyClientResult, ReadOp, WriteOp};
pub use config::{ConfigError, ConfigResult};
pub use transport::{TransportError, TransportResult};

/// Error domains representing the layers of the adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorDomain {
    Transport,
    Client,
    Config,
}

impl fmt::Display for ErrorDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorDomain::Transport => write!(f, "transport"),
            ErrorDomain::Client => write!(f, "client"),
            ErrorDomain::Config => write!(f, "config"),
        }
    }
}

/// Standard error message format for serialization
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ErrorMessage {
    pub code: String,
    pub domain: ErrorDomain,
    pub message: String,
    pub transient: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorMessage {
    /// Build a serializable message from any kvgate error
    pub fn from_error<E: KvGateError + ?Sized>(err: &E) -> Self {
        Self {
            code: err.error_code().to_string(),
            domain: err.domain(),
            message: err.to_string(),
            transient: err.is_transient(),
            details: err.details(),
        }
    }
}

/// Base trait for all errors raised by kvgate crates.
pub trait KvGateError: StdError + fmt::Debug + fmt::Display + Send + Sync + 'static {
    /// Returns a unique static string code for this error.
    fn error_code(&self) -> &'static str;

    /// The layer that produced the error.
    fn domain(&self) -> ErrorDomain;

    /// Indicates if the failure is temporary and a later attempt might succeed.
    ///
    /// Nothing in kvgate retries; this is for callers that want to.
    fn is_transient(&self) -> bool {
        false
    }

    /// Structured context for the error (optional).
    fn details(&self) -> Option<serde_json::Value> {
        None
    }
}
