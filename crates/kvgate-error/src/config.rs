// Configuration error types

use thiserror::Error;

use crate::{ErrorDomain, KvGateError};

/// Error codes for configuration failures
pub mod codes {
    pub const IO: &str = "CONFIG_IO";
    pub const PARSE: &str = "CONFIG_PARSE";
    pub const INVALID: &str = "CONFIG_INVALID";
}

/// Errors raised while loading configuration or building a client from it
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("failed to read '{path}': {message}")]
    Io { path: String, message: String },

    #[error("failed to parse configuration: {0}")]
    Parse(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Convenient Result type for configuration handling
pub type ConfigResult<T> = Result<T, ConfigError>;

impl ConfigError {
    pub fn io(path: impl Into<String>, err: &std::io::Error) -> Self {
        ConfigError::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        ConfigError::Invalid(message.into())
    }
}

impl KvGateError for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            ConfigError::Io { .. } => codes::IO,
            ConfigError::Parse(_) => codes::PARSE,
            ConfigError::Invalid(_) => codes::INVALID,
        }
    }

    fn domain(&self) -> ErrorDomain {
        ErrorDomain::Config
    }
}
