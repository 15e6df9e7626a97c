// KeyClient error types
// Read and write failures, each carrying the operation, key and datacenter

use std::fmt;

use thiserror::Error;

use crate::{ErrorDomain, KvGateError, TransportError};

/// Error codes for KeyClient failures
pub mod codes {
    pub const REMOTE_READ: &str = "CLIENT_REMOTE_READ";
    pub const REMOTE_WRITE: &str = "CLIENT_REMOTE_WRITE";
}

/// Read operations that can fail with [`KeyClientError::RemoteRead`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadOp {
    Get,
    List,
}

impl ReadOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadOp::Get => "get",
            ReadOp::List => "list",
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            ReadOp::Get => "read key",
            ReadOp::List => "list keys under prefix",
        }
    }
}

impl fmt::Display for ReadOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Write operations that can fail with [`KeyClientError::RemoteWrite`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteOp {
    Put,
    Cas,
    DeleteCas,
    Delete,
    DeleteTree,
}

impl WriteOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteOp::Put => "put",
            WriteOp::Cas => "cas",
            WriteOp::DeleteCas => "delete-cas",
            WriteOp::Delete => "delete",
            WriteOp::DeleteTree => "delete-tree",
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            WriteOp::Put | WriteOp::Cas => "write key",
            WriteOp::DeleteCas | WriteOp::Delete => "delete key",
            WriteOp::DeleteTree => "delete keys under prefix",
        }
    }
}

impl fmt::Display for WriteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a single KeyClient operation.
///
/// Only transport or service failures end up here. A missing key and a
/// rejected compare-and-swap are regular results, not errors.
#[derive(Error, Debug, Clone)]
pub enum KeyClientError {
    #[error("failed to {} '{key}' in {datacenter}: {source}", .op.describe())]
    RemoteRead {
        op: ReadOp,
        key: String,
        datacenter: String,
        #[source]
        source: TransportError,
    },

    #[error("failed to {} '{key}' in {datacenter}: {source}", .op.describe())]
    RemoteWrite {
        op: WriteOp,
        key: String,
        datacenter: String,
        #[source]
        source: TransportError,
    },
}

/// Convenient Result type for KeyClient operations
pub type KeyClientResult<T> = Result<T, KeyClientError>;

impl KeyClientError {
    pub fn read(
        op: ReadOp,
        key: impl Into<String>,
        datacenter: impl Into<String>,
        source: TransportError,
    ) -> Self {
        KeyClientError::RemoteRead {
            op,
            key: key.into(),
            datacenter: datacenter.into(),
            source,
        }
    }

    pub fn write(
        op: WriteOp,
        key: impl Into<String>,
        datacenter: impl Into<String>,
        source: TransportError,
    ) -> Self {
        KeyClientError::RemoteWrite {
            op,
            key: key.into(),
            datacenter: datacenter.into(),
            source,
        }
    }

    /// The key or prefix the failed operation targeted
    pub fn key(&self) -> &str {
        match self {
            KeyClientError::RemoteRead { key, .. } | KeyClientError::RemoteWrite { key, .. } => key,
        }
    }

    pub fn datacenter(&self) -> &str {
        match self {
            KeyClientError::RemoteRead { datacenter, .. }
            | KeyClientError::RemoteWrite { datacenter, .. } => datacenter,
        }
    }

    /// Short name of the failed operation, e.g. `"get"` or `"delete-tree"`
    pub fn operation(&self) -> &'static str {
        match self {
            KeyClientError::RemoteRead { op, .. } => op.as_str(),
            KeyClientError::RemoteWrite { op, .. } => op.as_str(),
        }
    }

    pub fn transport_error(&self) -> &TransportError {
        match self {
            KeyClientError::RemoteRead { source, .. }
            | KeyClientError::RemoteWrite { source, .. } => source,
        }
    }

    pub fn is_read(&self) -> bool {
        matches!(self, KeyClientError::RemoteRead { .. })
    }

    pub fn is_write(&self) -> bool {
        matches!(self, KeyClientError::RemoteWrite { .. })
    }
}

impl KvGateError for KeyClientError {
    fn error_code(&self) -> &'static str {
        match self {
            KeyClientError::RemoteRead { .. } => codes::REMOTE_READ,
            KeyClientError::RemoteWrite { .. } => codes::REMOTE_WRITE,
        }
    }

    fn domain(&self) -> ErrorDomain {
        ErrorDomain::Client
    }

    fn is_transient(&self) -> bool {
        self.transport_error().is_transient()
    }

    fn details(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({
            "operation": self.operation(),
            "key": self.key(),
            "datacenter": self.datacenter(),
            "cause": self.transport_error().error_code(),
        }))
    }
}
