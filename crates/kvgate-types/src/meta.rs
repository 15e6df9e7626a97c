//! Response metadata reported by the transport.
//!
//! The client discards it; it is kept on the transport seam so other callers
//! of a transport can use it for blocking queries or diagnostics.

use std::time::Duration;

/// Metadata of a read response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryMeta {
    /// Raft index of the data returned (`X-Consul-Index`)
    pub last_index: u64,
    /// Whether the answering server knew of a leader (`X-Consul-KnownLeader`)
    pub known_leader: bool,
    /// Milliseconds since the answering server last heard from the leader
    pub last_contact_ms: u64,
    /// Round-trip time of the request
    pub request_time: Duration,
}

/// Metadata of a write response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteMeta {
    pub request_time: Duration,
}
