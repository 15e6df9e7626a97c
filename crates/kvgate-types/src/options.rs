//! Read and write options bound to a client for its whole lifetime.

use serde::{Deserialize, Serialize};

/// Label used in logs and error messages when no datacenter is selected,
/// i.e. the agent's own datacenter.
pub const DEFAULT_DATACENTER_LABEL: &str = "<default>";

/// Consistency mode requested for reads
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Consistency {
    /// Leader-served reads, the store's default mode
    #[default]
    Default,
    /// Leader verifies it still holds leadership before answering
    Consistent,
    /// Any server may answer, possibly with stale data
    Stale,
}

impl Consistency {
    /// Query flag understood by the store, if the mode needs one
    pub fn query_flag(&self) -> Option<&'static str> {
        match self {
            Consistency::Default => None,
            Consistency::Consistent => Some("consistent"),
            Consistency::Stale => Some("stale"),
        }
    }
}

/// Options applied to every read
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadOptions {
    pub datacenter: Option<String>,
    #[serde(default)]
    pub consistency: Consistency,
    pub token: Option<String>,
    pub namespace: Option<String>,
    pub partition: Option<String>,
}

impl ReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_datacenter(mut self, datacenter: impl Into<String>) -> Self {
        self.datacenter = Some(datacenter.into());
        self
    }

    pub fn with_consistency(mut self, consistency: Consistency) -> Self {
        self.consistency = consistency;
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_partition(mut self, partition: impl Into<String>) -> Self {
        self.partition = Some(partition.into());
        self
    }

    pub fn datacenter_label(&self) -> &str {
        self.datacenter.as_deref().unwrap_or(DEFAULT_DATACENTER_LABEL)
    }
}

/// Options applied to every write and delete
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOptions {
    pub datacenter: Option<String>,
    pub token: Option<String>,
    pub namespace: Option<String>,
    pub partition: Option<String>,
}

impl WriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_datacenter(mut self, datacenter: impl Into<String>) -> Self {
        self.datacenter = Some(datacenter.into());
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_partition(mut self, partition: impl Into<String>) -> Self {
        self.partition = Some(partition.into());
        self
    }

    pub fn datacenter_label(&self) -> &str {
        self.datacenter.as_deref().unwrap_or(DEFAULT_DATACENTER_LABEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_datacenter_label() {
        assert_eq!(ReadOptions::new().datacenter_label(), "<default>");
        assert_eq!(ReadOptions::new().with_datacenter("dc1").datacenter_label(), "dc1");
        assert_eq!(WriteOptions::new().datacenter_label(), "<default>");
        assert_eq!(WriteOptions::new().with_datacenter("eu-west").datacenter_label(), "eu-west");
    }

    #[test]
    fn test_consistency_flags() {
        assert_eq!(Consistency::Default.query_flag(), None);
        assert_eq!(Consistency::Consistent.query_flag(), Some("consistent"));
        assert_eq!(Consistency::Stale.query_flag(), Some("stale"));

        let parsed: Consistency = serde_json::from_str("\"stale\"").unwrap();
        assert_eq!(parsed, Consistency::Stale);
    }
}
