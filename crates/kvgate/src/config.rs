//! Provider configuration and per-resource scopes.
//!
//! A [`ClientConfig`] describes how to reach the store agent and which
//! datacenter, token, namespace and partition to use by default. A
//! [`ResourceScope`] carries the overrides a single resource may set. The
//! two resolve into the read/write options a [`KeyClient`] is bound to.
//!
//! Precedence, lowest first: built-in defaults, TOML file, environment
//! (`CONSUL_HTTP_ADDR` and friends), then per-resource scope.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use kvgate_error::{ConfigError, ConfigResult};
use kvgate_transport::{HttpBasicAuth, HttpTransport, HttpTransportConfig};
use kvgate_types::{Consistency, ReadOptions, WriteOptions};

use crate::client::KeyClient;

pub const ENV_HTTP_ADDR: &str = "CONSUL_HTTP_ADDR";
pub const ENV_HTTP_TOKEN: &str = "CONSUL_HTTP_TOKEN";
pub const ENV_HTTP_AUTH: &str = "CONSUL_HTTP_AUTH";
pub const ENV_HTTP_SSL: &str = "CONSUL_HTTP_SSL";
pub const ENV_HTTP_SSL_VERIFY: &str = "CONSUL_HTTP_SSL_VERIFY";
pub const ENV_CACERT: &str = "CONSUL_CACERT";
pub const ENV_NAMESPACE: &str = "CONSUL_NAMESPACE";
pub const ENV_PARTITION: &str = "CONSUL_PARTITION";

//-----------------------------------------------------------------------------
// Client Configuration
//-----------------------------------------------------------------------------

/// Connection and default scope settings of the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// `host:port` of the agent
    pub address: String,
    /// `http` or `https`
    pub scheme: String,
    pub datacenter: Option<String>,
    pub token: Option<String>,
    pub namespace: Option<String>,
    pub partition: Option<String>,
    /// `user` or `user:password`
    pub http_auth: Option<String>,
    pub insecure_https: bool,
    /// PEM file with an extra root certificate
    pub ca_file: Option<PathBuf>,
    pub consistency: Consistency,
    pub timeout_secs: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:8500".to_string(),
            scheme: "http".to_string(),
            datacenter: None,
            token: None,
            namespace: None,
            partition: None,
            http_auth: None,
            insecure_https: false,
            ca_file: None,
            consistency: Consistency::Default,
            timeout_secs: None,
        }
    }
}

impl ClientConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load configuration from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::io(path.display().to_string(), &e))?;
        Self::from_toml_str(&content)
    }

    /// Apply the `CONSUL_*` environment variables on top of this configuration
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides using `lookup` in place of the process environment
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|value| !value.is_empty());

        if let Some(addr) = lookup(ENV_HTTP_ADDR) {
            if let Some(rest) = addr.strip_prefix("https://") {
                self.scheme = "https".to_string();
                self.address = rest.to_string();
            } else if let Some(rest) = addr.strip_prefix("http://") {
                self.scheme = "http".to_string();
                self.address = rest.to_string();
            } else {
                self.address = addr;
            }
        }
        if let Some(token) = lookup(ENV_HTTP_TOKEN) {
            self.token = Some(token);
        }
        if let Some(auth) = lookup(ENV_HTTP_AUTH) {
            self.http_auth = Some(auth);
        }
        if let Some(raw) = lookup(ENV_HTTP_SSL) {
            match parse_bool(&raw) {
                Some(true) => self.scheme = "https".to_string(),
                Some(false) => {}
                None => warn!(variable = ENV_HTTP_SSL, value = %raw, "Ignoring unparseable boolean"),
            }
        }
        if let Some(raw) = lookup(ENV_HTTP_SSL_VERIFY) {
            match parse_bool(&raw) {
                Some(verify) => self.insecure_https = !verify,
                None => warn!(variable = ENV_HTTP_SSL_VERIFY, value = %raw, "Ignoring unparseable boolean"),
            }
        }
        if let Some(ca_file) = lookup(ENV_CACERT) {
            self.ca_file = Some(PathBuf::from(ca_file));
        }
        if let Some(namespace) = lookup(ENV_NAMESPACE) {
            self.namespace = Some(namespace);
        }
        if let Some(partition) = lookup(ENV_PARTITION) {
            self.partition = Some(partition);
        }
        self
    }

    /// Check the settings that can be checked without touching the network
    pub fn validate(&self) -> ConfigResult<()> {
        if self.address.trim().is_empty() {
            return Err(ConfigError::invalid("address must not be empty"));
        }
        if self.scheme != "http" && self.scheme != "https" {
            return Err(ConfigError::invalid(format!(
                "scheme must be 'http' or 'https', got '{}'",
                self.scheme
            )));
        }
        if let Some(auth) = &self.http_auth {
            HttpBasicAuth::parse(auth).map_err(|e| ConfigError::invalid(e.to_string()))?;
        }
        if self.timeout_secs == Some(0) {
            return Err(ConfigError::invalid("timeout_secs must be greater than zero"));
        }
        Ok(())
    }

    /// Resolve the read and write options for one resource
    pub fn options_for(&self, scope: &ResourceScope) -> (ReadOptions, WriteOptions) {
        let datacenter = pick(&scope.datacenter, &self.datacenter);
        let token = pick(&scope.token, &self.token);
        let namespace = pick(&scope.namespace, &self.namespace);
        let partition = pick(&scope.partition, &self.partition);

        let read = ReadOptions {
            datacenter: datacenter.clone(),
            consistency: self.consistency,
            token: token.clone(),
            namespace: namespace.clone(),
            partition: partition.clone(),
        };
        let write = WriteOptions {
            datacenter,
            token,
            namespace,
            partition,
        };
        (read, write)
    }

    /// Settings for the HTTP transport, reading the CA file if one is set
    pub fn transport_config(&self) -> ConfigResult<HttpTransportConfig> {
        self.validate()?;

        let http_auth = self
            .http_auth
            .as_deref()
            .map(HttpBasicAuth::parse)
            .transpose()
            .map_err(|e| ConfigError::invalid(e.to_string()))?;
        let ca_pem = match &self.ca_file {
            Some(path) => Some(
                std::fs::read(path).map_err(|e| ConfigError::io(path.display().to_string(), &e))?,
            ),
            None => None,
        };

        Ok(HttpTransportConfig {
            address: self.address.clone(),
            scheme: self.scheme.clone(),
            http_auth,
            insecure_https: self.insecure_https,
            ca_pem,
            timeout: self.timeout_secs.map(Duration::from_secs),
        })
    }

    pub fn http_transport(&self) -> ConfigResult<HttpTransport> {
        HttpTransport::new(&self.transport_config()?).map_err(|e| ConfigError::invalid(e.to_string()))
    }

    /// Build a key client for one resource over a fresh HTTP transport
    pub fn key_client(&self, scope: &ResourceScope) -> ConfigResult<KeyClient> {
        let transport = Arc::new(self.http_transport()?);
        let (read, write) = self.options_for(scope);
        Ok(KeyClient::new(transport, read, write))
    }
}

//-----------------------------------------------------------------------------
// Resource Scope
//-----------------------------------------------------------------------------

/// Per-resource overrides of the provider defaults.
///
/// Empty strings count as unset, matching how resource attributes arrive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceScope {
    pub datacenter: Option<String>,
    pub token: Option<String>,
    pub namespace: Option<String>,
    pub partition: Option<String>,
}

impl ResourceScope {
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
}

fn pick(preferred: &Option<String>, fallback: &Option<String>) -> Option<String> {
    let non_empty = |value: &Option<String>| value.clone().filter(|v| !v.is_empty());
    non_empty(preferred).or_else(|| non_empty(fallback))
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}
