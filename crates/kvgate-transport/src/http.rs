//! HTTP transport for a Consul-style KV API.
//!
//! Every call maps onto one request against `/v1/kv/<key>`:
//!
//! | Call          | Request                          | Answer                        |
//! |---------------|----------------------------------|-------------------------------|
//! | `get`         | `GET ?dc=`                       | 200 JSON array, 404 absent    |
//! | `list`        | `GET ?recurse=`                  | 200 JSON array, 404 empty     |
//! | `put`         | `PUT ?flags=`, raw value body    | 200                           |
//! | `cas`         | `PUT ?flags=&cas=`               | 200 `true` / `false`          |
//! | `delete_cas`  | `DELETE ?cas=`                   | 200 `true` / `false`          |
//! | `delete`      | `DELETE`                         | 200                           |
//! | `delete_tree` | `DELETE ?recurse=`               | 200                           |
//!
//! Any other status is reported as [`TransportError::Status`].

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client as HttpClient, Method, Response, StatusCode};
use tracing::trace;
use url::Url;

use kvgate_error::{TransportError, TransportResult};
use kvgate_types::{KeyValueEntry, QueryMeta, ReadOptions, WriteMeta, WriteOptions};

use crate::keys::{check_segments, relative_key, write_key};
use crate::KvTransport;

const TOKEN_HEADER: &str = "X-Consul-Token";
const INDEX_HEADER: &str = "X-Consul-Index";
const KNOWN_LEADER_HEADER: &str = "X-Consul-KnownLeader";
const LAST_CONTACT_HEADER: &str = "X-Consul-LastContact";

const KV_ENDPOINT: [&str; 2] = ["v1", "kv"];

//-----------------------------------------------------------------------------
// Configuration
//-----------------------------------------------------------------------------

/// HTTP basic auth credentials sent with every request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpBasicAuth {
    pub username: String,
    pub password: Option<String>,
}

impl HttpBasicAuth {
    /// Parse `user` or `user:password`
    pub fn parse(raw: &str) -> TransportResult<Self> {
        let (username, password) = match raw.split_once(':') {
            Some((username, password)) => (username, Some(password.to_string())),
            None => (raw, None),
        };
        if username.is_empty() {
            return Err(TransportError::invalid_request("http auth username is empty"));
        }
        Ok(Self {
            username: username.to_string(),
            password,
        })
    }
}

/// Connection settings for [`HttpTransport`]
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// `host:port` of the agent, optionally followed by a path prefix
    pub address: String,
    /// `http` or `https`
    pub scheme: String,
    pub http_auth: Option<HttpBasicAuth>,
    /// Skip TLS certificate verification
    pub insecure_https: bool,
    /// Extra PEM-encoded root certificate to trust
    pub ca_pem: Option<Vec<u8>>,
    /// Whole-request timeout handed to the HTTP client
    pub timeout: Option<Duration>,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:8500".to_string(),
            scheme: "http".to_string(),
            http_auth: None,
            insecure_https: false,
            ca_pem: None,
            timeout: None,
        }
    }
}

impl HttpTransportConfig {
    pub fn base_url(&self) -> TransportResult<Url> {
        match self.scheme.as_str() {
            "http" | "https" => {}
            other => {
                return Err(TransportError::invalid_request(format!(
                    "unsupported scheme '{}'",
                    other
                )))
            }
        }
        Url::parse(&format!("{}://{}", self.scheme, self.address)).map_err(|e| {
            TransportError::invalid_request(format!("invalid address '{}': {}", self.address, e))
        })
    }
}

//-----------------------------------------------------------------------------
// HTTP Transport
//-----------------------------------------------------------------------------

/// KV transport talking to a store agent over HTTP
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// HTTP client for API calls
    http_client: HttpClient,

    /// Agent address; `/v1/kv/...` is appended to its path
    base_url: Url,

    http_auth: Option<HttpBasicAuth>,
}

impl HttpTransport {
    /// Create a transport with its own HTTP client
    pub fn new(config: &HttpTransportConfig) -> TransportResult<Self> {
        let base_url = config.base_url()?;

        let mut builder = HttpClient::builder().danger_accept_invalid_certs(config.insecure_https);
        if let Some(pem) = &config.ca_pem {
            let cert = reqwest::Certificate::from_pem(pem).map_err(|e| {
                TransportError::invalid_request(format!("invalid CA certificate: {}", e))
            })?;
            builder = builder.add_root_certificate(cert);
        }
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| TransportError::http(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url,
            http_auth: config.http_auth.clone(),
        })
    }

    /// Create a transport on top of an existing HTTP client
    pub fn with_client(http_client: HttpClient, base_url: Url) -> Self {
        Self {
            http_client,
            base_url,
            http_auth: None,
        }
    }

    pub fn with_basic_auth(mut self, auth: HttpBasicAuth) -> Self {
        self.http_auth = Some(auth);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn kv_url(&self, key: &str, params: Vec<(&'static str, String)>) -> TransportResult<Url> {
        // PathSegmentsMut drops dot segments instead of encoding them
        check_segments(key)?;
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                TransportError::invalid_request(format!(
                    "base URL '{}' cannot carry a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(KV_ENDPOINT)
            .extend(key.split('/'));
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url)
    }

    fn read_url(&self, key: &str, opts: &ReadOptions, recurse: bool) -> TransportResult<Url> {
        let mut params = scope_params(&opts.datacenter, &opts.namespace, &opts.partition);
        if let Some(flag) = opts.consistency.query_flag() {
            params.push((flag, String::new()));
        }
        if recurse {
            params.push(("recurse", String::new()));
        }
        self.kv_url(relative_key(key)?, params)
    }

    fn write_url(
        &self,
        key: &str,
        opts: &WriteOptions,
        extra: Vec<(&'static str, String)>,
    ) -> TransportResult<Url> {
        let mut params = scope_params(&opts.datacenter, &opts.namespace, &opts.partition);
        params.extend(extra);
        self.kv_url(key, params)
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        token: Option<&str>,
        body: Option<Vec<u8>>,
    ) -> TransportResult<(Response, Duration)> {
        trace!(%method, %url, "sending KV request");

        let mut request = self.http_client.request(method, url);
        if let Some(token) = token {
            request = request.header(TOKEN_HEADER, token);
        }
        if let Some(auth) = &self.http_auth {
            request = request.basic_auth(&auth.username, auth.password.as_ref());
        }
        if let Some(body) = body {
            request = request.body(body);
        }

        let started = Instant::now();
        let response = request
            .send()
            .await
            .map_err(|e| TransportError::http(e.to_string()))?;
        let elapsed = started.elapsed();

        trace!(status = %response.status(), elapsed_ms = elapsed.as_millis() as u64, "received KV response");
        Ok((response, elapsed))
    }

    async fn send_write(
        &self,
        method: Method,
        url: Url,
        opts: &WriteOptions,
        body: Option<Vec<u8>>,
    ) -> TransportResult<(Vec<u8>, WriteMeta)> {
        let (response, request_time) = self.send(method, url, opts.token.as_deref(), body).await?;
        if response.status() != StatusCode::OK {
            return Err(unexpected_status(response).await);
        }
        let body = read_body(response).await?;
        Ok((body, WriteMeta { request_time }))
    }
}

#[async_trait]
impl KvTransport for HttpTransport {
    async fn get(
        &self,
        key: &str,
        opts: &ReadOptions,
    ) -> TransportResult<(Option<KeyValueEntry>, QueryMeta)> {
        let url = self.read_url(key, opts, false)?;
        let (response, elapsed) = self.send(Method::GET, url, opts.token.as_deref(), None).await?;
        let meta = query_meta(response.headers(), elapsed);

        match response.status() {
            StatusCode::OK => {
                let entries = decode_entries(&read_body(response).await?)?;
                Ok((entries.into_iter().next(), meta))
            }
            StatusCode::NOT_FOUND => Ok((None, meta)),
            _ => Err(unexpected_status(response).await),
        }
    }

    async fn list(
        &self,
        prefix: &str,
        opts: &ReadOptions,
    ) -> TransportResult<(Vec<KeyValueEntry>, QueryMeta)> {
        let url = self.read_url(prefix, opts, true)?;
        let (response, elapsed) = self.send(Method::GET, url, opts.token.as_deref(), None).await?;
        let meta = query_meta(response.headers(), elapsed);

        match response.status() {
            StatusCode::OK => Ok((decode_entries(&read_body(response).await?)?, meta)),
            StatusCode::NOT_FOUND => Ok((Vec::new(), meta)),
            _ => Err(unexpected_status(response).await),
        }
    }

    async fn put(&self, entry: &KeyValueEntry, opts: &WriteOptions) -> TransportResult<WriteMeta> {
        let url = self.write_url(write_key(&entry.key)?, opts, flag_params(entry.flags))?;
        let (_, meta) = self
            .send_write(Method::PUT, url, opts, Some(entry.value_bytes().to_vec()))
            .await?;
        Ok(meta)
    }

    async fn cas(
        &self,
        entry: &KeyValueEntry,
        opts: &WriteOptions,
    ) -> TransportResult<(bool, WriteMeta)> {
        let key = write_key(&entry.key)?;
        let mut params = flag_params(entry.flags);
        params.push(("cas", entry.modify_index.to_string()));
        let url = self.write_url(key, opts, params)?;
        let (body, meta) = self
            .send_write(Method::PUT, url, opts, Some(entry.value_bytes().to_vec()))
            .await?;
        Ok((parse_bool_body(&body)?, meta))
    }

    async fn delete_cas(
        &self,
        entry: &KeyValueEntry,
        opts: &WriteOptions,
    ) -> TransportResult<(bool, WriteMeta)> {
        let params = vec![("cas", entry.modify_index.to_string())];
        let url = self.write_url(relative_key(&entry.key)?, opts, params)?;
        let (body, meta) = self.send_write(Method::DELETE, url, opts, None).await?;
        Ok((parse_bool_body(&body)?, meta))
    }

    async fn delete(&self, key: &str, opts: &WriteOptions) -> TransportResult<WriteMeta> {
        let url = self.write_url(relative_key(key)?, opts, Vec::new())?;
        let (_, meta) = self.send_write(Method::DELETE, url, opts, None).await?;
        Ok(meta)
    }

    async fn delete_tree(&self, prefix: &str, opts: &WriteOptions) -> TransportResult<WriteMeta> {
        let params = vec![("recurse", String::new())];
        let url = self.write_url(relative_key(prefix)?, opts, params)?;
        let (_, meta) = self.send_write(Method::DELETE, url, opts, None).await?;
        Ok(meta)
    }
}

//-----------------------------------------------------------------------------
// Helpers
//-----------------------------------------------------------------------------

fn scope_params(
    datacenter: &Option<String>,
    namespace: &Option<String>,
    partition: &Option<String>,
) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if let Some(dc) = datacenter {
        params.push(("dc", dc.clone()));
    }
    if let Some(ns) = namespace {
        params.push(("ns", ns.clone()));
    }
    if let Some(partition) = partition {
        params.push(("partition", partition.clone()));
    }
    params
}

fn flag_params(flags: u64) -> Vec<(&'static str, String)> {
    if flags == 0 {
        Vec::new()
    } else {
        vec![("flags", flags.to_string())]
    }
}

async fn read_body(response: Response) -> TransportResult<Vec<u8>> {
    response
        .bytes()
        .await
        .map(|body| body.to_vec())
        .map_err(|e| TransportError::http(format!("failed to read response body: {}", e)))
}

async fn unexpected_status(response: Response) -> TransportError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    TransportError::status(status, body)
}

fn decode_entries(body: &[u8]) -> TransportResult<Vec<KeyValueEntry>> {
    serde_json::from_slice(body).map_err(|e| TransportError::decode(e.to_string()))
}

fn parse_bool_body(body: &[u8]) -> TransportResult<bool> {
    match String::from_utf8_lossy(body).trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(TransportError::decode(format!(
            "expected 'true' or 'false', got '{}'",
            other
        ))),
    }
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn query_meta(headers: &HeaderMap, request_time: Duration) -> QueryMeta {
    QueryMeta {
        last_index: header_value(headers, INDEX_HEADER)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0),
        known_leader: header_value(headers, KNOWN_LEADER_HEADER) == Some("true"),
        last_contact_ms: header_value(headers, LAST_CONTACT_HEADER)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0),
        request_time,
    }
}
