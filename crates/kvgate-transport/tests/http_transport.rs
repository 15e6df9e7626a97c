//! Integration tests for the HTTP transport
//!
//! Each test mounts the exact request the transport is expected to send;
//! anything else gets wiremock's default 404 and fails the assertion.

use serde_json::json;
use wiremock::matchers::{body_bytes, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use kvgate_error::TransportError;
use kvgate_transport::{HttpBasicAuth, HttpTransport, KvTransport};
use kvgate_types::{Consistency, KeyValueEntry, ReadOptions, WriteOptions};

fn transport_for(server: &MockServer) -> HttpTransport {
    HttpTransport::with_client(reqwest::Client::new(), server.uri().parse().unwrap())
}

#[tokio::test]
async fn test_get_present_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/kv/app/config"))
        .and(query_param("dc", "dc1"))
        .and(header("X-Consul-Token", "secret"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Consul-Index", "17")
                .insert_header("X-Consul-KnownLeader", "true")
                .insert_header("X-Consul-LastContact", "4")
                .set_body_json(json!([{
                    "Key": "app/config",
                    "Value": "djE=",
                    "Flags": 3,
                    "CreateIndex": 12,
                    "ModifyIndex": 17,
                    "LockIndex": 0
                }])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let opts = ReadOptions::new().with_datacenter("dc1").with_token("secret");
    let (entry, meta) = transport_for(&server).get("app/config", &opts).await.unwrap();

    let entry = entry.expect("entry should be present");
    assert_eq!(entry.value_str(), "v1");
    assert_eq!(entry.flags, 3);
    assert_eq!(entry.modify_index, 17);
    assert_eq!(meta.last_index, 17);
    assert!(meta.known_leader);
    assert_eq!(meta.last_contact_ms, 4);
}

#[tokio::test]
async fn test_get_missing_key_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/kv/missing"))
        .respond_with(ResponseTemplate::new(404).insert_header("X-Consul-Index", "5"))
        .mount(&server)
        .await;

    let (entry, meta) = transport_for(&server)
        .get("missing", &ReadOptions::new())
        .await
        .unwrap();
    assert!(entry.is_none());
    assert_eq!(meta.last_index, 5);
}

#[tokio::test]
async fn test_get_permission_denied_is_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/kv/secret"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Permission denied\n"))
        .mount(&server)
        .await;

    let err = transport_for(&server)
        .get("secret", &ReadOptions::new())
        .await
        .unwrap_err();
    assert_eq!(err, TransportError::status(403, "Permission denied"));
}

#[tokio::test]
async fn test_get_consistent_read() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/kv/app/config"))
        .and(query_param("consistent", ""))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let opts = ReadOptions::new().with_consistency(Consistency::Consistent);
    let (entry, _) = transport_for(&server).get("app/config", &opts).await.unwrap();
    assert!(entry.is_none());
}

#[tokio::test]
async fn test_list_returns_entries_in_store_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/kv/app/"))
        .and(query_param("recurse", ""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"Key": "app/a", "Value": "MQ==", "Flags": 0, "CreateIndex": 4, "ModifyIndex": 4, "LockIndex": 0},
            {"Key": "app/b", "Value": null, "Flags": 9, "CreateIndex": 6, "ModifyIndex": 8, "LockIndex": 0}
        ])))
        .mount(&server)
        .await;

    let (entries, _) = transport_for(&server)
        .list("app/", &ReadOptions::new())
        .await
        .unwrap();
    let keys: Vec<&str> = entries.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys, vec!["app/a", "app/b"]);
    assert_eq!(entries[1].value, None);
    assert_eq!(entries[1].flags, 9);
}

#[tokio::test]
async fn test_list_empty_prefix_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/kv/nothing/"))
        .and(query_param("recurse", ""))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (entries, _) = transport_for(&server)
        .list("nothing/", &ReadOptions::new())
        .await
        .unwrap();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn test_list_malformed_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/kv/app/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy error</html>"))
        .mount(&server)
        .await;

    let err = transport_for(&server)
        .list("app/", &ReadOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Decode(_)));
}

#[tokio::test]
async fn test_put_sends_value_and_flags() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/kv/app/config"))
        .and(query_param("dc", "dc1"))
        .and(query_param("flags", "42"))
        .and(body_bytes(b"v1".to_vec()))
        .respond_with(ResponseTemplate::new(200).set_body_string("true"))
        .expect(1)
        .mount(&server)
        .await;

    let opts = WriteOptions::new().with_datacenter("dc1");
    transport_for(&server)
        .put(&KeyValueEntry::new("app/config", "v1", 42), &opts)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_put_with_leading_slash_is_rejected_before_sending() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = transport_for(&server)
        .put(&KeyValueEntry::new("/app/config", "v1", 0), &WriteOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::InvalidRequest(_)));
}

#[tokio::test]
async fn test_cas_reports_store_answer() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/kv/app/config"))
        .and(query_param("cas", "17"))
        .respond_with(ResponseTemplate::new(200).set_body_string("false"))
        .expect(1)
        .mount(&server)
        .await;

    let entry = KeyValueEntry::new("app/config", "v2", 0).with_modify_index(17);
    let (applied, _) = transport_for(&server)
        .cas(&entry, &WriteOptions::new())
        .await
        .unwrap();
    assert!(!applied);
}

#[tokio::test]
async fn test_cas_zero_index_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/kv/lock"))
        .and(query_param("cas", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_string("true"))
        .expect(1)
        .mount(&server)
        .await;

    let entry = KeyValueEntry::new("lock", "holder", 0);
    let (applied, _) = transport_for(&server)
        .cas(&entry, &WriteOptions::new())
        .await
        .unwrap();
    assert!(applied);
}

#[tokio::test]
async fn test_delete_cas() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/kv/app/config"))
        .and(query_param("cas", "21"))
        .respond_with(ResponseTemplate::new(200).set_body_string("true"))
        .expect(1)
        .mount(&server)
        .await;

    let entry = KeyValueEntry::key_only("app/config").with_modify_index(21);
    let (applied, _) = transport_for(&server)
        .delete_cas(&entry, &WriteOptions::new())
        .await
        .unwrap();
    assert!(applied);
}

#[tokio::test]
async fn test_delete_and_delete_tree() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/kv/app/config"))
        .respond_with(ResponseTemplate::new(200).set_body_string("true"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v1/kv/app/"))
        .and(query_param("recurse", ""))
        .and(query_param("dc", "dc2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("true"))
        .expect(1)
        .mount(&server)
        .await;

    let transport = transport_for(&server);
    transport.delete("app/config", &WriteOptions::new()).await.unwrap();
    transport
        .delete_tree("app/", &WriteOptions::new().with_datacenter("dc2"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_dot_segment_prefix_never_reaches_the_keyspace_root() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/kv/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("true"))
        .expect(0)
        .mount(&server)
        .await;

    let transport = transport_for(&server);
    for prefix in ["../", "./", "app/.."] {
        let err = transport
            .delete_tree(prefix, &WriteOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::InvalidRequest(_)), "{prefix}");
    }
    let err = transport
        .put(&KeyValueEntry::new("a/../b", "v1", 0), &WriteOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::InvalidRequest(_)));

    let received = server.received_requests().await.unwrap_or_default();
    assert!(received.is_empty());
}

#[tokio::test]
async fn test_write_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(500).set_body_string("No cluster leader"))
        .mount(&server)
        .await;

    let err = transport_for(&server)
        .delete("app/config", &WriteOptions::new())
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), Some(500));
}

#[tokio::test]
async fn test_basic_auth_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/kv/app/config"))
        .and(header("Authorization", "Basic YWRtaW46cHc="))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let transport = transport_for(&server).with_basic_auth(HttpBasicAuth::parse("admin:pw").unwrap());
    let (entry, _) = transport.get("app/config", &ReadOptions::new()).await.unwrap();
    assert!(entry.is_none());
}

#[tokio::test]
async fn test_unreachable_agent_is_http_error() {
    let transport = HttpTransport::with_client(
        reqwest::Client::new(),
        "http://127.0.0.1:1".parse().unwrap(),
    );
    let err = transport
        .get("app/config", &ReadOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Http(_)));
}
