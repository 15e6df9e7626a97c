//! Subcommands, one per key client operation.

use clap::Subcommand;
use serde_json::{json, Value};

use kvgate::{KeyClient, KeyClientResult};

/// Exit code when a compare-and-swap was rejected by the store
pub const EXIT_NOT_APPLIED: i32 = 2;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Read a single key
    Get { key: String },

    /// List every key under a prefix
    List { prefix: String },

    /// Write a key unconditionally
    Put {
        key: String,
        value: String,
        #[arg(long, default_value_t = 0)]
        flags: u64,
    },

    /// Write a key only if its modify-index matches
    Cas {
        key: String,
        value: String,
        /// Expected modify-index; 0 means the key must not exist
        #[arg(long)]
        index: u64,
        #[arg(long, default_value_t = 0)]
        flags: u64,
    },

    /// Delete a key only if its modify-index matches
    DeleteCas {
        key: String,
        #[arg(long)]
        index: u64,
    },

    /// Delete a single key
    Delete { key: String },

    /// Delete every key under a prefix
    DeleteTree { prefix: String },
}

/// Result of a subcommand: JSON for stdout plus the process exit code
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub output: Value,
    pub exit_code: i32,
}

impl Outcome {
    fn ok(output: Value) -> Self {
        Self { output, exit_code: 0 }
    }

    fn applied(applied: bool) -> Self {
        Self {
            output: json!({ "applied": applied }),
            exit_code: if applied { 0 } else { EXIT_NOT_APPLIED },
        }
    }
}

pub async fn execute(client: &KeyClient, command: &Command) -> KeyClientResult<Outcome> {
    let outcome = match command {
        Command::Get { key } => match client.get(key).await? {
            Some(stored) => Outcome::ok(json!({
                "key": key,
                "present": true,
                "value": stored.value,
                "flags": stored.flags,
                "modify_index": stored.modify_index,
            })),
            None => Outcome::ok(json!({ "key": key, "present": false })),
        },
        Command::List { prefix } => {
            let entries: Vec<Value> = client
                .get_under_prefix(prefix)
                .await?
                .iter()
                .map(|entry| {
                    json!({
                        "key": entry.key,
                        "value": entry.value_str(),
                        "flags": entry.flags,
                        "modify_index": entry.modify_index,
                    })
                })
                .collect();
            Outcome::ok(Value::Array(entries))
        }
        Command::Put { key, value, flags } => {
            client.put(key, value, *flags).await?;
            Outcome::ok(json!({ "key": key, "written": true }))
        }
        Command::Cas {
            key,
            value,
            index,
            flags,
        } => Outcome::applied(client.cas(key, value, *flags, *index).await?),
        Command::DeleteCas { key, index } => {
            Outcome::applied(client.delete_cas(key, *index).await?)
        }
        Command::Delete { key } => {
            client.delete(key).await?;
            Outcome::ok(json!({ "key": key, "deleted": true }))
        }
        Command::DeleteTree { prefix } => {
            client.delete_under_prefix(prefix).await?;
            Outcome::ok(json!({ "prefix": prefix, "deleted": true }))
        }
    };
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use kvgate::{MemoryTransport, ReadOptions, TransportError, WriteOptions};

    fn memory_client() -> (KeyClient, Arc<MemoryTransport>) {
        let store = Arc::new(MemoryTransport::new());
        let client = KeyClient::new(store.clone(), ReadOptions::new(), WriteOptions::new());
        (client, store)
    }

    fn put(key: &str, value: &str) -> Command {
        Command::Put {
            key: key.to_string(),
            value: value.to_string(),
            flags: 0,
        }
    }

    #[tokio::test]
    async fn test_get_reports_presence() {
        let (client, _) = memory_client();

        let missing = execute(&client, &Command::Get { key: "a".into() }).await.unwrap();
        assert_eq!(missing, Outcome::ok(json!({ "key": "a", "present": false })));

        execute(&client, &put("a", "hello")).await.unwrap();
        let found = execute(&client, &Command::Get { key: "a".into() }).await.unwrap();
        assert_eq!(found.output["value"], "hello");
        assert_eq!(found.output["present"], true);
    }

    #[tokio::test]
    async fn test_rejected_cas_sets_exit_code() {
        let (client, _) = memory_client();
        execute(&client, &put("a", "1")).await.unwrap();

        let outcome = execute(
            &client,
            &Command::Cas {
                key: "a".into(),
                value: "2".into(),
                index: 0,
                flags: 0,
            },
        )
        .await
        .unwrap();
        assert_eq!(outcome.output, json!({ "applied": false }));
        assert_eq!(outcome.exit_code, EXIT_NOT_APPLIED);
    }

    #[tokio::test]
    async fn test_list_and_delete_tree() {
        let (client, _) = memory_client();
        execute(&client, &put("app/a", "1")).await.unwrap();
        execute(&client, &put("app/b", "2")).await.unwrap();

        let listed = execute(&client, &Command::List { prefix: "app/".into() }).await.unwrap();
        assert_eq!(listed.output.as_array().map(Vec::len), Some(2));

        execute(&client, &Command::DeleteTree { prefix: "app/".into() }).await.unwrap();
        let listed = execute(&client, &Command::List { prefix: "app/".into() }).await.unwrap();
        assert_eq!(listed.output, json!([]));
    }

    #[tokio::test]
    async fn test_failure_surfaces_client_error() {
        let (client, store) = memory_client();
        store.inject_failure(TransportError::http("connection refused")).await;

        let err = execute(&client, &Command::Delete { key: "a".into() }).await.unwrap_err();
        assert_eq!(err.operation(), "delete");
    }
}
