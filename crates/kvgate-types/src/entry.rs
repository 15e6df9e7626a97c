//! Key/value records in the store's wire format.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::value::StoredValue;

/// A single record of the remote KV store.
///
/// Field names follow the store's JSON API. The value travels as standard
/// base64 and may be `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeyValueEntry {
    pub key: String,

    #[serde(with = "base64_value", default)]
    pub value: Option<Vec<u8>>,

    #[serde(default)]
    pub flags: u64,

    #[serde(default)]
    pub create_index: u64,

    /// Version stamp bumped by the store on every mutation of this key
    #[serde(default)]
    pub modify_index: u64,

    #[serde(default)]
    pub lock_index: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
}

impl KeyValueEntry {
    pub fn new(key: impl Into<String>, value: impl Into<Vec<u8>>, flags: u64) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
            flags,
            ..Default::default()
        }
    }

    /// An entry that only names a key, as used by compare-and-swap deletes
    pub fn key_only(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn with_modify_index(mut self, index: u64) -> Self {
        self.modify_index = index;
        self
    }

    pub fn value_bytes(&self) -> &[u8] {
        self.value.as_deref().unwrap_or_default()
    }

    /// The value as text; invalid UTF-8 is replaced, a missing value is empty
    pub fn value_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.value_bytes())
    }

    pub fn to_stored_value(&self) -> StoredValue {
        StoredValue {
            value: self.value_str().into_owned(),
            flags: self.flags,
            modify_index: self.modify_index,
        }
    }
}

mod base64_value {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(bytes) => serializer.serialize_str(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded: Option<String> = Option::deserialize(deserializer)?;
        encoded
            .map(|s| STANDARD.decode(s.as_bytes()).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_store_listing() {
        let body = r#"[
            {"LockIndex":0,"Key":"app/config","Flags":42,"Value":"djE=","CreateIndex":12,"ModifyIndex":17},
            {"LockIndex":1,"Key":"app/lock","Flags":0,"Value":null,"CreateIndex":20,"ModifyIndex":20,"Session":"adf4238a-882b-9ddc-4a9d-5b6758e4159e"}
        ]"#;

        let entries: Vec<KeyValueEntry> = serde_json::from_str(body).unwrap();
        assert_eq!(entries.len(), 2);

        assert_eq!(entries[0].key, "app/config");
        assert_eq!(entries[0].value.as_deref(), Some(&b"v1"[..]));
        assert_eq!(entries[0].flags, 42);
        assert_eq!(entries[0].modify_index, 17);

        assert_eq!(entries[1].value, None);
        assert_eq!(entries[1].value_str(), "");
        assert_eq!(entries[1].lock_index, 1);
        assert!(entries[1].session.is_some());
    }

    #[test]
    fn test_invalid_base64_is_rejected() {
        let body = r#"[{"Key":"k","Value":"not base64!","ModifyIndex":3}]"#;
        assert!(serde_json::from_str::<Vec<KeyValueEntry>>(body).is_err());
    }

    #[test]
    fn test_serialize_uses_store_field_names() {
        let entry = KeyValueEntry::new("a/b", "hello", 7).with_modify_index(9);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["Key"], "a/b");
        assert_eq!(json["Value"], "aGVsbG8=");
        assert_eq!(json["Flags"], 7);
        assert_eq!(json["ModifyIndex"], 9);
        assert!(json.get("Session").is_none());
    }

    #[test]
    fn test_non_utf8_value_is_replaced() {
        let entry = KeyValueEntry::new("bin", vec![0x66, 0x6f, 0xff], 0);
        assert_eq!(entry.value_str(), "fo\u{fffd}");
        assert_eq!(entry.to_stored_value().value, "fo\u{fffd}");
    }
}
