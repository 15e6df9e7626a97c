//! Decoded values handed to callers of the key client.

use serde::{Deserialize, Serialize};

/// Text value, flags and modify-index of a present key.
///
/// `StoredValue::default()` is the zero result `("", 0, 0)` callers
/// historically received for an absent key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoredValue {
    pub value: String,
    pub flags: u64,
    pub modify_index: u64,
}

impl StoredValue {
    pub fn new(value: impl Into<String>, flags: u64, modify_index: u64) -> Self {
        Self {
            value: value.into(),
            flags,
            modify_index,
        }
    }

    /// True for the zero result, which is what an absent key collapses to
    pub fn is_zero(&self) -> bool {
        self.value.is_empty() && self.flags == 0 && self.modify_index == 0
    }

    pub fn into_parts(self) -> (String, u64, u64) {
        (self.value, self.flags, self.modify_index)
    }
}
