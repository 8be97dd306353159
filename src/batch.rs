//! Key-value pairs and write batches
//!
//! Shared by the engine, the WAL and the wire protocol.

use serde::{Deserialize, Serialize};

/// A single key-value pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl KeyValue {
    pub fn new(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Ordered sequence of puts applied atomically
///
/// When a key appears more than once, the last put wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteBatch {
    entries: Vec<KeyValue>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a put to the batch
    pub fn put(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> &mut Self {
        self.entries.push(KeyValue::new(key, value));
        self
    }

    pub fn entries(&self) -> &[KeyValue] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<KeyValue> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<KeyValue>> for WriteBatch {
    fn from(entries: Vec<KeyValue>) -> Self {
        Self { entries }
    }
}
