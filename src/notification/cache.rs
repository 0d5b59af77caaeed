//! Last-sent sensor values
//!
//! Bounded by entry count. Once the bound is exceeded the whole cache is
//! dropped before the next insert; there is no per-entry eviction.

use std::collections::HashMap;

use serde_json::Value;

/// Last value sent per notification key
#[derive(Debug, Clone)]
pub struct SensorValueCache {
    max_entries: usize,
    values: HashMap<String, Value>,
}

impl SensorValueCache {
    #[must_use]
    pub fn new(max_entries: usize) -> Self {
        Self {
            max_entries,
            values: HashMap::new(),
        }
    }

    /// Whether `data` equals the last value sent under `key`
    #[must_use]
    pub fn is_duplicate(&self, key: &str, data: &Value) -> bool {
        self.values.get(key).is_some_and(|last| last == data)
    }

    /// Remember the value just sent under `key`
    pub fn insert(&mut self, key: impl Into<String>, data: Value) {
        if self.values.len() > self.max_entries {
            tracing::debug!(entries = self.values.len(), "clearing sensor value cache");
            self.values.clear();
        }
        self.values.insert(key.into(), data);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
