//! Device database
//!
//! Holds the built adapters of a session in registration order, answers
//! lookups and searches, and keeps devices built from discovery results.

pub mod search;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::capability::CapabilityHandler;
use crate::device::{AdapterDefinition, DeviceAdapter};
use crate::dispatch::DynamicDeviceRegistrar;

/// One adapter as listed by the database
#[derive(Debug, Serialize)]
pub struct DatabaseEntry<'a> {
    pub id: usize,
    #[serde(flatten)]
    pub definition: AdapterDefinition<'a>,
}

/// One search result
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit<'a> {
    pub item: DatabaseEntry<'a>,
    pub score: usize,
    pub max_score: usize,
}

/// Lookup and search index over a session's adapters
#[derive(Debug, Default)]
pub struct DeviceDatabase {
    adapters: Vec<DeviceAdapter>,
    tokens: Vec<Vec<String>>,
    by_name: HashMap<String, usize>,
    dynamic: RwLock<HashMap<String, Arc<DeviceAdapter>>>,
}

impl DeviceDatabase {
    /// Index adapters; the position of each adapter becomes its id
    #[must_use]
    pub fn new(adapters: Vec<DeviceAdapter>) -> Self {
        let tokens = adapters.iter().map(search::adapter_tokens).collect();
        let by_name = adapters
            .iter()
            .enumerate()
            .map(|(id, a)| (a.adapter_name.clone(), id))
            .collect();

        Self {
            adapters,
            tokens,
            by_name,
            dynamic: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// All adapters in registration order
    #[must_use]
    pub fn adapters(&self) -> &[DeviceAdapter] {
        &self.adapters
    }

    /// Adapter by database id
    #[must_use]
    pub fn get(&self, id: usize) -> Option<DatabaseEntry<'_>> {
        self.adapters.get(id).map(|adapter| DatabaseEntry {
            id,
            definition: adapter.definition(),
        })
    }

    /// Adapter by adapter name
    #[must_use]
    pub fn adapter(&self, adapter_name: &str) -> Option<&DeviceAdapter> {
        self.by_name
            .get(adapter_name)
            .and_then(|&id| self.adapters.get(id))
    }

    /// Adapters matching `query`, best match first
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<SearchHit<'_>> {
        let mut scored: Vec<(usize, usize)> = self
            .tokens
            .iter()
            .enumerate()
            .map(|(id, tokens)| (id, search::score(query, tokens)))
            .filter(|&(_, score)| score > 0)
            .collect();
        scored.sort_by(|a, b| b.1.cmp(&a.1));

        let max_score = scored.first().map_or(0, |&(_, score)| score);
        scored
            .into_iter()
            .filter_map(|(id, score)| {
                self.get(id).map(|item| SearchHit {
                    item,
                    score,
                    max_score,
                })
            })
            .collect()
    }

    /// Device previously built from a discovery result
    pub async fn dynamic_device(&self, device_id: &str) -> Option<Arc<DeviceAdapter>> {
        self.dynamic.read().await.get(device_id).cloned()
    }

    /// Handler for a component of one device
    ///
    /// Dynamic-device adapters answer from the discovered device's own
    /// capabilities first and fall back to the adapter's static ones.
    pub async fn handler(
        &self,
        adapter_name: &str,
        component: &str,
        device_id: &str,
    ) -> Option<Arc<CapabilityHandler>> {
        let adapter = self.adapter(adapter_name)?;
        if adapter.supports_dynamic_devices() {
            if let Some(handler) = self
                .dynamic_device(device_id)
                .await
                .and_then(|device| device.handler(component))
            {
                return Some(handler);
            }
        }
        adapter.handler(component)
    }
}

#[async_trait]
impl DynamicDeviceRegistrar for DeviceDatabase {
    async fn register_dynamic_device(&self, device_id: &str, adapter: DeviceAdapter) {
        tracing::debug!(
            device_id,
            adapter = %adapter.adapter_name,
            "registering dynamic device"
        );
        self.dynamic
            .write()
            .await
            .insert(device_id.to_string(), Arc::new(adapter));
    }
}
