//! Event key resolution
//!
//! The brain addresses components by private event keys. Descriptions are
//! fetched per `(uniqueDeviceId, deviceId, adapterName)` and cached; a lookup
//! that finds nothing evicts the entry so the next call refetches.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::brain::BrainApi;
use crate::{Error, Result};

/// One component as described by the brain
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentKey {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub event_key: Option<String>,
}

type CacheKey = (String, String, String);

/// Resolves component names to event keys for one adapter
#[derive(Debug)]
pub struct NotificationKeyResolver {
    adapter_name: String,
    api: BrainApi,
    cache: RwLock<HashMap<CacheKey, Vec<ComponentKey>>>,
}

impl NotificationKeyResolver {
    #[must_use]
    pub fn new(adapter_name: impl Into<String>, api: BrainApi) -> Self {
        Self {
            adapter_name: adapter_name.into(),
            api,
            cache: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    /// Event keys of `component` on one device
    ///
    /// Entries matching by name win; label matches are the fallback.
    ///
    /// # Errors
    ///
    /// Returns `INVALID_SERVER_RESPONSE` when the brain does not answer with
    /// an array, `COMPONENTNAME_NOT_FOUND` when nothing matches, or the
    /// transport error
    pub async fn get_notification_keys(
        &self,
        unique_device_id: &str,
        device_id: &str,
        component: &str,
    ) -> Result<Vec<String>> {
        let cache_key = (
            unique_device_id.to_string(),
            device_id.to_string(),
            self.adapter_name.clone(),
        );

        let cached = self.cache.read().await.get(&cache_key).cloned();
        let entries = match cached {
            Some(entries) => entries,
            None => {
                let entries = self.fetch(unique_device_id, device_id).await?;
                self.cache
                    .write()
                    .await
                    .insert(cache_key.clone(), entries.clone());
                entries
            }
        };

        let keys = match_keys(&entries, component);
        if keys.is_empty() {
            tracing::debug!(
                adapter = %self.adapter_name,
                unique_device_id,
                component,
                "component not found, evicting cached keys"
            );
            self.cache.write().await.remove(&cache_key);
            return Err(Error::ComponentNameNotFound(component.to_string()));
        }
        Ok(keys)
    }

    async fn fetch(&self, unique_device_id: &str, device_id: &str) -> Result<Vec<ComponentKey>> {
        let response = self
            .api
            .notification_keys(&self.adapter_name, device_id, unique_device_id)
            .await?;

        let Value::Array(items) = response else {
            return Err(Error::InvalidServerResponse(format!(
                "expected array of notification keys, got {response}"
            )));
        };

        Ok(items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect())
    }
}

fn match_keys(entries: &[ComponentKey], component: &str) -> Vec<String> {
    let by_name: Vec<String> = entries
        .iter()
        .filter(|e| e.name == component)
        .filter_map(|e| e.event_key.clone())
        .collect();
    if !by_name.is_empty() {
        return by_name;
    }

    entries
        .iter()
        .filter(|e| e.label.as_deref() == Some(component))
        .filter_map(|e| e.event_key.clone())
        .collect()
}
