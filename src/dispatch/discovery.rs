//! Discovery results returned by adapter discovery controllers

use std::collections::HashSet;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::device::{DeviceAdapter, DeviceBuilder};
use crate::{Error, Result};

/// One physical device found by an adapter's discovery controller
#[derive(Debug, Clone)]
pub struct DiscoveredDevice {
    pub id: String,
    pub name: String,
    pub reachable: Option<bool>,
    pub room: Option<String>,
    /// Capabilities specific to this device, for dynamic-device adapters
    pub device: Option<DeviceBuilder>,
}

impl DiscoveredDevice {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            reachable: None,
            room: None,
            device: None,
        }
    }

    #[must_use]
    pub const fn reachable(mut self, reachable: bool) -> Self {
        self.reachable = Some(reachable);
        self
    }

    #[must_use]
    pub fn room(mut self, room: impl Into<String>) -> Self {
        self.room = Some(room.into());
        self
    }

    #[must_use]
    pub fn device(mut self, device: DeviceBuilder) -> Self {
        self.device = Some(device);
        self
    }
}

/// What a discovery controller resolves to
#[derive(Debug, Clone)]
pub enum DiscoveryResult {
    Many(Vec<DiscoveredDevice>),
    /// Only valid when the brain asked about one specific device
    Single(DiscoveredDevice),
}

impl From<Vec<DiscoveredDevice>> for DiscoveryResult {
    fn from(devices: Vec<DiscoveredDevice>) -> Self {
        Self::Many(devices)
    }
}

impl From<DiscoveredDevice> for DiscoveryResult {
    fn from(device: DiscoveredDevice) -> Self {
        Self::Single(device)
    }
}

/// Normalized discovery entry sent back to the brain
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredEntry {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reachable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<Value>,
}

/// Receives devices built from discovery results
#[async_trait]
pub trait DynamicDeviceRegistrar: Send + Sync {
    async fn register_dynamic_device(&self, device_id: &str, adapter: DeviceAdapter);
}

/// Check the shape of a discovery result
///
/// A lone device is accepted only for a call that targeted one device id.
///
/// # Errors
///
/// Returns `INVALID_DISCOVERY_RESULT`, `INVALID_DISCOVERY_PARAMETER` or
/// `INVALID_DISCOVERY_DUPLICATE_DEVICE_IDS`
pub fn validate(result: DiscoveryResult, targeted: bool) -> Result<Vec<DiscoveredDevice>> {
    let devices = match result {
        DiscoveryResult::Many(devices) => devices,
        DiscoveryResult::Single(device) if targeted => vec![device],
        DiscoveryResult::Single(device) => {
            return Err(Error::InvalidDiscoveryResult(format!(
                "expected a list, got single device '{}'",
                device.id
            )));
        }
    };

    let mut seen = HashSet::with_capacity(devices.len());
    for device in &devices {
        if device.id.is_empty() || device.name.is_empty() {
            return Err(Error::InvalidDiscoveryParameter(format!(
                "id='{}' name='{}'",
                device.id, device.name
            )));
        }
        if !seen.insert(device.id.as_str()) {
            return Err(Error::DuplicateDiscoveryIds);
        }
    }

    Ok(devices)
}

/// Build embedded devices, hand them to the registrar and normalize entries
///
/// # Errors
///
/// Returns the build error of an embedded device
pub async fn normalize(
    devices: Vec<DiscoveredDevice>,
    adapter_name: &str,
    registrar: &dyn DynamicDeviceRegistrar,
) -> Result<Vec<DiscoveredEntry>> {
    let mut entries = Vec::with_capacity(devices.len());
    for discovered in devices {
        let device = match discovered.device {
            Some(builder) => {
                let adapter = builder.build_dynamic(adapter_name)?;
                let definition = serde_json::to_value(adapter.definition())?;
                registrar
                    .register_dynamic_device(&discovered.id, adapter)
                    .await;
                Some(definition)
            }
            None => None,
        };

        entries.push(DiscoveredEntry {
            id: discovered.id,
            name: discovered.name,
            reachable: discovered.reachable,
            room: discovered.room,
            device,
        });
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(String, String)>>);

    #[async_trait]
    impl DynamicDeviceRegistrar for Recorder {
        async fn register_dynamic_device(&self, device_id: &str, adapter: DeviceAdapter) {
            self.0
                .lock()
                .unwrap()
                .push((device_id.to_string(), adapter.adapter_name));
        }
    }

    #[test]
    fn single_device_is_wrapped_only_when_targeted() {
        let single = DiscoveryResult::from(DiscoveredDevice::new("a", "A"));
        assert_eq!(validate(single.clone(), true).unwrap().len(), 1);

        let err = validate(single, false).unwrap_err();
        assert_eq!(err.code(), "INVALID_DISCOVERY_RESULT");
    }

    #[test]
    fn entries_need_id_and_name() {
        let result = DiscoveryResult::from(vec![DiscoveredDevice::new("a", "")]);
        assert_eq!(
            validate(result, false).unwrap_err().code(),
            "INVALID_DISCOVERY_PARAMETER"
        );
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let result = DiscoveryResult::from(vec![
            DiscoveredDevice::new("a", "One"),
            DiscoveredDevice::new("a", "Two"),
        ]);
        assert_eq!(
            validate(result, false).unwrap_err().code(),
            "INVALID_DISCOVERY_DUPLICATE_DEVICE_IDS"
        );
    }

    #[tokio::test]
    async fn embedded_devices_are_built_and_registered() {
        let recorder = Recorder::default();
        let devices = vec![
            DiscoveredDevice::new("bulb-1", "Bulb")
                .room("Kitchen")
                .device(DeviceBuilder::new("Bulb")),
            DiscoveredDevice::new("bulb-2", "Other").reachable(false),
        ];

        let entries = normalize(devices, "apt-hub", &recorder).await.unwrap();

        assert_eq!(entries[0].room.as_deref(), Some("Kitchen"));
        assert_eq!(entries[0].device.as_ref().unwrap()["adapterName"], "apt-hub");
        assert_eq!(entries[1].reachable, Some(false));
        assert!(entries[1].device.is_none());
        assert_eq!(
            *recorder.0.lock().unwrap(),
            vec![("bulb-1".to_string(), "apt-hub".to_string())]
        );
    }
}
