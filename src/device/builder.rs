//! Device builder
//!
//! Collects everything one device adapter declares and turns it into an
//! immutable [`DeviceAdapter`] through the capability registry.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde::Serialize;

use super::controller::{
    AccessorController, ButtonFn, Controller, DirectoryController, DiscoverFn,
    RegistrationController, SubscriptionController, SubscriptionFn, ValueFn, button_fn,
    discover_fn, value_fn,
};
use super::naming;
use super::types::{
    ButtonDef, DeviceCapability, DeviceType, DirectoryDef, DiscoveryOptions, ImageUrlDef,
    RegistrationOptions, SensorDef, SensorKind, SliderDef, SwitchDef, TextLabelDef, Timing,
};
use crate::capability::{CapabilityDescriptor, CapabilityHandler, CapabilityRegistry};
use crate::dispatch::DiscoveryResult;
use crate::notification::NotificationHandle;
use crate::{Error, Result};

/// Manufacturer used when none is declared
pub const DEFAULT_MANUFACTURER: &str = "Unknown";

/// Everything a device adapter declares, before capabilities are derived
#[derive(Clone, Default)]
pub struct DeviceSpec {
    pub name: String,
    pub manufacturer: String,
    pub device_type: DeviceType,
    pub search_tokens: Vec<String>,
    pub driver_version: Option<u32>,
    pub capabilities: Vec<DeviceCapability>,
    pub timing: Option<Timing>,
    pub buttons: Vec<ButtonDef>,
    pub button_handler: Option<ButtonFn>,
    pub sliders: Vec<(SliderDef, AccessorController)>,
    pub switches: Vec<(SwitchDef, AccessorController)>,
    pub sensors: Vec<(SensorDef, AccessorController)>,
    pub text_labels: Vec<(TextLabelDef, ValueFn)>,
    pub image_urls: Vec<(ImageUrlDef, ValueFn)>,
    pub directories: Vec<(DirectoryDef, DirectoryController)>,
    pub discovery: Option<(DiscoveryOptions, DiscoverFn)>,
    pub registration: Option<(RegistrationOptions, RegistrationController)>,
    pub device_subscription: Option<SubscriptionController>,
    pub subscription_fn: Option<SubscriptionFn>,
}

impl fmt::Debug for DeviceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceSpec")
            .field("name", &self.name)
            .field("manufacturer", &self.manufacturer)
            .field("device_type", &self.device_type)
            .field("buttons", &self.buttons.len())
            .field("sliders", &self.sliders.len())
            .field("switches", &self.switches.len())
            .field("sensors", &self.sensors.len())
            .field("text_labels", &self.text_labels.len())
            .field("image_urls", &self.image_urls.len())
            .field("directories", &self.directories.len())
            .field("discovery", &self.discovery.is_some())
            .field("registration", &self.registration.is_some())
            .finish_non_exhaustive()
    }
}

/// Fluent builder for one device adapter
///
/// # Examples
///
/// ```ignore
/// let lamp = DeviceBuilder::new("Lamp")
///     .manufacturer("Acme")
///     .device_type(DeviceType::Light)
///     .add_switch(
///         SwitchDef::new("POWER"),
///         AccessorController::new()
///             .getter(|_| async { Ok(json!(true)) })
///             .setter(|_, _| async { Ok(()) }),
///     )
///     .build()?;
/// ```
#[derive(Clone, Debug, Default)]
pub struct DeviceBuilder {
    spec: DeviceSpec,
}

impl DeviceBuilder {
    /// Start declaring a device
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            spec: DeviceSpec {
                name: name.into(),
                manufacturer: DEFAULT_MANUFACTURER.to_string(),
                ..DeviceSpec::default()
            },
        }
    }

    #[must_use]
    pub fn manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.spec.manufacturer = manufacturer.into();
        self
    }

    #[must_use]
    pub const fn device_type(mut self, device_type: DeviceType) -> Self {
        self.spec.device_type = device_type;
        self
    }

    #[must_use]
    pub fn add_search_token(mut self, token: impl Into<String>) -> Self {
        self.spec.search_tokens.push(token.into());
        self
    }

    #[must_use]
    pub const fn driver_version(mut self, version: u32) -> Self {
        self.spec.driver_version = Some(version);
        self
    }

    #[must_use]
    pub fn add_capability(mut self, capability: DeviceCapability) -> Self {
        if !self.spec.capabilities.contains(&capability) {
            self.spec.capabilities.push(capability);
        }
        self
    }

    #[must_use]
    pub const fn timing(mut self, timing: Timing) -> Self {
        self.spec.timing = Some(timing);
        self
    }

    #[must_use]
    pub fn add_button(mut self, button: ButtonDef) -> Self {
        self.spec.buttons.push(button);
        self
    }

    /// Handler invoked as `(buttonName, deviceId)` for every button
    #[must_use]
    pub fn button_handler<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(String, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.spec.button_handler = Some(button_fn(f));
        self
    }

    #[must_use]
    pub fn add_slider(mut self, slider: SliderDef, controller: AccessorController) -> Self {
        self.spec.sliders.push((slider, controller));
        self
    }

    #[must_use]
    pub fn add_switch(mut self, switch: SwitchDef, controller: AccessorController) -> Self {
        self.spec.switches.push((switch, controller));
        self
    }

    #[must_use]
    pub fn add_sensor(mut self, sensor: SensorDef, controller: AccessorController) -> Self {
        self.spec.sensors.push((sensor, controller));
        self
    }

    /// Power state sensor reported as `powerstate`
    #[must_use]
    pub fn add_power_state_sensor<F, Fut>(self, getter: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<serde_json::Value>> + Send + 'static,
    {
        self.add_sensor(
            SensorDef::new(naming::POWER_STATE_SENSOR, SensorKind::Power),
            AccessorController::with_getter(getter),
        )
    }

    #[must_use]
    pub fn add_text_label<F, Fut>(mut self, label: TextLabelDef, getter: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<serde_json::Value>> + Send + 'static,
    {
        self.spec.text_labels.push((label, value_fn(getter)));
        self
    }

    #[must_use]
    pub fn add_image_url<F, Fut>(mut self, image: ImageUrlDef, getter: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<serde_json::Value>> + Send + 'static,
    {
        self.spec.image_urls.push((image, value_fn(getter)));
        self
    }

    #[must_use]
    pub fn add_directory(mut self, directory: DirectoryDef, controller: DirectoryController) -> Self {
        self.spec.directories.push((directory, controller));
        self
    }

    /// Enable device discovery; the controller receives an optional device id filter
    #[must_use]
    pub fn enable_discovery<F, Fut>(mut self, options: DiscoveryOptions, f: F) -> Self
    where
        F: Fn(Option<String>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<DiscoveryResult>> + Send + 'static,
    {
        self.spec.discovery = Some((options, discover_fn(f)));
        self
    }

    #[must_use]
    pub fn enable_registration(
        mut self,
        options: RegistrationOptions,
        controller: RegistrationController,
    ) -> Self {
        self.spec.registration = Some((options, controller));
        self
    }

    #[must_use]
    pub fn device_subscription(mut self, controller: SubscriptionController) -> Self {
        self.spec.device_subscription = Some(controller);
        self
    }

    /// Receive a [`NotificationHandle`] once a session has started
    #[must_use]
    pub fn register_subscription_function<F>(mut self, f: F) -> Self
    where
        F: Fn(NotificationHandle) + Send + Sync + 'static,
    {
        self.spec.subscription_fn = Some(Arc::new(f));
        self
    }

    /// The declaration collected so far
    #[must_use]
    pub const fn spec(&self) -> &DeviceSpec {
        &self.spec
    }

    /// Validate the declaration and derive its capabilities
    ///
    /// # Errors
    ///
    /// Returns a build-time validation error (`INVALID_DEVICE_NAME`,
    /// `BUTTON_HANDLER_MISSING`, `DUPLICATE_PATH_DETECTED`, `DISCOVERY_REQUIRED`, ...)
    pub fn build(self) -> Result<DeviceAdapter> {
        self.build_named(None)
    }

    /// Build a discovered device that is served under its parent adapter
    ///
    /// # Errors
    ///
    /// Same as [`DeviceBuilder::build`]
    pub fn build_dynamic(self, parent_adapter_name: &str) -> Result<DeviceAdapter> {
        self.build_named(Some(parent_adapter_name.to_string()))
    }

    fn build_named(self, adapter_name: Option<String>) -> Result<DeviceAdapter> {
        let spec = self.spec;
        if spec.name.trim().is_empty() {
            return Err(Error::InvalidDeviceName);
        }

        let adapter_name = adapter_name.unwrap_or_else(|| {
            naming::adapter_id(&spec.name, &spec.manufacturer, spec.device_type.as_str())
        });
        let table = CapabilityRegistry::build(&spec, &adapter_name)?;

        tracing::debug!(
            device = %spec.name,
            adapter = %adapter_name,
            capabilities = table.capabilities.len(),
            "device adapter built"
        );

        Ok(DeviceAdapter {
            adapter_name,
            name: spec.name,
            manufacturer: spec.manufacturer,
            device_type: spec.device_type,
            search_tokens: spec.search_tokens,
            driver_version: spec.driver_version,
            device_capabilities: spec.capabilities,
            timing: spec.timing,
            discovery: spec.discovery.map(|(options, _)| options),
            registration: spec.registration.map(|(options, _)| options),
            subscription_fn: spec.subscription_fn,
            capabilities: table.capabilities,
            handlers: table.handlers,
        })
    }
}

/// A built, immutable device adapter
#[derive(Clone)]
pub struct DeviceAdapter {
    pub adapter_name: String,
    pub name: String,
    pub manufacturer: String,
    pub device_type: DeviceType,
    pub search_tokens: Vec<String>,
    pub driver_version: Option<u32>,
    pub device_capabilities: Vec<DeviceCapability>,
    pub timing: Option<Timing>,
    pub discovery: Option<DiscoveryOptions>,
    pub registration: Option<RegistrationOptions>,
    subscription_fn: Option<SubscriptionFn>,
    capabilities: Vec<CapabilityDescriptor>,
    handlers: HashMap<String, Arc<CapabilityHandler>>,
}

impl fmt::Debug for DeviceAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceAdapter")
            .field("adapter_name", &self.adapter_name)
            .field("name", &self.name)
            .field("capabilities", &self.capabilities.len())
            .finish_non_exhaustive()
    }
}

/// Serializable view of an adapter, as served to the brain
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterDefinition<'a> {
    pub adapter_name: &'a str,
    pub name: &'a str,
    pub manufacturer: &'a str,
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    pub tokens: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_version: Option<u32>,
    pub device_capabilities: &'a [DeviceCapability],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<Timing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discovery: Option<&'a DiscoveryOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration: Option<&'a RegistrationOptions>,
    pub capabilities: &'a [CapabilityDescriptor],
}

impl DeviceAdapter {
    /// Handler registered under a decoded component name
    #[must_use]
    pub fn handler(&self, component: &str) -> Option<Arc<CapabilityHandler>> {
        self.handlers.get(component).cloned()
    }

    /// All derived capability descriptors
    #[must_use]
    pub fn capabilities(&self) -> &[CapabilityDescriptor] {
        &self.capabilities
    }

    /// Whether discovered devices carry their own builders
    #[must_use]
    pub fn supports_dynamic_devices(&self) -> bool {
        self.discovery
            .as_ref()
            .is_some_and(|d| d.enable_dynamic_device_builder)
            || self
                .device_capabilities
                .contains(&DeviceCapability::DynamicDevice)
    }

    /// Device subscription callbacks, if declared
    #[must_use]
    pub fn subscription_controller(&self) -> Option<SubscriptionController> {
        self.handler(crate::capability::DEVICE_SUBSCRIPTION_COMPONENT)
            .and_then(|h| match &h.controller {
                Controller::Subscription(c) => Some(c.clone()),
                _ => None,
            })
    }

    /// Hand the notification handle to the adapter's subscription function
    pub fn notify_subscription(&self, handle: NotificationHandle) {
        if let Some(f) = &self.subscription_fn {
            f(handle);
        }
    }

    /// Serializable definition served to the brain
    #[must_use]
    pub fn definition(&self) -> AdapterDefinition<'_> {
        AdapterDefinition {
            adapter_name: &self.adapter_name,
            name: &self.name,
            manufacturer: &self.manufacturer,
            device_type: self.device_type,
            tokens: &self.search_tokens,
            driver_version: self.driver_version,
            device_capabilities: &self.device_capabilities,
            timing: self.timing,
            discovery: self.discovery.as_ref(),
            registration: self.registration.as_ref(),
            capabilities: &self.capabilities,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn empty_name_is_rejected() {
        let err = DeviceBuilder::new(" ").build().unwrap_err();
        assert_eq!(err.code(), "INVALID_DEVICE_NAME");
    }

    #[test]
    fn defaults_and_capability_dedup() {
        let builder = DeviceBuilder::new("Lamp")
            .add_capability(DeviceCapability::AlwaysOn)
            .add_capability(DeviceCapability::AlwaysOn);
        assert_eq!(builder.spec().manufacturer, DEFAULT_MANUFACTURER);
        assert_eq!(builder.spec().capabilities.len(), 1);
    }

    #[test]
    fn definition_serializes_wire_fields() {
        let adapter = DeviceBuilder::new("Lamp")
            .manufacturer("Acme")
            .device_type(DeviceType::Light)
            .add_search_token("bulb")
            .add_power_state_sensor(|_| async { Ok(json!(true)) })
            .build()
            .unwrap();

        let value = serde_json::to_value(adapter.definition()).unwrap();
        assert_eq!(value["type"], "LIGHT");
        assert_eq!(value["manufacturer"], "Acme");
        assert_eq!(value["tokens"], json!(["bulb"]));
        assert_eq!(value["adapterName"], adapter.adapter_name.as_str());
        assert_eq!(value["capabilities"][0]["name"], "powerstate");
    }

    #[test]
    fn dynamic_devices_use_parent_adapter_paths() {
        let adapter = DeviceBuilder::new("Bulb 1")
            .add_power_state_sensor(|_| async { Ok(json!(false)) })
            .build_dynamic("apt-parent")
            .unwrap();
        assert_eq!(adapter.adapter_name, "apt-parent");
        assert_eq!(adapter.capabilities()[0].path, "/device/apt-parent/powerstate");
    }

    #[test]
    fn plain_adapter_has_no_subscriptions_or_dynamic_devices() {
        let adapter = DeviceBuilder::new("Lamp").build().unwrap();
        assert!(adapter.subscription_controller().is_none());
        assert!(!adapter.supports_dynamic_devices());
    }
}
