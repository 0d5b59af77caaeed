//! Capability registry
//!
//! Turns one adapter's declared controls into a flat list of descriptors and
//! a handler table keyed by component name. Every descriptor path must be
//! unique within the adapter; a collision is a build-time error.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::FutureExt;

use super::{
    CapabilityDescriptor, CapabilityHandler, ComponentType, DEVICE_SUBSCRIPTION_COMPONENT,
    DISCOVER_COMPONENT, REGISTER_COMPONENT, SensorDetails, SensorLink, SliderDetails,
};
use crate::device::controller::{AccessorController, Controller, ValueFn};
use crate::device::naming;
use crate::device::types::SensorKind;
use crate::device::DeviceSpec;
use crate::{Error, Result};

/// Output of [`CapabilityRegistry::build`]
#[derive(Debug, Clone)]
pub struct CapabilityTable {
    pub capabilities: Vec<CapabilityDescriptor>,
    pub handlers: HashMap<String, Arc<CapabilityHandler>>,
}

/// Accumulates descriptors for one adapter while enforcing path uniqueness
#[derive(Debug)]
pub struct CapabilityRegistry {
    adapter_name: String,
    capabilities: Vec<CapabilityDescriptor>,
    handlers: HashMap<String, Arc<CapabilityHandler>>,
    paths: HashSet<String>,
}

impl CapabilityRegistry {
    /// Create an empty registry for an adapter
    #[must_use]
    pub fn new(adapter_name: impl Into<String>) -> Self {
        Self {
            adapter_name: adapter_name.into(),
            capabilities: Vec::new(),
            handlers: HashMap::new(),
            paths: HashSet::new(),
        }
    }

    /// Derive every capability a device declares
    ///
    /// # Errors
    ///
    /// Returns `DUPLICATE_PATH_DETECTED` on a path collision,
    /// `DISCOVERY_REQUIRED` when discovery-dependent capabilities lack a
    /// discovery handler, or another build-time validation error
    pub fn build(spec: &DeviceSpec, adapter_name: &str) -> Result<CapabilityTable> {
        let mut registry = Self::new(adapter_name);

        if !spec.buttons.is_empty() {
            let Some(button_handler) = spec.button_handler.clone() else {
                return Err(Error::ButtonHandlerMissing(spec.name.clone()));
            };
            for button in &spec.buttons {
                let name = button.name.clone();
                let handler = button_handler.clone();
                let controller: ValueFn = Arc::new(move |device_id: String| {
                    handler(name.clone(), device_id)
                        .map(|result| result.map(|()| serde_json::Value::Null))
                        .boxed()
                });
                registry.add_function(
                    ComponentType::Button,
                    &button.name,
                    button.label.clone(),
                    controller,
                )?;
            }
        }

        for (slider, controller) in &spec.sliders {
            if slider.range[0] >= slider.range[1] {
                return Err(Error::InvalidSliderRange(slider.name.clone()));
            }
            let sensor = naming::sensor_name(&slider.name);
            let mut descriptor = registry.descriptor(
                ComponentType::Slider,
                &slider.name,
                slider.label.clone(),
            )?;
            descriptor.slider = Some(SliderDetails {
                kind: SensorKind::Range,
                sensor: sensor.clone(),
                range: slider.range,
                unit: slider.unit.clone(),
            });
            registry.insert(
                descriptor,
                Controller::Accessor(controller.clone()),
            )?;
            registry.add_sensor(
                &sensor,
                slider.label.clone(),
                SensorDetails {
                    kind: SensorKind::Range,
                    range: Some(slider.range),
                    unit: Some(slider.unit.clone()),
                },
                controller.getter.clone(),
            )?;
        }

        for (switch, controller) in &spec.switches {
            let sensor = naming::sensor_name(&switch.name);
            let mut descriptor =
                registry.descriptor(ComponentType::Switch, &switch.name, switch.label.clone())?;
            descriptor.sensor = Some(SensorLink::Paired(sensor.clone()));
            registry.insert(descriptor, Controller::Accessor(controller.clone()))?;
            registry.add_sensor(
                &sensor,
                switch.label.clone(),
                SensorDetails {
                    kind: SensorKind::Binary,
                    range: None,
                    unit: None,
                },
                controller.getter.clone(),
            )?;
        }

        for (sensor, controller) in &spec.sensors {
            let name = if sensor.kind == SensorKind::Power {
                sensor.name.clone()
            } else {
                naming::sensor_name(&sensor.name)
            };
            registry.add_sensor(
                &name,
                sensor.label.clone(),
                SensorDetails {
                    kind: sensor.kind,
                    range: sensor.range,
                    unit: sensor.unit.clone(),
                },
                controller.getter.clone(),
            )?;
        }

        for (text_label, getter) in &spec.text_labels {
            let sensor = naming::sensor_name(&text_label.name);
            let mut descriptor = registry.descriptor(
                ComponentType::TextLabel,
                &text_label.name,
                text_label.label.clone(),
            )?;
            descriptor.sensor = Some(SensorLink::Paired(sensor.clone()));
            descriptor.is_label_visible = Some(text_label.is_label_visible);
            registry.insert(descriptor, Controller::Function(getter.clone()))?;
            registry.add_sensor(
                &sensor,
                text_label.label.clone(),
                SensorDetails {
                    kind: SensorKind::String,
                    range: None,
                    unit: None,
                },
                Some(getter.clone()),
            )?;
        }

        for (image, getter) in &spec.image_urls {
            let sensor = naming::sensor_name(&image.name);
            let mut descriptor =
                registry.descriptor(ComponentType::ImageUrl, &image.name, image.label.clone())?;
            descriptor.sensor = Some(SensorLink::Paired(sensor.clone()));
            descriptor.image_uri.clone_from(&image.uri);
            descriptor.size = Some(image.size);
            registry.insert(descriptor, Controller::Function(getter.clone()))?;
            registry.add_sensor(
                &sensor,
                image.label.clone(),
                SensorDetails {
                    kind: SensorKind::String,
                    range: None,
                    unit: None,
                },
                Some(getter.clone()),
            )?;
        }

        for (directory, controller) in &spec.directories {
            let mut descriptor = registry.descriptor(
                ComponentType::Directory,
                &directory.name,
                directory.label.clone(),
            )?;
            descriptor.role = directory.role;
            registry.insert(descriptor, Controller::Directory(controller.clone()))?;
        }

        if let Some((_, discover)) = &spec.discovery {
            let descriptor =
                registry.descriptor(ComponentType::Discover, DISCOVER_COMPONENT, None)?;
            registry.insert(descriptor, Controller::Discovery(discover.clone()))?;
        }

        if let Some((_, controller)) = &spec.registration {
            let descriptor =
                registry.descriptor(ComponentType::Register, REGISTER_COMPONENT, None)?;
            registry.insert(descriptor, Controller::Registration(controller.clone()))?;
        }

        if let Some(controller) = &spec.device_subscription {
            let descriptor = registry.descriptor(
                ComponentType::DeviceSubscription,
                DEVICE_SUBSCRIPTION_COMPONENT,
                None,
            )?;
            registry.insert(descriptor, Controller::Subscription(controller.clone()))?;
        }

        let needs_discovery = spec.capabilities.iter().any(|c| c.requires_discovery())
            || spec.registration.is_some();
        if needs_discovery && spec.discovery.is_none() {
            return Err(Error::DiscoveryRequired(spec.name.clone()));
        }

        Ok(registry.finish())
    }

    /// Add a component backed by a plain function controller
    ///
    /// # Errors
    ///
    /// Returns `DUPLICATE_PATH_DETECTED` if the path is already taken
    pub fn add_function(
        &mut self,
        kind: ComponentType,
        name: &str,
        label: Option<String>,
        controller: ValueFn,
    ) -> Result<()> {
        let descriptor = self.descriptor(kind, name, label)?;
        self.insert(descriptor, Controller::Function(controller))
    }

    /// Add a sensor component that reads through `getter`
    ///
    /// # Errors
    ///
    /// Returns `DUPLICATE_PATH_DETECTED` if the path is already taken
    pub fn add_sensor(
        &mut self,
        name: &str,
        label: Option<String>,
        details: SensorDetails,
        getter: Option<ValueFn>,
    ) -> Result<()> {
        let mut descriptor = self.descriptor(ComponentType::Sensor, name, label)?;
        descriptor.sensor = Some(SensorLink::Details(details));
        self.insert(
            descriptor,
            Controller::Accessor(AccessorController {
                getter,
                setter: None,
            }),
        )
    }

    /// Insert a descriptor and its handler, rejecting duplicate paths
    ///
    /// # Errors
    ///
    /// Returns `DUPLICATE_PATH_DETECTED` carrying the offending name
    pub fn insert(&mut self, descriptor: CapabilityDescriptor, controller: Controller) -> Result<()> {
        if !self.paths.insert(descriptor.path.clone()) {
            tracing::error!(
                adapter = %self.adapter_name,
                name = %descriptor.name,
                path = %descriptor.path,
                "duplicate capability path"
            );
            return Err(Error::DuplicatePath(descriptor.name));
        }

        self.handlers.insert(
            descriptor.name.clone(),
            Arc::new(CapabilityHandler::new(descriptor.kind, controller)),
        );
        self.capabilities.push(descriptor);
        Ok(())
    }

    /// Number of capabilities registered so far
    #[must_use]
    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    /// Whether no capability was registered yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }

    /// Freeze the registry into its table
    #[must_use]
    pub fn finish(self) -> CapabilityTable {
        CapabilityTable {
            capabilities: self.capabilities,
            handlers: self.handlers,
        }
    }

    fn descriptor(
        &self,
        kind: ComponentType,
        name: &str,
        label: Option<String>,
    ) -> Result<CapabilityDescriptor> {
        naming::validate_component_name(name)?;
        Ok(CapabilityDescriptor::new(
            kind,
            name.to_string(),
            label.or_else(|| Some(name.to_string())),
            naming::component_path(&self.adapter_name, name),
        ))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::device::types::{
        ButtonDef, DeviceCapability, DirectoryDef, ImageUrlDef, RegistrationOptions, SensorDef,
        SliderDef, SwitchDef, TextLabelDef,
    };
    use crate::device::controller::value_fn;
    use crate::device::{DeviceBuilder, DirectoryController, RegistrationController};

    fn switch_controller() -> AccessorController {
        AccessorController::new()
            .getter(|_| async { Ok(json!(true)) })
            .setter(|_, _| async { Ok(()) })
    }

    fn paths(table: &CapabilityTable) -> Vec<&str> {
        table.capabilities.iter().map(|c| c.path.as_str()).collect()
    }

    #[test]
    fn switch_yields_actuator_and_sensor() {
        let builder = DeviceBuilder::new("Lamp").add_switch(SwitchDef::new("POWER"), switch_controller());
        let table = CapabilityRegistry::build(builder.spec(), "apt-lamp").unwrap();

        let names: Vec<&str> = table.capabilities.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["POWER", "POWER_SENSOR"]);
        assert_eq!(paths(&table), vec!["/device/apt-lamp/POWER", "/device/apt-lamp/POWER_SENSOR"]);
        assert_eq!(
            table.capabilities[0].sensor,
            Some(SensorLink::Paired("POWER_SENSOR".to_string()))
        );
        assert_eq!(table.handlers["POWER"].component_type, ComponentType::Switch);
        assert_eq!(table.handlers["POWER_SENSOR"].component_type, ComponentType::Sensor);
    }

    #[test]
    fn slider_exposes_range_sensor() {
        let builder = DeviceBuilder::new("Amp").add_slider(
            SliderDef::new("VOLUME").range(0.0, 80.0).unit("dB"),
            switch_controller(),
        );
        let table = CapabilityRegistry::build(builder.spec(), "apt-amp").unwrap();

        let slider = &table.capabilities[0];
        let details = slider.slider.as_ref().unwrap();
        assert_eq!(details.sensor, "VOLUME_SENSOR");
        assert_eq!(details.unit, "dB");

        let sensor = &table.capabilities[1];
        assert_eq!(sensor.kind, ComponentType::Sensor);
        assert_eq!(sensor.name, "VOLUME_SENSOR");
    }

    #[test]
    fn all_paths_are_unique() {
        let builder = DeviceBuilder::new("Everything")
            .add_button(ButtonDef::new("PLAY"))
            .add_button(ButtonDef::new("PAUSE"))
            .button_handler(|_, _| async { Ok(()) })
            .add_switch(SwitchDef::new("POWER"), switch_controller())
            .add_slider(SliderDef::new("VOLUME"), switch_controller())
            .add_sensor(
                SensorDef::new("TEMP", SensorKind::Range),
                AccessorController::with_getter(|_| async { Ok(json!(21)) }),
            )
            .add_text_label(TextLabelDef::new("ARTIST"), |_| async { Ok(json!("x")) })
            .add_image_url(ImageUrlDef::new("COVER"), |_| async { Ok(json!("http://x")) })
            .add_directory(DirectoryDef::new("LIBRARY"), DirectoryController::new());
        let table = CapabilityRegistry::build(builder.spec(), "apt-all").unwrap();

        let unique: HashSet<&str> = paths(&table).into_iter().collect();
        assert_eq!(unique.len(), table.capabilities.len());
        assert_eq!(table.handlers.len(), table.capabilities.len());
    }

    #[test]
    fn colliding_paths_fail_with_offending_name() {
        let builder = DeviceBuilder::new("Lamp")
            .add_switch(SwitchDef::new("POWER"), switch_controller())
            .add_sensor(
                SensorDef::new("POWER", SensorKind::Binary),
                AccessorController::with_getter(|_| async { Ok(json!(false)) }),
            );

        let err = CapabilityRegistry::build(builder.spec(), "apt-lamp").unwrap_err();
        assert_eq!(err.code(), "DUPLICATE_PATH_DETECTED");
        assert!(err.to_string().contains("POWER_SENSOR"));
    }

    #[test]
    fn insert_rejects_same_path_twice() {
        let mut registry = CapabilityRegistry::new("apt-x");
        let getter = value_fn(|_| async { Ok(json!(1)) });
        registry
            .add_function(ComponentType::TextLabel, "A", None, getter.clone())
            .unwrap();
        let err = registry
            .add_function(ComponentType::ImageUrl, "A", None, getter)
            .unwrap_err();
        assert!(matches!(err, Error::DuplicatePath(name) if name == "A"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn bridge_device_without_discovery_is_rejected() {
        let builder = DeviceBuilder::new("Hub").add_capability(DeviceCapability::BridgeDevice);
        let err = CapabilityRegistry::build(builder.spec(), "apt-hub").unwrap_err();
        assert_eq!(err.code(), "DISCOVERY_REQUIRED");
    }

    #[test]
    fn registration_without_discovery_is_rejected() {
        let builder = DeviceBuilder::new("Cloud").enable_registration(
            RegistrationOptions::default(),
            RegistrationController::new(),
        );
        let err = CapabilityRegistry::build(builder.spec(), "apt-cloud").unwrap_err();
        assert_eq!(err.code(), "DISCOVERY_REQUIRED");
    }

    #[test]
    fn buttons_require_a_handler() {
        let builder = DeviceBuilder::new("Remote").add_button(ButtonDef::new("OK"));
        let err = CapabilityRegistry::build(builder.spec(), "apt-remote").unwrap_err();
        assert_eq!(err.code(), "BUTTON_HANDLER_MISSING");
    }

    #[test]
    fn inverted_slider_range_is_rejected() {
        let builder = DeviceBuilder::new("Amp")
            .add_slider(SliderDef::new("VOLUME").range(10.0, 0.0), switch_controller());
        let err = CapabilityRegistry::build(builder.spec(), "apt-amp").unwrap_err();
        assert_eq!(err.code(), "INVALID_SLIDER_RANGE");
    }

    #[test]
    fn component_names_are_url_encoded_in_paths() {
        let builder = DeviceBuilder::new("Remote")
            .add_button(ButtonDef::new("CHANNEL UP"))
            .button_handler(|_, _| async { Ok(()) });
        let table = CapabilityRegistry::build(builder.spec(), "apt-r").unwrap();

        assert_eq!(table.capabilities[0].path, "/device/apt-r/CHANNEL%20UP");
        assert!(table.handlers.contains_key("CHANNEL UP"));
    }

    #[tokio::test]
    async fn button_controller_forwards_its_name() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let builder = DeviceBuilder::new("Remote")
            .add_button(ButtonDef::new("OK"))
            .button_handler(move |name, device_id| {
                let tx = tx.clone();
                async move {
                    let _ = tx.send((name, device_id));
                    Ok(())
                }
            });
        let table = CapabilityRegistry::build(builder.spec(), "apt-r").unwrap();

        let Controller::Function(f) = &table.handlers["OK"].controller else {
            panic!("button should have a function controller");
        };
        f("d1".to_string()).await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), ("OK".to_string(), "d1".to_string()));
    }
}
