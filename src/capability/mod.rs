//! Capability descriptors and handlers
//!
//! A capability is one path-addressable facet of a device. Descriptors are
//! what the brain sees; handlers are what the dispatcher calls.

pub mod registry;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::device::Controller;
use crate::device::types::{DirectoryRole, ImageSize, SensorKind};

pub use registry::{CapabilityRegistry, CapabilityTable};

/// Component name under which discovery is registered
pub const DISCOVER_COMPONENT: &str = "discover";

/// Component name under which registration is registered
pub const REGISTER_COMPONENT: &str = "register";

/// Component name under which device subscriptions are registered
pub const DEVICE_SUBSCRIPTION_COMPONENT: &str = "devicesubscription";

/// Wire type of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentType {
    Button,
    Switch,
    Slider,
    Sensor,
    TextLabel,
    ImageUrl,
    Directory,
    Discover,
    Register,
    DeviceSubscription,
}

impl ComponentType {
    /// Wire name of the component type
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Button => "button",
            Self::Switch => "switch",
            Self::Slider => "slider",
            Self::Sensor => "sensor",
            Self::TextLabel => "textlabel",
            Self::ImageUrl => "imageurl",
            Self::Directory => "directory",
            Self::Discover => "discover",
            Self::Register => "register",
            Self::DeviceSubscription => "devicesubscription",
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value description of a sensor component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorDetails {
    #[serde(rename = "type")]
    pub kind: SensorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// Sensor reference carried by a descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SensorLink {
    /// Actuator pointing at its paired sensor by name
    Paired(String),
    /// Sensor describing its own value
    Details(SensorDetails),
}

/// Range description of a slider component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliderDetails {
    #[serde(rename = "type")]
    pub kind: SensorKind,
    pub sensor: String,
    pub range: [f64; 2],
    pub unit: String,
}

/// One path-addressable component as served to the brain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityDescriptor {
    #[serde(rename = "type")]
    pub kind: ComponentType,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensor: Option<SensorLink>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slider: Option<SliderDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_label_visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<ImageSize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<DirectoryRole>,
}

impl CapabilityDescriptor {
    /// Bare descriptor with no type-specific details
    #[must_use]
    pub const fn new(kind: ComponentType, name: String, label: Option<String>, path: String) -> Self {
        Self {
            kind,
            name,
            label,
            path,
            sensor: None,
            slider: None,
            is_label_visible: None,
            image_uri: None,
            size: None,
            role: None,
        }
    }
}

/// Dispatch target for one component
#[derive(Debug, Clone)]
pub struct CapabilityHandler {
    pub component_type: ComponentType,
    pub controller: Controller,
}

impl CapabilityHandler {
    #[must_use]
    pub const fn new(component_type: ComponentType, controller: Controller) -> Self {
        Self {
            component_type,
            controller,
        }
    }
}
