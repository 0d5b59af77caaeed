//! Declarative device types
//!
//! These are the plain-data halves of what a device adapter declares; the
//! callback halves live in [`super::controller`].

use serde::{Deserialize, Serialize};

/// Category the brain files the device under
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceType {
    #[default]
    Accessory,
    #[serde(rename = "AVRECEIVER")]
    AvReceiver,
    Dvd,
    #[serde(rename = "GAMECONSOLE")]
    GameConsole,
    #[serde(rename = "HDMISWITCH")]
    HdmiSwitch,
    Light,
    #[serde(rename = "MEDIAPLAYER")]
    MediaPlayer,
    #[serde(rename = "MUSICPLAYER")]
    MusicPlayer,
    Projector,
    Soundbar,
    Tuner,
    Tv,
    Vod,
    Thermostat,
    Clima,
}

impl DeviceType {
    /// Wire name of the device type
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Accessory => "ACCESSORY",
            Self::AvReceiver => "AVRECEIVER",
            Self::Dvd => "DVD",
            Self::GameConsole => "GAMECONSOLE",
            Self::HdmiSwitch => "HDMISWITCH",
            Self::Light => "LIGHT",
            Self::MediaPlayer => "MEDIAPLAYER",
            Self::MusicPlayer => "MUSICPLAYER",
            Self::Projector => "PROJECTOR",
            Self::Soundbar => "SOUNDBAR",
            Self::Tuner => "TUNER",
            Self::Tv => "TV",
            Self::Vod => "VOD",
            Self::Thermostat => "THERMOSTAT",
            Self::Clima => "CLIMA",
        }
    }
}

/// Device-level capability flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeviceCapability {
    /// Device has no power state and is never switched off
    AlwaysOn,
    /// One physical bridge exposes several devices
    BridgeDevice,
    /// The user may add the device more than once
    AddAnotherDevice,
    /// Discovered devices carry their own capability sets
    DynamicDevice,
}

impl DeviceCapability {
    /// Whether the brain needs a discovery handler to use this capability
    #[must_use]
    pub const fn requires_discovery(self) -> bool {
        matches!(self, Self::BridgeDevice | Self::AddAnotherDevice)
    }
}

/// Delays the brain waits around power and input changes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timing {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power_on_delay_ms: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shutdown_delay_ms: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_switch_delay_ms: Option<u32>,
}

/// Kind of value a sensor reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    #[default]
    Range,
    Binary,
    String,
    Power,
    Custom,
}

/// Rendered size of an image component
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSize {
    #[default]
    Small,
    Large,
}

/// Special role a directory plays in the brain UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DirectoryRole {
    Root,
    Queue,
}

/// What the user enters when registering the device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistrationKind {
    #[default]
    SecurityCode,
    Account,
}

/// A push button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonDef {
    pub name: String,
    pub label: Option<String>,
}

impl ButtonDef {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
        }
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// A slider with a numeric range
#[derive(Debug, Clone, PartialEq)]
pub struct SliderDef {
    pub name: String,
    pub label: Option<String>,
    pub range: [f64; 2],
    pub unit: String,
}

impl SliderDef {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            range: [0.0, 100.0],
            unit: "%".to_string(),
        }
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub const fn range(mut self, min: f64, max: f64) -> Self {
        self.range = [min, max];
        self
    }

    #[must_use]
    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }
}

/// An on/off switch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchDef {
    pub name: String,
    pub label: Option<String>,
}

impl SwitchDef {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
        }
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// A read-only sensor
#[derive(Debug, Clone, PartialEq)]
pub struct SensorDef {
    pub name: String,
    pub label: Option<String>,
    pub kind: SensorKind,
    pub range: Option<[f64; 2]>,
    pub unit: Option<String>,
}

impl SensorDef {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: SensorKind) -> Self {
        Self {
            name: name.into(),
            label: None,
            kind,
            range: None,
            unit: None,
        }
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub const fn range(mut self, min: f64, max: f64) -> Self {
        self.range = Some([min, max]);
        self
    }

    #[must_use]
    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }
}

/// A text label shown on the remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLabelDef {
    pub name: String,
    pub label: Option<String>,
    pub is_label_visible: bool,
}

impl TextLabelDef {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            is_label_visible: true,
        }
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub const fn label_visible(mut self, visible: bool) -> Self {
        self.is_label_visible = visible;
        self
    }
}

/// An image rendered from a URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUrlDef {
    pub name: String,
    pub label: Option<String>,
    pub size: ImageSize,
    pub uri: Option<String>,
}

impl ImageUrlDef {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            size: ImageSize::Small,
            uri: None,
        }
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub const fn size(mut self, size: ImageSize) -> Self {
        self.size = size;
        self
    }

    #[must_use]
    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }
}

/// A browsable directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryDef {
    pub name: String,
    pub label: Option<String>,
    pub role: Option<DirectoryRole>,
}

impl DirectoryDef {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            role: None,
        }
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub const fn role(mut self, role: DirectoryRole) -> Self {
        self.role = Some(role);
        self
    }
}

/// Texts shown while the brain runs device discovery
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub enable_dynamic_device_builder: bool,
}

/// Texts shown while the brain runs device registration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationOptions {
    #[serde(rename = "type")]
    pub kind: RegistrationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_type_wire_names() {
        assert_eq!(serde_json::to_value(DeviceType::AvReceiver).unwrap(), "AVRECEIVER");
        assert_eq!(serde_json::to_value(DeviceType::Tv).unwrap(), "TV");
        assert_eq!(DeviceType::MediaPlayer.as_str(), "MEDIAPLAYER");
    }

    #[test]
    fn only_bridge_and_add_another_require_discovery() {
        assert!(DeviceCapability::BridgeDevice.requires_discovery());
        assert!(DeviceCapability::AddAnotherDevice.requires_discovery());
        assert!(!DeviceCapability::AlwaysOn.requires_discovery());
        assert!(!DeviceCapability::DynamicDevice.requires_discovery());
    }

    #[test]
    fn slider_defaults() {
        let slider = SliderDef::new("VOLUME");
        assert_eq!(slider.range, [0.0, 100.0]);
        assert_eq!(slider.unit, "%");
    }
}
