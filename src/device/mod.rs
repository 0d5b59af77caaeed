//! Device adapter declarations
//!
//! A device adapter declares its controls through [`DeviceBuilder`]; building
//! it derives the path-addressable capability table the brain talks to.

pub mod builder;
pub mod controller;
pub mod naming;
pub mod types;

pub use builder::{AdapterDefinition, DeviceAdapter, DeviceBuilder, DeviceSpec};
pub use controller::{
    AccessorController, Controller, DirectoryController, RegistrationController,
    SubscriptionController,
};
pub use types::{
    ButtonDef, DeviceCapability, DeviceType, DirectoryDef, DirectoryRole, DiscoveryOptions,
    ImageSize, ImageUrlDef, RegistrationKind, RegistrationOptions, SensorDef, SensorKind,
    SliderDef, SwitchDef, TextLabelDef, Timing,
};
