//! Brain SDK - device adapters for a home automation brain
//!
//! This library lets a program expose devices to a brain:
//! - Declaring devices and their controls ([`DeviceBuilder`])
//! - Serving capability requests from the brain over HTTP
//! - Pushing value changes back as notifications
//! - Finding a brain on the local network via mDNS
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                      Brain                           │
//! │   discovery  │  capability calls  │  notifications  │
//! └────────▲─────────────┬──────────────────▲───────────┘
//!          │ mDNS        │ HTTP             │ REST
//! ┌────────┴─────────────▼──────────────────┴───────────┐
//! │                   BrainSession                       │
//! │  api router → RequestDispatcher → user controllers  │
//! │  NotificationHandle → NotificationGateway            │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod brain;
pub mod capability;
pub mod config;
pub mod database;
pub mod device;
pub mod dispatch;
pub mod error;
pub mod list;
pub mod notification;

pub use brain::{BrainApi, BrainSession, DiscoveryEngine, ServiceRecord};
pub use capability::{CapabilityDescriptor, CapabilityHandler, CapabilityRegistry, ComponentType};
pub use config::Config;
pub use database::DeviceDatabase;
pub use device::{DeviceAdapter, DeviceBuilder, DeviceCapability, DeviceType};
pub use dispatch::{DiscoveredDevice, DiscoveryResult, RequestDispatcher};
pub use error::{Error, Result};
pub use list::{ListBuilder, ListItem, ListParams};
pub use notification::{NotificationHandle, NotificationMessage, SendOutcome};
