//! Everything that talks to the brain
//!
//! - [`client`]: REST endpoints of a brain
//! - [`mdns`] and [`discovery`]: finding a brain on the local network
//! - [`session`]: serving adapters to a brain

pub mod client;
pub mod discovery;
pub mod mdns;
pub mod session;

pub use client::{BrainApi, HttpRestClient, RestClient};
pub use discovery::{DiscoveryEngine, local_interfaces, parse_firmware_version};
pub use mdns::{MdnsBrowser, SERVICE_TYPE, ServiceBrowser, ServiceRecord};
pub use session::BrainSession;
