//! Adapter-to-brain notifications
//!
//! ```text
//! NotificationHandle -> NotificationGateway -> NotificationKeyResolver
//!                              |                        |
//!                              v                        v
//!                      POST /v1/notifications   GET /v1/api/notificationkey/..
//! ```

pub mod cache;
pub mod gateway;
pub mod handle;
pub mod keys;
pub mod message;
pub mod subscriptions;

pub use cache::SensorValueCache;
pub use gateway::{NotificationGateway, SendOutcome};
pub use handle::NotificationHandle;
pub use keys::{ComponentKey, NotificationKeyResolver};
pub use message::{NotificationMessage, NotificationPayload};
pub use subscriptions::{RetryPolicy, fetch_subscriptions};

/// Notification type of sensor updates
pub const SENSOR_UPDATE_TYPE: &str = "DEVICE_SENSOR_UPDATE";

/// Device id used when a message does not name one
pub const DEFAULT_DEVICE_ID: &str = "default";
