//! Per-adapter notification handle

use std::sync::Arc;

use serde_json::Value;

use super::gateway::{NotificationGateway, SendOutcome};
use super::message::NotificationMessage;
use crate::Result;
use crate::device::naming::POWER_STATE_SENSOR;

/// Handle given to an adapter's subscription function once a session runs
///
/// Cloning is cheap; all clones push through the same gateway.
#[derive(Debug, Clone)]
pub struct NotificationHandle {
    gateway: Arc<NotificationGateway>,
}

impl NotificationHandle {
    #[must_use]
    pub const fn new(gateway: Arc<NotificationGateway>) -> Self {
        Self { gateway }
    }

    /// Adapter the handle sends for
    #[must_use]
    pub fn adapter_name(&self) -> &str {
        self.gateway.adapter_name()
    }

    /// Send an arbitrary message
    ///
    /// # Errors
    ///
    /// See [`NotificationGateway::send`]
    pub async fn send(&self, message: NotificationMessage) -> Result<Vec<SendOutcome>> {
        self.gateway.send(message).await
    }

    /// Report a new component value
    ///
    /// # Errors
    ///
    /// See [`NotificationGateway::send`]
    pub async fn send_component_update(
        &self,
        unique_device_id: &str,
        component: &str,
        value: Value,
    ) -> Result<Vec<SendOutcome>> {
        self.send(NotificationMessage::component_update(
            unique_device_id,
            component,
            value,
        ))
        .await
    }

    /// Report a new sensor value as a sensor update
    ///
    /// # Errors
    ///
    /// See [`NotificationGateway::send`]
    pub async fn send_sensor_update(
        &self,
        unique_device_id: &str,
        component: &str,
        value: Value,
    ) -> Result<Vec<SendOutcome>> {
        self.send(NotificationMessage::sensor_update(
            unique_device_id,
            component,
            value,
        ))
        .await
    }

    /// Report that a device switched on
    ///
    /// # Errors
    ///
    /// See [`NotificationGateway::send`]
    pub async fn power_on(&self, unique_device_id: &str) -> Result<Vec<SendOutcome>> {
        self.send_component_update(unique_device_id, POWER_STATE_SENSOR, Value::Bool(true))
            .await
    }

    /// Report that a device switched off
    ///
    /// # Errors
    ///
    /// See [`NotificationGateway::send`]
    pub async fn power_off(&self, unique_device_id: &str) -> Result<Vec<SendOutcome>> {
        self.send_component_update(unique_device_id, POWER_STATE_SENSOR, Value::Bool(false))
            .await
    }

    /// Forward `{type, data}` verbatim
    ///
    /// # Errors
    ///
    /// See [`NotificationGateway::send`]
    pub async fn send_raw(&self, kind: &str, data: Value) -> Result<Vec<SendOutcome>> {
        self.send(NotificationMessage::raw(kind, data)).await
    }
}
