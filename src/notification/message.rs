//! Notification messages and outbound payloads

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{DEFAULT_DEVICE_ID, SENSOR_UPDATE_TYPE};
use crate::{Error, Result};

/// State change pushed by an adapter
///
/// A mapped message needs `unique_device_id`, `component` and `value`; the
/// component name is translated into event keys before sending. A raw
/// message is forwarded as `{type, data}` without key resolution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationMessage {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default)]
    pub raw: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_device_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
}

impl NotificationMessage {
    /// Component value update, resolved through event keys
    #[must_use]
    pub fn component_update(
        unique_device_id: impl Into<String>,
        component: impl Into<String>,
        value: Value,
    ) -> Self {
        Self {
            unique_device_id: Some(unique_device_id.into()),
            component: Some(component.into()),
            value: Some(value),
            ..Self::default()
        }
    }

    /// Sensor update, sent as `DEVICE_SENSOR_UPDATE` with `{sensorEventKey, sensorValue}`
    #[must_use]
    pub fn sensor_update(
        unique_device_id: impl Into<String>,
        component: impl Into<String>,
        value: Value,
    ) -> Self {
        Self {
            kind: Some(SENSOR_UPDATE_TYPE.to_string()),
            ..Self::component_update(unique_device_id, component, value)
        }
    }

    /// Message forwarded verbatim
    #[must_use]
    pub fn raw(kind: impl Into<String>, data: Value) -> Self {
        Self {
            kind: Some(kind.into()),
            data: Some(data),
            raw: true,
            ..Self::default()
        }
    }

    /// Device id within the adapter, `default` when unset
    #[must_use]
    pub fn device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    /// Payload of a raw message
    ///
    /// # Errors
    ///
    /// Returns `INVALID_NOTIFICATION_DATA` when the type is missing
    pub fn raw_payload(&self) -> Result<NotificationPayload> {
        let kind = self
            .kind
            .clone()
            .ok_or_else(|| Error::InvalidNotification("raw message without type".into()))?;
        Ok(NotificationPayload {
            kind,
            data: self.data.clone().unwrap_or(Value::Null),
        })
    }

    /// Fields of a well-formed mapped message
    ///
    /// # Errors
    ///
    /// Returns `INVALID_NOTIFICATION_DATA` when `unique_device_id`,
    /// `component` or `value` is missing
    pub fn target(&self) -> Result<NotificationTarget<'_>> {
        match (&self.unique_device_id, &self.component, &self.value) {
            (Some(unique_device_id), Some(component), Some(value)) => Ok(NotificationTarget {
                unique_device_id,
                device_id: self.device_id.as_deref().unwrap_or(DEFAULT_DEVICE_ID),
                component,
                value,
                kind: self.kind.as_deref(),
            }),
            _ => Err(Error::InvalidNotification(format!(
                "uniqueDeviceId={:?} component={:?} value present={}",
                self.unique_device_id,
                self.component,
                self.value.is_some()
            ))),
        }
    }
}

/// Borrowed view of a validated mapped message
#[derive(Debug, Clone, Copy)]
pub struct NotificationTarget<'a> {
    pub unique_device_id: &'a str,
    pub device_id: &'a str,
    pub component: &'a str,
    pub value: &'a Value,
    pub kind: Option<&'a str>,
}

impl NotificationTarget<'_> {
    /// Outbound payload for one resolved event key
    #[must_use]
    pub fn payload(&self, event_key: &str) -> NotificationPayload {
        match self.kind {
            Some(kind) => NotificationPayload {
                kind: kind.to_string(),
                data: json!({ "sensorEventKey": event_key, "sensorValue": self.value }),
            },
            None => NotificationPayload {
                kind: event_key.to_string(),
                data: self.value.clone(),
            },
        }
    }
}

/// Body POSTed to the brain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: Value,
}

impl NotificationPayload {
    /// Key under which the last sent value is remembered
    #[must_use]
    pub fn cache_key(&self) -> &str {
        self.data
            .get("sensorEventKey")
            .and_then(Value::as_str)
            .unwrap_or(&self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapped_payload_uses_event_key_as_type() {
        let message = NotificationMessage::component_update("u1", "VOLUME", json!(30));
        let target = message.target().unwrap();
        assert_eq!(target.device_id, DEFAULT_DEVICE_ID);

        let payload = target.payload("evt-1");
        assert_eq!(payload.kind, "evt-1");
        assert_eq!(payload.data, json!(30));
        assert_eq!(payload.cache_key(), "evt-1");
    }

    #[test]
    fn sensor_payload_wraps_key_and_value() {
        let message = NotificationMessage::sensor_update("u1", "VOLUME", json!(30)).device_id("d2");
        let payload = message.target().unwrap().payload("evt-1");

        assert_eq!(payload.kind, SENSOR_UPDATE_TYPE);
        assert_eq!(
            payload.data,
            json!({ "sensorEventKey": "evt-1", "sensorValue": 30 })
        );
        assert_eq!(payload.cache_key(), "evt-1");
        assert_eq!(message.target().unwrap().device_id, "d2");
    }

    #[test]
    fn malformed_messages_are_rejected() {
        let mut message = NotificationMessage::component_update("u1", "VOLUME", json!(1));
        message.value = None;
        assert_eq!(
            message.target().unwrap_err().code(),
            "INVALID_NOTIFICATION_DATA"
        );

        let raw = NotificationMessage {
            raw: true,
            ..NotificationMessage::default()
        };
        assert!(raw.raw_payload().is_err());
    }
}
