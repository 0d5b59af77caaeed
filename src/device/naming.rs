//! Naming and validation helpers for device adapters

use sha2::{Digest, Sha256};

use crate::{Error, Result};

/// Prefix of every generated adapter id
pub const ADAPTER_ID_PREFIX: &str = "apt-";

/// Suffix appended to paired sensor names
pub const SENSOR_SUFFIX: &str = "_SENSOR";

/// Component name of the power state sensor
pub const POWER_STATE_SENSOR: &str = "powerstate";

/// Number of hex characters kept from the digest
const ADAPTER_HASH_LEN: usize = 40;

/// Derive a stable adapter id from a device's identity
///
/// Fields are NUL-separated so shifting characters between them changes the id.
#[must_use]
pub fn adapter_id(name: &str, manufacturer: &str, device_type: &str) -> String {
    let mut hasher = Sha256::new();
    for field in [name, manufacturer, device_type] {
        hasher.update(field.as_bytes());
        hasher.update([0u8]);
    }
    let digest = hex::encode(hasher.finalize());
    format!("{ADAPTER_ID_PREFIX}{}", &digest[..ADAPTER_HASH_LEN])
}

/// Name of the sensor paired with a component
#[must_use]
pub fn sensor_name(name: &str) -> String {
    if name.ends_with(SENSOR_SUFFIX) {
        name.to_string()
    } else {
        format!("{name}{SENSOR_SUFFIX}")
    }
}

/// Path under which a component is reachable
#[must_use]
pub fn component_path(adapter_name: &str, component_name: &str) -> String {
    format!(
        "/device/{adapter_name}/{}",
        urlencoding::encode(component_name)
    )
}

/// Reject empty component names
///
/// # Errors
///
/// Returns `INVALID_COMPONENT_NAME` when the name is blank
pub fn validate_component_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::InvalidComponentName(format!("'{name}'")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_id_is_stable_and_prefixed() {
        let a = adapter_id("Lamp", "Acme", "LIGHT");
        let b = adapter_id("Lamp", "Acme", "LIGHT");
        assert_eq!(a, b);
        assert!(a.starts_with(ADAPTER_ID_PREFIX));
        assert_eq!(a.len(), ADAPTER_ID_PREFIX.len() + ADAPTER_HASH_LEN);
        assert_ne!(a, adapter_id("Lamp", "Acme", "TV"));
    }

    #[test]
    fn adapter_id_fields_do_not_run_together() {
        assert_ne!(
            adapter_id("Lamp", "Acme", "LIGHT"),
            adapter_id("LampA", "cme", "LIGHT")
        );
        assert_ne!(
            adapter_id("Lamp", "", "LIGHT"),
            adapter_id("", "Lamp", "LIGHT")
        );
    }

    #[test]
    fn sensor_suffix_is_not_doubled() {
        assert_eq!(sensor_name("POWER"), "POWER_SENSOR");
        assert_eq!(sensor_name("TEMP_SENSOR"), "TEMP_SENSOR");
    }

    #[test]
    fn paths_encode_component_names() {
        assert_eq!(component_path("apt-1", "POWER"), "/device/apt-1/POWER");
        assert_eq!(component_path("apt-1", "PLAY PAUSE"), "/device/apt-1/PLAY%20PAUSE");
    }

    #[test]
    fn blank_names_are_rejected() {
        assert!(validate_component_name("  ").is_err());
        assert!(validate_component_name("VOLUME").is_ok());
    }
}
