//! Configuration management for the Brain SDK

pub mod file;

use std::time::Duration;

use serde::Serialize;

use crate::{Error, Result};

/// Default brain REST API port
pub const DEFAULT_BRAIN_PORT: u16 = 3000;

/// Default adapter server port
pub const DEFAULT_SERVER_PORT: u16 = 6336;

/// Default brain lookup duration
pub const DEFAULT_LOOKUP_DURATION_MS: u64 = 10_000;

/// Default firmware range a brain must satisfy
pub const DEFAULT_VERSION_SATISFACTION: &str = ">=0.49.0";

/// Default outbound request timeout
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 8_000;

/// Default maximum notifications in flight
pub const DEFAULT_MAX_QUEUE_SIZE: usize = 20;

/// Default maximum cached sensor values
pub const DEFAULT_MAX_CACHED_VALUES: usize = 80;

/// Brain SDK configuration
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Brain connection configuration
    pub brain: BrainConfig,

    /// Adapter HTTP server configuration
    pub server: ServerConfig,

    /// Brain discovery configuration
    pub discovery: DiscoveryConfig,

    /// Notification pipeline configuration
    pub notifications: NotificationConfig,
}

/// Brain connection configuration
#[derive(Debug, Clone, Serialize)]
pub struct BrainConfig {
    /// Fixed brain host; discovery runs when unset
    pub host: Option<String>,

    /// Brain REST API port
    pub port: u16,

    /// Outbound request timeout
    pub request_timeout: Duration,
}

/// Adapter HTTP server configuration
#[derive(Debug, Clone, Serialize)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,

    /// Base URL announced to the brain (derived from the local IP when unset)
    pub base_url: Option<String>,
}

/// Brain discovery configuration
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryConfig {
    /// How long to look for a brain
    pub lookup_duration: Duration,

    /// Semver range the brain firmware must satisfy
    pub version_satisfaction: String,

    /// Restrict discovery to one network interface
    pub interface: Option<String>,
}

/// Notification pipeline configuration
#[derive(Debug, Clone, Serialize)]
pub struct NotificationConfig {
    /// Maximum notifications in flight
    pub max_queue_size: usize,

    /// Maximum cached sensor values before the cache is cleared
    pub max_cached_values: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            brain: BrainConfig {
                host: None,
                port: DEFAULT_BRAIN_PORT,
                request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            },
            server: ServerConfig {
                port: DEFAULT_SERVER_PORT,
                base_url: None,
            },
            discovery: DiscoveryConfig::default(),
            notifications: NotificationConfig::default(),
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            lookup_duration: Duration::from_millis(DEFAULT_LOOKUP_DURATION_MS),
            version_satisfaction: DEFAULT_VERSION_SATISFACTION.to_string(),
            interface: None,
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            max_queue_size: DEFAULT_MAX_QUEUE_SIZE,
            max_cached_values: DEFAULT_MAX_CACHED_VALUES,
        }
    }
}

impl Config {
    /// Load configuration (env > toml > default)
    ///
    /// # Errors
    ///
    /// Returns error if the configured version range is not valid semver
    pub fn load() -> Result<Self> {
        Self::from_file(file::load_config_file())
    }

    /// Resolve configuration from a parsed config file, letting env vars win
    ///
    /// # Errors
    ///
    /// Returns error if the configured version range is not valid semver
    pub fn from_file(fc: file::SdkConfigFile) -> Result<Self> {
        let brain = BrainConfig {
            host: env_string("BRAIN_SDK_BRAIN_HOST").or(fc.brain.host),
            port: env_parse("BRAIN_SDK_BRAIN_PORT")
                .or(fc.brain.port)
                .unwrap_or(DEFAULT_BRAIN_PORT),
            request_timeout: Duration::from_millis(
                env_parse("BRAIN_SDK_REQUEST_TIMEOUT_MS")
                    .or(fc.brain.request_timeout_ms)
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS),
            ),
        };

        let server = ServerConfig {
            port: env_parse("BRAIN_SDK_SERVER_PORT")
                .or(fc.server.port)
                .unwrap_or(DEFAULT_SERVER_PORT),
            base_url: env_string("BRAIN_SDK_BASE_URL").or(fc.server.base_url),
        };

        let version_satisfaction = env_string("BRAIN_SDK_VERSION_SATISFACTION")
            .or(fc.discovery.version_satisfaction)
            .unwrap_or_else(|| DEFAULT_VERSION_SATISFACTION.to_string());
        semver::VersionReq::parse(&version_satisfaction).map_err(|e| {
            Error::Config(format!("invalid version range '{version_satisfaction}': {e}"))
        })?;

        let discovery = DiscoveryConfig {
            lookup_duration: Duration::from_millis(
                env_parse("BRAIN_SDK_LOOKUP_DURATION_MS")
                    .or(fc.discovery.lookup_duration_ms)
                    .unwrap_or(DEFAULT_LOOKUP_DURATION_MS),
            ),
            version_satisfaction,
            interface: env_string("BRAIN_SDK_INTERFACE").or(fc.discovery.interface),
        };

        let notifications = NotificationConfig {
            max_queue_size: env_parse("BRAIN_SDK_MAX_QUEUE_SIZE")
                .or(fc.notifications.max_queue_size)
                .unwrap_or(DEFAULT_MAX_QUEUE_SIZE),
            max_cached_values: env_parse("BRAIN_SDK_MAX_CACHED_VALUES")
                .or(fc.notifications.max_cached_values)
                .unwrap_or(DEFAULT_MAX_CACHED_VALUES),
        };

        Ok(Self {
            brain,
            server,
            discovery,
            notifications,
        })
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = env_string(key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparsable environment value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.brain.port, 3000);
        assert_eq!(config.server.port, 6336);
        assert_eq!(config.discovery.lookup_duration, Duration::from_secs(10));
        assert_eq!(config.notifications.max_queue_size, 20);
        assert!(semver::VersionReq::parse(&config.discovery.version_satisfaction).is_ok());
    }

    #[test]
    fn file_values_overlay_defaults() {
        let fc: file::SdkConfigFile = toml::from_str(
            r#"
            [server]
            port = 7000

            [notifications]
            max_queue_size = 5
            "#,
        )
        .unwrap();

        let config = Config::from_file(fc).unwrap();
        assert_eq!(config.server.port, 7000);
        assert_eq!(config.notifications.max_queue_size, 5);
        assert_eq!(config.notifications.max_cached_values, DEFAULT_MAX_CACHED_VALUES);
    }

    #[test]
    fn invalid_version_range_is_rejected() {
        let fc: file::SdkConfigFile = toml::from_str(
            r#"
            [discovery]
            version_satisfaction = "not a range"
            "#,
        )
        .unwrap();

        let err = Config::from_file(fc).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
