//! TOML configuration file loading
//!
//! Supports `~/.config/brain-sdk/config.toml` as a persistent config source.
//! All fields are optional and the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct SdkConfigFile {
    /// Brain connection settings
    #[serde(default)]
    pub brain: BrainFileConfig,

    /// Adapter HTTP server settings
    #[serde(default)]
    pub server: ServerFileConfig,

    /// Brain discovery settings
    #[serde(default)]
    pub discovery: DiscoveryFileConfig,

    /// Notification pipeline settings
    #[serde(default)]
    pub notifications: NotificationsFileConfig,
}

/// Brain connection configuration
#[derive(Debug, Default, Deserialize)]
pub struct BrainFileConfig {
    /// Fixed brain host, skips discovery when set
    pub host: Option<String>,

    /// Brain REST API port
    pub port: Option<u16>,

    /// Outbound request timeout in milliseconds
    pub request_timeout_ms: Option<u64>,
}

/// Adapter server configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// Port the adapter listens on
    pub port: Option<u16>,

    /// Base URL announced to the brain
    pub base_url: Option<String>,
}

/// Discovery configuration
#[derive(Debug, Default, Deserialize)]
pub struct DiscoveryFileConfig {
    /// How long to look for a brain, in milliseconds
    pub lookup_duration_ms: Option<u64>,

    /// Semver range the brain firmware must satisfy
    pub version_satisfaction: Option<String>,

    /// Restrict discovery to one network interface
    pub interface: Option<String>,
}

/// Notification configuration
#[derive(Debug, Default, Deserialize)]
pub struct NotificationsFileConfig {
    /// Maximum notifications in flight
    pub max_queue_size: Option<usize>,

    /// Maximum cached sensor values before the cache is cleared
    pub max_cached_values: Option<usize>,
}

/// Load the TOML config file from the standard path
///
/// Returns `SdkConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> SdkConfigFile {
    config_file_path().map_or_else(SdkConfigFile::default, |path| load_from(&path))
}

/// Load a TOML config file from an explicit path
pub fn load_from(path: &Path) -> SdkConfigFile {
    if !path.exists() {
        return SdkConfigFile::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                SdkConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            SdkConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/brain-sdk/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("brain-sdk").join("config.toml"))
}
