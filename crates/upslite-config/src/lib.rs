//! Configuration management for upslite
//!
//! Handles the daemon settings and the per-device declarations: identifier,
//! bus address, polling interval and the three optional sensors. Files are
//! TOML; [`UpsConfig::load_layered`] additionally applies `UPSLITE__*`
//! environment overrides.

mod device;
mod sensor;

pub use device::{DeviceSettings, LevelSourceConfig};
pub use sensor::{SensorDecl, SensorMeta};

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Configuration source error: {0}")]
    Source(#[from] config::ConfigError),
}

/// Standard configuration location
pub const CONFIG_DIR: &str = "/etc/upslite";
pub const DEFAULT_CONFIG_FILE: &str = "/etc/upslite/config.toml";

/// Prefix for environment overrides, e.g. `UPSLITE__LOG_LEVEL=debug`
pub const ENV_PREFIX: &str = "UPSLITE";

/// How published values are written out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human readable log lines
    #[default]
    Log,
    /// One JSON object per value on stdout
    Json,
}

/// Top-level configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpsConfig {
    /// Default tracing filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub output: OutputFormat,

    #[serde(default, rename = "device")]
    pub devices: Vec<DeviceSettings>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for UpsConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            output: OutputFormat::default(),
            devices: vec![DeviceSettings::new("ups")],
        }
    }
}

impl UpsConfig {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load a file and apply `UPSLITE__*` environment overrides on top
    pub fn load_layered(path: &Path) -> Result<Self, ConfigError> {
        Self::load_with_overrides(path, None)
    }

    /// Like [`UpsConfig::load_layered`], reading overrides from `vars`
    /// instead of the process environment when given
    pub fn load_with_overrides(
        path: &Path,
        vars: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let environment = config::Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .source(vars);
        let config = config::Config::builder()
            .add_source(config::File::from(path).format(config::FileFormat::Toml))
            .add_source(environment)
            .build()?;
        Ok(config.try_deserialize::<Self>()?)
    }

    /// Load from the default location, falling back to built-in defaults
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = Path::new(DEFAULT_CONFIG_FILE);
        if path.exists() {
            return Self::load_layered(path);
        }

        tracing::warn!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, contents)?;
        tracing::info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Check every device and that identifiers are unique
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.devices.is_empty() {
            return Err(ConfigError::Invalid("no devices configured".to_string()));
        }

        let mut seen = HashSet::new();
        for device in &self.devices {
            if !seen.insert(device.id.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate device id '{}'",
                    device.id
                )));
            }
            device.to_device_config()?;
        }
        Ok(())
    }

    pub fn device(&self, id: &str) -> Option<&DeviceSettings> {
        self.devices.iter().find(|d| d.id == id)
    }
}
