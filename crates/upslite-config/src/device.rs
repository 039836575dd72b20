//! Per-device configuration

use crate::ConfigError;
use crate::sensor::SensorDecl;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use upslite_hal::{DeviceConfig, LevelSource, LinearCurve, PiecewiseCurve};

/// How the battery level is obtained
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LevelSourceConfig {
    /// Read the gauge's SOC register
    #[default]
    FuelGauge,
    /// Straight line between two voltages
    Linear { empty_volts: f32, full_volts: f32 },
    /// `[volts, percent]` points, increasing in volts
    Curve { points: Vec<[f32; 2]> },
}

impl LevelSourceConfig {
    pub fn build(&self) -> Result<LevelSource, upslite_hal::UpsError> {
        Ok(match self {
            LevelSourceConfig::FuelGauge => LevelSource::FuelGauge,
            LevelSourceConfig::Linear {
                empty_volts,
                full_volts,
            } => LevelSource::Curve(Box::new(LinearCurve::new(*empty_volts, *full_volts)?)),
            LevelSourceConfig::Curve { points } => {
                let points = points.iter().map(|[v, p]| (*v, *p)).collect();
                LevelSource::Curve(Box::new(PiecewiseCurve::new(points)?))
            }
        })
    }
}

/// One `[[device]]` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSettings {
    /// Unique identifier
    pub id: String,

    /// I2C character device
    #[serde(default = "default_i2c_bus")]
    pub i2c_bus: PathBuf,

    /// 7-bit bus address
    #[serde(default = "default_address")]
    pub address: u8,

    /// Seconds between polls
    #[serde(default = "default_update_interval")]
    pub update_interval_secs: u64,

    /// GPIO line reporting external power
    #[serde(default = "default_power_pin")]
    pub power_pin: u64,

    /// External power reads as a low level
    #[serde(default)]
    pub power_active_low: bool,

    /// Agreeing polls before the power status flips
    #[serde(default = "default_debounce_polls")]
    pub debounce_polls: u8,

    #[serde(default)]
    pub level_source: LevelSourceConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_voltage: Option<SensorDecl>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_level: Option<SensorDecl>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ups_status: Option<SensorDecl>,
}

fn default_i2c_bus() -> PathBuf {
    PathBuf::from("/dev/i2c-1")
}

fn default_address() -> u8 {
    upslite_hal::DEFAULT_ADDRESS
}

fn default_update_interval() -> u64 {
    upslite_hal::DEFAULT_UPDATE_INTERVAL.as_secs()
}

fn default_power_pin() -> u64 {
    4
}

fn default_debounce_polls() -> u8 {
    upslite_hal::DEFAULT_DEBOUNCE_POLLS
}

impl DeviceSettings {
    /// Settings with every optional field at its default
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            i2c_bus: default_i2c_bus(),
            address: default_address(),
            update_interval_secs: default_update_interval(),
            power_pin: default_power_pin(),
            power_active_low: false,
            debounce_polls: default_debounce_polls(),
            level_source: LevelSourceConfig::default(),
            battery_voltage: None,
            battery_level: None,
            ups_status: None,
        }
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_secs)
    }

    /// Driver configuration for this device, validated
    pub fn to_device_config(&self) -> Result<DeviceConfig, ConfigError> {
        let invalid = |e: upslite_hal::UpsError| ConfigError::Invalid(format!("{}: {e}", self.id));

        let config = DeviceConfig::new(self.id.clone())
            .with_address(self.address)
            .with_update_interval(self.update_interval())
            .with_debounce_polls(self.debounce_polls)
            .with_level_source(self.level_source.build().map_err(invalid)?);
        config.validate().map_err(invalid)?;

        Ok(config)
    }
}
