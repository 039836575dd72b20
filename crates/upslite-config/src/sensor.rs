//! Sensor declarations
//!
//! Measurement metadata (unit, precision, classification) is carried through
//! to the sinks untouched; the driver itself never interprets it.

use serde::{Deserialize, Serialize};
use upslite_hal::SinkKind;

/// Optional overrides for one sensor, as written in the config file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorDecl {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy_decimals: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_class: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_class: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_category: Option<String>,
}

/// Fully resolved sensor metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SensorMeta {
    pub name: String,
    pub unit: Option<String>,
    pub accuracy_decimals: u8,
    pub device_class: String,
    pub state_class: Option<String>,
    pub entity_category: String,
}

impl SensorMeta {
    /// Defaults for each sensor slot
    pub fn defaults(kind: SinkKind, device_id: &str) -> Self {
        match kind {
            SinkKind::Voltage => Self {
                name: format!("{device_id} Battery Voltage"),
                unit: Some("V".to_string()),
                accuracy_decimals: 3,
                device_class: "voltage".to_string(),
                state_class: Some("measurement".to_string()),
                entity_category: "diagnostic".to_string(),
            },
            SinkKind::Level => Self {
                name: format!("{device_id} Battery Level"),
                unit: Some("%".to_string()),
                accuracy_decimals: 3,
                device_class: "battery".to_string(),
                state_class: Some("measurement".to_string()),
                entity_category: "diagnostic".to_string(),
            },
            SinkKind::Status => Self {
                name: format!("{device_id} UPS Status"),
                unit: None,
                accuracy_decimals: 0,
                device_class: "power".to_string(),
                state_class: None,
                entity_category: "diagnostic".to_string(),
            },
        }
    }
}

impl SensorDecl {
    /// Fill unset fields from the slot defaults
    pub fn resolve(&self, kind: SinkKind, device_id: &str) -> SensorMeta {
        let defaults = SensorMeta::defaults(kind, device_id);
        SensorMeta {
            name: self.name.clone().unwrap_or(defaults.name),
            unit: self.unit.clone().or(defaults.unit),
            accuracy_decimals: self.accuracy_decimals.unwrap_or(defaults.accuracy_decimals),
            device_class: self.device_class.clone().unwrap_or(defaults.device_class),
            state_class: self.state_class.clone().or(defaults.state_class),
            entity_category: self
                .entity_category
                .clone()
                .unwrap_or(defaults.entity_category),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_per_slot() {
        let voltage = SensorDecl::default().resolve(SinkKind::Voltage, "ups");
        assert_eq!(voltage.unit.as_deref(), Some("V"));
        assert_eq!(voltage.accuracy_decimals, 3);
        assert_eq!(voltage.device_class, "voltage");

        let level = SensorDecl::default().resolve(SinkKind::Level, "ups");
        assert_eq!(level.unit.as_deref(), Some("%"));
        assert_eq!(level.device_class, "battery");

        let status = SensorDecl::default().resolve(SinkKind::Status, "ups");
        assert_eq!(status.unit, None);
        assert_eq!(status.device_class, "power");
        assert_eq!(status.name, "ups UPS Status");
    }

    #[test]
    fn test_overrides_win() {
        let decl = SensorDecl {
            name: Some("Pi UPS".into()),
            accuracy_decimals: Some(1),
            ..Default::default()
        };
        let meta = decl.resolve(SinkKind::Voltage, "ups");
        assert_eq!(meta.name, "Pi UPS");
        assert_eq!(meta.accuracy_decimals, 1);
        assert_eq!(meta.entity_category, "diagnostic");
    }
}
