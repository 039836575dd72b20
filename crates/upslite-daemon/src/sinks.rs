//! Sinks that write published values to the log or stdout

use serde_json::json;
use tracing::info;
use upslite_config::{OutputFormat, SensorMeta};
use upslite_hal::{BinarySink, NumericSink};

/// Round to a sensor's declared precision
pub fn round_to(value: f32, decimals: u8) -> f64 {
    let factor = 10f64.powi(i32::from(decimals));
    (f64::from(value) * factor).round() / factor
}

/// One JSON line for a published value
pub fn json_line(device_id: &str, meta: &SensorMeta, value: serde_json::Value) -> String {
    json!({
        "device": device_id,
        "sensor": meta.name,
        "device_class": meta.device_class,
        "unit": meta.unit,
        "value": value,
    })
    .to_string()
}

pub fn numeric_sink(device_id: &str, meta: SensorMeta, output: OutputFormat) -> NumericSink {
    let device_id = device_id.to_string();
    Box::new(move |value: f32| match output {
        OutputFormat::Log => info!(
            "{}: {:.*} {}",
            meta.name,
            usize::from(meta.accuracy_decimals),
            value,
            meta.unit.as_deref().unwrap_or("")
        ),
        OutputFormat::Json => println!(
            "{}",
            json_line(&device_id, &meta, json!(round_to(value, meta.accuracy_decimals)))
        ),
    })
}

pub fn binary_sink(device_id: &str, meta: SensorMeta, output: OutputFormat) -> BinarySink {
    let device_id = device_id.to_string();
    Box::new(move |state: bool| match output {
        OutputFormat::Log => info!("{}: {}", meta.name, if state { "ON" } else { "OFF" }),
        OutputFormat::Json => println!("{}", json_line(&device_id, &meta, json!(state))),
    })
}
