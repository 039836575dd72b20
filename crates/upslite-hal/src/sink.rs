//! Downstream consumers of published readings

use crate::telemetry::Reading;
use crate::{Result, UpsError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Receives a numeric value (volts or percent)
pub type NumericSink = Box<dyn FnMut(f32) + Send>;

/// Receives the power-present status
pub type BinarySink = Box<dyn FnMut(bool) + Send>;

/// The three sink slots a device offers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkKind {
    Voltage,
    Level,
    Status,
}

impl SinkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SinkKind::Voltage => "voltage",
            SinkKind::Level => "level",
            SinkKind::Status => "status",
        }
    }
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional sinks bound to one device, each at most once
#[derive(Default)]
pub struct ObserverBinding {
    voltage: Option<NumericSink>,
    level: Option<NumericSink>,
    status: Option<BinarySink>,
}

impl ObserverBinding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind_voltage(&mut self, sink: NumericSink) -> Result<()> {
        bind(&mut self.voltage, sink, SinkKind::Voltage)
    }

    pub fn bind_level(&mut self, sink: NumericSink) -> Result<()> {
        bind(&mut self.level, sink, SinkKind::Level)
    }

    pub fn bind_status(&mut self, sink: BinarySink) -> Result<()> {
        bind(&mut self.status, sink, SinkKind::Status)
    }

    pub fn is_bound(&self, kind: SinkKind) -> bool {
        match kind {
            SinkKind::Voltage => self.voltage.is_some(),
            SinkKind::Level => self.level.is_some(),
            SinkKind::Status => self.status.is_some(),
        }
    }

    /// Kinds with a sink attached
    pub fn bound(&self) -> Vec<SinkKind> {
        [SinkKind::Voltage, SinkKind::Level, SinkKind::Status]
            .into_iter()
            .filter(|kind| self.is_bound(*kind))
            .collect()
    }

    /// Hand a reading to every bound sink
    pub fn publish(&mut self, reading: &Reading) {
        if let Some(sink) = self.voltage.as_mut() {
            sink(reading.voltage);
        }
        if let Some(sink) = self.level.as_mut() {
            sink(reading.level);
        }
        if let Some(sink) = self.status.as_mut() {
            sink(reading.power_present);
        }
    }
}

fn bind<S>(slot: &mut Option<S>, sink: S, kind: SinkKind) -> Result<()> {
    if slot.is_some() {
        return Err(UpsError::SinkAlreadyBound(kind));
    }
    *slot = Some(sink);
    Ok(())
}

impl fmt::Debug for ObserverBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.bound()).finish()
    }
}
