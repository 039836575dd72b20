//! MAX17043 telemetry decoding
//!
//! Converts raw fuel-gauge register words into calibrated values. Register
//! addresses and scale factors follow the MAX17043 datasheet
//! (<https://www.analog.com/en/products/max17043.html>).

use crate::{Result, UpsError};
use serde::Serialize;
use std::fmt;

/// Cell voltage register, 12-bit value in the upper bits
pub const VCELL: u8 = 0x02;
/// State-of-charge register, 1/256 % resolution
pub const SOC: u8 = 0x04;
/// Configuration register (compensation, sleep, alert)
pub const CONFIG: u8 = 0x0C;

/// CONFIG value after power-up
pub const CONFIG_POWER_UP_DEFAULT: u16 = 0x971C;
/// Masks out the sleep bit (7), unused bit (6) and alert bit (5)
pub const CONFIG_SAFE_MASK: u16 = 0xFF1F;
/// Sleep bit in CONFIG
pub const CONFIG_SLEEP_MASK: u16 = 0x0080;

/// VCELL resolution in millivolts per count
const VCELL_MV_PER_COUNT: f32 = 1.25;

/// Raw register words captured during one poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawTelemetry {
    pub vcell: u16,
    /// `None` when the level comes from a voltage curve
    pub soc: Option<u16>,
}

/// One published snapshot
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reading {
    /// Battery voltage in volts
    pub voltage: f32,
    /// Battery level in percent
    pub level: f32,
    /// External power present
    pub power_present: bool,
}

/// Cell voltage in volts from a raw VCELL word
pub fn decode_voltage(raw: u16) -> f32 {
    VCELL_MV_PER_COUNT * f32::from(raw >> 4) / 1000.0
}

/// State of charge in percent from a raw SOC word
pub fn decode_soc(raw: u16) -> f32 {
    f32::from(raw >> 8) + f32::from(raw & 0x00FF) / 256.0
}

/// Round to the three decimals sensors report
pub fn round3(value: f32) -> f32 {
    (value * 1000.0).round() / 1000.0
}

/// Maps a cell voltage to a charge percentage
///
/// Implementations must be monotonic non-decreasing in `volts`. Callers go
/// through [`VoltageToPercent::clamped`], which bounds the result to
/// `[0, 100]`.
pub trait VoltageToPercent: Send {
    fn percent(&self, volts: f32) -> f32;

    fn clamped(&self, volts: f32) -> f32 {
        let percent = self.percent(volts);
        if percent.is_nan() {
            return 0.0;
        }
        percent.clamp(0.0, 100.0)
    }
}

impl<F> VoltageToPercent for F
where
    F: Fn(f32) -> f32 + Send,
{
    fn percent(&self, volts: f32) -> f32 {
        self(volts)
    }
}

/// Straight line between an empty and a full cell voltage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearCurve {
    pub empty_volts: f32,
    pub full_volts: f32,
}

impl LinearCurve {
    pub fn new(empty_volts: f32, full_volts: f32) -> Result<Self> {
        if !(empty_volts.is_finite() && full_volts.is_finite()) || empty_volts >= full_volts {
            return Err(UpsError::InvalidConfig(format!(
                "linear curve needs empty < full, got {empty_volts} V .. {full_volts} V"
            )));
        }
        Ok(Self {
            empty_volts,
            full_volts,
        })
    }
}

impl Default for LinearCurve {
    /// Nominal single-cell Li-ion discharge window
    fn default() -> Self {
        Self {
            empty_volts: 3.0,
            full_volts: 4.2,
        }
    }
}

impl VoltageToPercent for LinearCurve {
    fn percent(&self, volts: f32) -> f32 {
        (volts - self.empty_volts) / (self.full_volts - self.empty_volts) * 100.0
    }
}

/// Piecewise-linear discharge curve through `(volts, percent)` points
#[derive(Debug, Clone, PartialEq)]
pub struct PiecewiseCurve {
    points: Vec<(f32, f32)>,
}

impl PiecewiseCurve {
    /// Points must be strictly increasing in volts and non-decreasing in percent
    pub fn new(points: Vec<(f32, f32)>) -> Result<Self> {
        if points.len() < 2 {
            return Err(UpsError::InvalidConfig(
                "curve needs at least two points".to_string(),
            ));
        }
        if points.iter().any(|(v, p)| !v.is_finite() || !p.is_finite()) {
            return Err(UpsError::InvalidConfig(
                "curve points must be finite".to_string(),
            ));
        }
        for pair in points.windows(2) {
            let ((v0, p0), (v1, p1)) = (pair[0], pair[1]);
            if v1 <= v0 {
                return Err(UpsError::InvalidConfig(format!(
                    "curve voltages must increase ({v0} V then {v1} V)"
                )));
            }
            if p1 < p0 {
                return Err(UpsError::InvalidConfig(format!(
                    "curve percentages must not decrease ({p0} % then {p1} %)"
                )));
            }
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[(f32, f32)] {
        &self.points
    }
}

impl VoltageToPercent for PiecewiseCurve {
    fn percent(&self, volts: f32) -> f32 {
        // new() guarantees at least two points
        let (first_v, first_p) = self.points[0];
        let (last_v, last_p) = self.points[self.points.len() - 1];

        if volts <= first_v {
            return first_p;
        }
        if volts >= last_v {
            return last_p;
        }

        for pair in self.points.windows(2) {
            let ((v0, p0), (v1, p1)) = (pair[0], pair[1]);
            if volts <= v1 {
                return p0 + (volts - v0) / (v1 - v0) * (p1 - p0);
            }
        }
        last_p
    }
}

/// Where the battery level comes from
#[derive(Default)]
pub enum LevelSource {
    /// The fuel gauge's own SOC register
    #[default]
    FuelGauge,
    /// A voltage-to-percent mapping; the SOC register is not read
    Curve(Box<dyn VoltageToPercent>),
}

impl LevelSource {
    pub fn reads_soc(&self) -> bool {
        matches!(self, LevelSource::FuelGauge)
    }
}

impl fmt::Debug for LevelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelSource::FuelGauge => f.write_str("FuelGauge"),
            LevelSource::Curve(_) => f.write_str("Curve(..)"),
        }
    }
}

/// Pure conversion from raw telemetry to a [`Reading`]
#[derive(Debug, Default)]
pub struct TelemetryDecoder {
    level: LevelSource,
}

impl TelemetryDecoder {
    pub fn new(level: LevelSource) -> Self {
        Self { level }
    }

    pub fn level_source(&self) -> &LevelSource {
        &self.level
    }

    /// Decode one poll's worth of raw data
    ///
    /// A failed capture yields [`UpsError::NoReading`] wrapping the cause;
    /// nothing is made up in its place.
    pub fn decode(&self, raw: Result<RawTelemetry>, power_present: bool) -> Result<Reading> {
        let raw = raw.map_err(|cause| UpsError::NoReading(Box::new(cause)))?;
        let voltage = decode_voltage(raw.vcell);

        let level = match (&self.level, raw.soc) {
            (LevelSource::FuelGauge, Some(soc)) => decode_soc(soc).clamp(0.0, 100.0),
            (LevelSource::FuelGauge, None) => {
                return Err(UpsError::NoReading(Box::new(UpsError::ShortRead {
                    expected: 2,
                    got: 0,
                })));
            }
            (LevelSource::Curve(curve), _) => curve.clamped(voltage),
        };

        Ok(Reading {
            voltage: round3(voltage),
            level: round3(level),
            power_present,
        })
    }
}
