//! Hardware Abstraction Layer for 18650 UPS hats
//!
//! This crate drives the MAX17043 fuel gauge found on "UPS Lite" style battery
//! hats for single-board computers, together with the GPIO line that reports
//! whether external power is present.
//!
//! # Components
//!
//! - [`bus`]: synchronous 8/16-bit register access over I2C
//! - [`telemetry`]: raw register values to volts, percent and power status
//! - [`scheduler`]: the `Idle -> Polling -> Publishing | Failed` poll cycle
//! - [`debounce`]: filters flapping on the power-present line
//! - [`device`]: ties the above together into one polled component
//!
//! # Example
//!
//! ```no_run
//! use std::time::Instant;
//! use upslite_hal::mock::{MockBus, MockPin};
//! use upslite_hal::{DeviceConfig, I2cRegisterIo, PinPowerSense, UpsDevice};
//!
//! fn main() -> upslite_hal::Result<()> {
//!     let config = DeviceConfig::new("ups");
//!     let io = I2cRegisterIo::new(MockBus::max17043(config.address), config.address);
//!     let power = PinPowerSense::new(MockPin::new(true), false);
//!
//!     let mut device = UpsDevice::new(config, io, power)?;
//!     device.set_voltage_sensor(Box::new(|volts: f32| println!("battery: {volts:.3} V")))?;
//!     device.setup()?;
//!     device.tick(Instant::now());
//!     Ok(())
//! }
//! ```

pub mod bus;
pub mod command;
pub mod debounce;
pub mod device;
pub mod error;
pub mod mock;
pub mod registry;
pub mod scheduler;
pub mod sink;
pub mod telemetry;

pub use bus::{I2cRegisterIo, RegisterIo};
pub use command::Command;
pub use debounce::PowerStatusDebouncer;
pub use device::{
    Component, DeviceConfig, Health, PinPowerSense, PowerSense, UpsDevice, DEFAULT_ADDRESS,
    DEFAULT_DEBOUNCE_POLLS, DEFAULT_UPDATE_INTERVAL,
};
pub use error::UpsError;
pub use registry::DeviceRegistry;
pub use scheduler::{FailureEvent, PollScheduler, PollState, TickOutcome};
pub use sink::{BinarySink, NumericSink, ObserverBinding, SinkKind};
pub use telemetry::{
    LevelSource, LinearCurve, PiecewiseCurve, RawTelemetry, Reading, TelemetryDecoder,
    VoltageToPercent,
};

/// HAL Result type
pub type Result<T> = std::result::Result<T, UpsError>;
