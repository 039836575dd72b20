//! Error taxonomy for the UPS driver

use crate::sink::SinkKind;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpsError {
    #[error("I2C bus timed out")]
    BusTimeout,

    #[error("No acknowledge from device (absent or wrong address)")]
    NoAck,

    #[error("Short read: expected {expected} bytes, got {got}")]
    ShortRead { expected: usize, got: usize },

    #[error("No reading available: {0}")]
    NoReading(#[source] Box<UpsError>),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Device does not appear to be a MAX17043 (CONFIG reads {config:#06X})")]
    UnrecognisedDevice { config: u16 },

    #[error("Device is marked failed")]
    DeviceFailed,

    #[error("Power status line error: {0}")]
    PowerSense(String),

    #[error("{0} sink is already bound")]
    SinkAlreadyBound(SinkKind),

    #[error("Device already registered: {0}")]
    DuplicateDevice(String),

    #[error("Unknown device: {0}")]
    UnknownDevice(String),
}

impl UpsError {
    /// Whether this error came from the bus and only costs one poll cycle
    pub fn is_transient(&self) -> bool {
        match self {
            UpsError::BusTimeout
            | UpsError::NoAck
            | UpsError::ShortRead { .. }
            | UpsError::PowerSense(_) => true,
            UpsError::NoReading(cause) => cause.is_transient(),
            _ => false,
        }
    }
}
