//! Mock hardware for testing without a UPS hat
//!
//! [`MockBus`] implements the `embedded-hal` I2C trait over an in-memory
//! register file and [`MockPin`] stands in for the power-present GPIO line.
//! Both are cheap clones over shared state, so a test can keep a handle and
//! change what the driver sees between ticks.
//!
//! # Usage
//!
//! ```no_run
//! use upslite_hal::mock::{MockBus, MockPin};
//! use embedded_hal::i2c::ErrorKind;
//!
//! // A MAX17043 at 0x36 reporting 4.01 V / 87 %
//! let bus = MockBus::max17043(0x36);
//! let pin = MockPin::new(true);
//!
//! // Simulate the hat dropping off the bus
//! bus.fail_with(Some(ErrorKind::Other));
//! ```

use crate::telemetry::{CONFIG, CONFIG_POWER_UP_DEFAULT, SOC, VCELL};
use embedded_hal::digital;
use embedded_hal::i2c::{self, ErrorKind, NoAcknowledgeSource, Operation};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

/// Raw VCELL value decoding to 4.010 V
pub const MOCK_VCELL_RAW: u16 = 3208 << 4;

/// Raw SOC value decoding to 87 %
pub const MOCK_SOC_RAW: u16 = 87 << 8;

/// One recorded bus transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transaction {
    /// Register read starting at `reg`
    Read { reg: u8, len: usize },
    /// Register write of `bytes` starting at `reg`
    Write { reg: u8, bytes: Vec<u8> },
}

/// Shared mock bus state
#[derive(Debug, Default)]
pub struct MockBusState {
    /// Address the device answers on
    pub address: u8,
    /// Register file, byte addressed
    pub bytes: HashMap<u8, u8>,
    /// Register pointer left by the last write
    pub pointer: u8,
    /// Error returned by every transaction while set
    pub failure: Option<ErrorKind>,
    /// Completed transactions in order
    pub log: Vec<Transaction>,
}

/// In-memory I2C device
#[derive(Debug, Clone)]
pub struct MockBus {
    state: Arc<RwLock<MockBusState>>,
}

impl MockBus {
    /// Empty register file answering at `address`
    pub fn new(address: u8) -> Self {
        Self {
            state: Arc::new(RwLock::new(MockBusState {
                address,
                ..Default::default()
            })),
        }
    }

    /// A freshly powered MAX17043 reporting 4.01 V and 87 %
    pub fn max17043(address: u8) -> Self {
        let bus = Self::new(address);
        bus.set_register(CONFIG, CONFIG_POWER_UP_DEFAULT);
        bus.set_register(VCELL, MOCK_VCELL_RAW);
        bus.set_register(SOC, MOCK_SOC_RAW);
        bus
    }

    pub fn address(&self) -> u8 {
        self.state.read().map(|s| s.address).unwrap_or_default()
    }

    /// Store a big-endian 16-bit register
    pub fn set_register(&self, reg: u8, value: u16) {
        if let Ok(mut state) = self.state.write() {
            let [hi, lo] = value.to_be_bytes();
            state.bytes.insert(reg, hi);
            state.bytes.insert(reg.wrapping_add(1), lo);
        }
    }

    /// Current value of a big-endian 16-bit register
    pub fn register(&self, reg: u8) -> u16 {
        self.state
            .read()
            .map(|s| {
                let hi = s.bytes.get(&reg).copied().unwrap_or(0);
                let lo = s.bytes.get(&reg.wrapping_add(1)).copied().unwrap_or(0);
                u16::from_be_bytes([hi, lo])
            })
            .unwrap_or_default()
    }

    /// Make every transaction fail with `kind` until cleared with `None`
    pub fn fail_with(&self, kind: Option<ErrorKind>) {
        if let Ok(mut state) = self.state.write() {
            state.failure = kind;
        }
    }

    /// Transactions completed so far
    pub fn transactions(&self) -> Vec<Transaction> {
        self.state
            .read()
            .map(|s| s.log.clone())
            .unwrap_or_default()
    }

    pub fn clear_transactions(&self) {
        if let Ok(mut state) = self.state.write() {
            state.log.clear();
        }
    }

    /// Number of completed register writes
    pub fn write_count(&self) -> usize {
        self.transactions()
            .iter()
            .filter(|t| matches!(t, Transaction::Write { .. }))
            .count()
    }

    /// Number of completed register reads
    pub fn read_count(&self) -> usize {
        self.transactions()
            .iter()
            .filter(|t| matches!(t, Transaction::Read { .. }))
            .count()
    }

    /// Get shared state for manipulation in tests
    pub fn state(&self) -> Arc<RwLock<MockBusState>> {
        Arc::clone(&self.state)
    }
}

impl i2c::ErrorType for MockBus {
    type Error = ErrorKind;
}

impl i2c::I2c for MockBus {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let Ok(mut state) = self.state.write() else {
            return Err(ErrorKind::Other);
        };

        if let Some(kind) = state.failure {
            tracing::debug!("[MOCK] I2C transaction failed: {:?}", kind);
            return Err(kind);
        }
        if address != state.address {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }

        let mut pointer = state.pointer;
        for operation in operations.iter_mut() {
            match operation {
                Operation::Write(bytes) => {
                    let Some((&reg, payload)) = bytes.split_first() else {
                        continue;
                    };
                    pointer = reg;
                    if payload.is_empty() {
                        continue;
                    }
                    for (offset, byte) in payload.iter().enumerate() {
                        state.bytes.insert(reg.wrapping_add(offset as u8), *byte);
                    }
                    state.log.push(Transaction::Write {
                        reg,
                        bytes: payload.to_vec(),
                    });
                }
                Operation::Read(buf) => {
                    for (offset, byte) in buf.iter_mut().enumerate() {
                        *byte = state
                            .bytes
                            .get(&pointer.wrapping_add(offset as u8))
                            .copied()
                            .unwrap_or(0);
                    }
                    state.log.push(Transaction::Read {
                        reg: pointer,
                        len: buf.len(),
                    });
                }
            }
        }
        state.pointer = pointer;

        Ok(())
    }
}

/// Power-present line backed by a shared flag
#[derive(Debug, Clone)]
pub struct MockPin {
    level: Arc<AtomicBool>,
    broken: Arc<AtomicBool>,
}

impl MockPin {
    pub fn new(high: bool) -> Self {
        Self {
            level: Arc::new(AtomicBool::new(high)),
            broken: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn set_high(&self, high: bool) {
        self.level.store(high, Ordering::SeqCst);
    }

    /// Make reads fail until cleared
    pub fn set_broken(&self, broken: bool) {
        self.broken.store(broken, Ordering::SeqCst);
    }

    fn sample(&self) -> Result<bool, digital::ErrorKind> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(digital::ErrorKind::Other);
        }
        Ok(self.level.load(Ordering::SeqCst))
    }
}

impl digital::ErrorType for MockPin {
    type Error = digital::ErrorKind;
}

impl digital::InputPin for MockPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.sample()
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.sample().map(|high| !high)
    }
}
