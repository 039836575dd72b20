//! Register access over I2C
//!
//! The fuel gauge exposes 16-bit big-endian registers addressed by an 8-bit
//! pointer. Every transaction is synchronous and reports failures as
//! [`UpsError`] values rather than panicking, so a missing or flaky hat only
//! costs the caller one poll cycle.

use crate::{Result, UpsError};
use embedded_hal::i2c::{Error as _, ErrorKind, I2c};

/// Synchronous register-level access to a single bus device
pub trait RegisterIo {
    /// 7-bit address the transactions go to
    fn address(&self) -> u8;

    /// Read `buf.len()` bytes starting at register `reg`
    fn read_register(&mut self, reg: u8, buf: &mut [u8]) -> Result<()>;

    /// Write `bytes` starting at register `reg`
    fn write_register(&mut self, reg: u8, bytes: &[u8]) -> Result<()>;

    /// Read a big-endian 16-bit register
    fn read_u16(&mut self, reg: u8) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.read_register(reg, &mut buf)?;
        Ok(u16::from_be_bytes(buf))
    }

    /// Write a big-endian 16-bit register
    fn write_u16(&mut self, reg: u8, value: u16) -> Result<()> {
        self.write_register(reg, &value.to_be_bytes())
    }
}

/// [`RegisterIo`] on top of an `embedded-hal` I2C bus at a fixed address
pub struct I2cRegisterIo<I> {
    bus: I,
    address: u8,
}

impl<I: I2c> I2cRegisterIo<I> {
    pub fn new(bus: I, address: u8) -> Self {
        Self { bus, address }
    }

    /// Give the bus handle back
    pub fn release(self) -> I {
        self.bus
    }
}

impl<I: I2c> RegisterIo for I2cRegisterIo<I> {
    fn address(&self) -> u8 {
        self.address
    }

    fn read_register(&mut self, reg: u8, buf: &mut [u8]) -> Result<()> {
        let expected = buf.len();
        self.bus
            .write_read(self.address, &[reg], buf)
            .map_err(|e| map_error_kind(e.kind(), expected))
    }

    fn write_register(&mut self, reg: u8, bytes: &[u8]) -> Result<()> {
        // Pointer byte followed by the payload in a single write
        let mut frame = Vec::with_capacity(bytes.len() + 1);
        frame.push(reg);
        frame.extend_from_slice(bytes);

        self.bus
            .write(self.address, &frame)
            .map_err(|e| map_error_kind(e.kind(), 0))
    }
}

/// Collapse `embedded-hal` error kinds into the driver taxonomy
pub(crate) fn map_error_kind(kind: ErrorKind, expected: usize) -> UpsError {
    match kind {
        ErrorKind::NoAcknowledge(_) => UpsError::NoAck,
        ErrorKind::Overrun => UpsError::ShortRead { expected, got: 0 },
        // Bus errors, lost arbitration and anything driver specific mean the
        // transaction never completed
        _ => UpsError::BusTimeout,
    }
}
