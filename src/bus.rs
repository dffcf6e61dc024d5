//! Byte-addressed register access over an I2C device.
//!
//! Both sensors expose an 8-bit register address space with auto-incrementing
//! burst access. All multi-byte registers are little-endian.

use embedded_hal::i2c;

use crate::error::{self, SensorError};

/// Largest payload sent in one write transaction. Longer writes are split and
/// continue at the following register address.
const MAX_WRITE_LEN: usize = 8;

/// Decodes a little-endian register pair.
pub fn decode_u16_le(bytes: [u8; 2]) -> u16 {
    u16::from_le_bytes(bytes)
}

/// Encodes a value into a little-endian register pair.
pub fn encode_u16_le(value: u16) -> [u8; 2] {
    value.to_le_bytes()
}

/// An I2C device at a fixed 7-bit address, accessed register by register.
///
/// No retries happen at this layer; every transport failure is returned as
/// [`SensorError::I2CError`].
#[derive(Debug)]
pub struct RegisterBus<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C, E> RegisterBus<I2C>
where
    I2C: i2c::I2c<Error = E>,
{
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// The 7-bit device address.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Burst-reads `buffer.len()` bytes starting at `reg` in one transaction.
    pub fn read(&mut self, reg: u8, buffer: &mut [u8]) -> error::Result<(), E> {
        self.i2c
            .write_read(self.address, &[reg], buffer)
            .map_err(SensorError::I2CError)
    }

    /// Reads a single byte register.
    pub fn read_u8(&mut self, reg: u8) -> error::Result<u8, E> {
        let mut buffer = [0];
        self.read(reg, &mut buffer)?;
        Ok(buffer[0])
    }

    /// Reads a 2 byte little-endian register.
    pub fn read_u16(&mut self, reg: u8) -> error::Result<u16, E> {
        let mut buffer = [0; 2];
        self.read(reg, &mut buffer)?;
        Ok(decode_u16_le(buffer))
    }

    /// Reads an 8 byte little-endian register.
    pub fn read_u64(&mut self, reg: u8) -> error::Result<u64, E> {
        let mut buffer = [0; 8];
        self.read(reg, &mut buffer)?;
        Ok(u64::from_le_bytes(buffer))
    }

    /// Writes `data` starting at `reg`.
    pub fn write(&mut self, reg: u8, data: &[u8]) -> error::Result<(), E> {
        let mut frame = [0u8; MAX_WRITE_LEN + 1];
        let mut reg = reg;

        for chunk in data.chunks(MAX_WRITE_LEN) {
            frame[0] = reg;
            frame[1..=chunk.len()].copy_from_slice(chunk);
            self.i2c
                .write(self.address, &frame[..=chunk.len()])
                .map_err(SensorError::I2CError)?;
            reg = reg.wrapping_add(chunk.len() as u8);
        }

        Ok(())
    }

    /// Writes a single byte register.
    pub fn write_u8(&mut self, reg: u8, value: u8) -> error::Result<(), E> {
        self.write(reg, &[value])
    }

    /// Writes a 2 byte little-endian register.
    pub fn write_u16(&mut self, reg: u8, value: u16) -> error::Result<(), E> {
        self.write(reg, &encode_u16_le(value))
    }

    /// Gives the I2C handle back.
    pub fn release(self) -> I2C {
        self.i2c
    }
}
