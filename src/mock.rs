//! Register-file fakes for the unit tests.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, Operation};

/// I2C device backed by a 256 byte register file.
///
/// A write transaction sets the register pointer from its first byte and stores
/// the remaining bytes from there on, auto-incrementing. Reads continue at the
/// pointer. Every non-empty write is recorded.
pub struct FakeI2c {
    pub address: u8,
    pub regs: [u8; 256],
    pub writes: Vec<(u8, Vec<u8>)>,
    pub fail: bool,
    pointer: u8,
}

impl FakeI2c {
    pub fn new(address: u8) -> Self {
        Self {
            address,
            regs: [0; 256],
            writes: Vec::new(),
            fail: false,
            pointer: 0,
        }
    }

    pub fn with_u8(mut self, reg: u8, value: u8) -> Self {
        self.set_u8(reg, value);
        self
    }

    pub fn with_u16(mut self, reg: u8, value: u16) -> Self {
        self.set_u16(reg, value);
        self
    }

    pub fn set_u8(&mut self, reg: u8, value: u8) {
        self.regs[reg as usize] = value;
    }

    pub fn set_u16(&mut self, reg: u8, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.regs[reg as usize] = lo;
        self.regs[reg.wrapping_add(1) as usize] = hi;
    }

    /// Payloads written to `reg`, oldest first.
    pub fn writes_to(&self, reg: u8) -> Vec<Vec<u8>> {
        self.writes
            .iter()
            .filter(|(r, _)| *r == reg)
            .map(|(_, payload)| payload.clone())
            .collect()
    }

    /// Registers written to, in order.
    pub fn written_regs(&self) -> Vec<u8> {
        self.writes.iter().map(|(r, _)| *r).collect()
    }
}

impl ErrorType for FakeI2c {
    type Error = ErrorKind;
}

impl I2c for FakeI2c {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if self.fail || address != self.address {
            return Err(ErrorKind::Bus);
        }

        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    if let Some((&reg, payload)) = bytes.split_first() {
                        self.pointer = reg;
                        if !payload.is_empty() {
                            for (i, b) in payload.iter().enumerate() {
                                self.regs[reg.wrapping_add(i as u8) as usize] = *b;
                            }
                            self.writes.push((reg, payload.to_vec()));
                        }
                    }
                }
                Operation::Read(buf) => {
                    for (i, b) in buf.iter_mut().enumerate() {
                        *b = self.regs[self.pointer.wrapping_add(i as u8) as usize];
                    }
                }
            }
        }

        Ok(())
    }
}

/// Delay that records every millisecond wait instead of sleeping.
#[derive(Default)]
pub struct FakeDelay {
    pub waits_ms: Vec<u32>,
}

impl DelayNs for FakeDelay {
    fn delay_ns(&mut self, _ns: u32) {}

    fn delay_ms(&mut self, ms: u32) {
        self.waits_ms.push(ms);
    }
}
