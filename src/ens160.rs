//! # ENS160 Digital Metal-Oxide Multi-Gas Sensor
//!
//! The ENS160 runs its own air-quality algorithms and reports an AQI (UBA
//! scale 1..=5), TVOC in ppb and equivalent CO2 in ppm. Accuracy depends on
//! the ambient temperature and humidity written to TEMP_IN / RH_IN, which the
//! caller refreshes before every [`Ens160::read`].
//!
//! Mode changes are acknowledged asynchronously. [`Ens160::init`] requests
//! Standard mode and returns right away; poll [`Ens160::mode`] before trusting
//! readings.

use core::marker::PhantomData;

use embedded_hal::i2c;

use crate::bus::{decode_u16_le, RegisterBus};
use crate::calc;
use crate::error::{self, SensorError};
use crate::settings::Ens160Config;
use crate::{Ready, Uninitialized};

/// I2C address with ADDR pulled high.
pub const DEFAULT_ADDRESS: u8 = 0x53;
/// I2C address with ADDR pulled low.
pub const ALTERNATE_ADDRESS: u8 = 0x52;
/// Expected content of the PART_ID register.
pub const PART_ID: u16 = 0x0160;

/// Register addresses.
pub mod regs {
    pub const PART_ID: u8 = 0x00;
    pub const OPMODE: u8 = 0x10;
    pub const CONFIG: u8 = 0x11;
    pub const COMMAND: u8 = 0x12;
    pub const TEMP_IN: u8 = 0x13;
    pub const RH_IN: u8 = 0x15;
    pub const STATUS: u8 = 0x20;
    pub const AQI: u8 = 0x21;
    pub const TVOC: u8 = 0x22;
    pub const ECO2: u8 = 0x24;
    pub const GPR_READ: u8 = 0x48;
}

/// STATUS through ECO2 in one burst.
const DATA_LEN: usize = 6;
/// Four 16-bit resistance registers.
const GPR_LEN: usize = 8;
/// GPR_READ4..6 hold the firmware version after `GetAppVersion`.
const GPR_VERSION: u8 = regs::GPR_READ + 4;
/// AQI-UBA occupies bits [2:0].
const AQI_MASK: u8 = 0x07;

mod status_bits {
    pub const NEW_GPR: u8 = 1 << 0;
    pub const NEW_DATA: u8 = 1 << 1;
    pub const VALIDITY_SHIFT: u8 = 2;
    pub const ERROR: u8 = 1 << 6;
    pub const RUNNING: u8 = 1 << 7;
}

mod config_bits {
    pub const ENABLE: u8 = 1 << 0;
    pub const ON_DATA: u8 = 1 << 1;
    pub const ON_GPR: u8 = 1 << 3;
    pub const PUSH_PULL: u8 = 1 << 5;
    pub const ACTIVE_HIGH: u8 = 1 << 6;
    pub const MASK: u8 = ENABLE | ON_DATA | ON_GPR | PUSH_PULL | ACTIVE_HIGH;
}

/// Operating modes of the OPMODE register.
///
/// No transition table is enforced. `Reset` is transient: the device leaves it
/// on its own after booting, and the caller has to wait before sending further
/// commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum OperatingMode {
    /// Deep sleep, lowest power.
    Sleep = 0x00,
    /// Low power, accepts commands.
    Idle = 0x01,
    /// Gas sensing.
    Standard = 0x02,
    /// Custom heater sequence.
    Custom = 0xC0,
    /// Soft reset.
    Reset = 0xF0,
}

impl TryFrom<u8> for OperatingMode {
    /// The unrecognized code.
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0x00 => Ok(OperatingMode::Sleep),
            0x01 => Ok(OperatingMode::Idle),
            0x02 => Ok(OperatingMode::Standard),
            0xC0 => Ok(OperatingMode::Custom),
            0xF0 => Ok(OperatingMode::Reset),
            other => Err(other),
        }
    }
}

/// Validity flag of the current output, STATUS bits [3:2].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Validity {
    /// Normal operation.
    Normal = 0,
    /// Warm-up phase, first 3 minutes after power-on.
    WarmUp = 1,
    /// Initial start-up phase, first hour of operation.
    StartUp = 2,
    /// No valid output.
    Invalid = 3,
}

impl Validity {
    /// Decodes the two validity bits. Higher bits are ignored.
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => Validity::Normal,
            1 => Validity::WarmUp,
            2 => Validity::StartUp,
            _ => Validity::Invalid,
        }
    }

    /// Status code stored with every persisted gas reading (1..=4).
    pub fn status_code(self) -> u8 {
        self as u8 + 1
    }
}

/// Decoded STATUS register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Status {
    /// New data in the AQI/TVOC/eCO2 registers.
    pub new_data: bool,
    /// New data in the general purpose read registers.
    pub new_gpr: bool,
    pub validity: Validity,
    /// An invalid operating mode was selected.
    pub error: bool,
    /// An operating mode is running.
    pub running: bool,
}

impl Status {
    pub fn from_byte(status: u8) -> Self {
        Status {
            new_data: status & status_bits::NEW_DATA != 0,
            new_gpr: status & status_bits::NEW_GPR != 0,
            validity: Validity::from_bits(status >> status_bits::VALIDITY_SHIFT),
            error: status & status_bits::ERROR != 0,
            running: status & status_bits::RUNNING != 0,
        }
    }
}

/// Values of the COMMAND register. Only honoured in Idle mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Command {
    Nop = 0x00,
    /// Clears the general purpose read registers.
    ClearGpr = 0xCC,
    /// Loads the firmware version into GPR_READ4..6.
    GetAppVersion = 0x0E,
}

/// INTn pin configuration, bit fields of the CONFIG register.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InterruptConfig {
    /// Pin is active high (`true`) or active low (`false`).
    pub active_high: bool,
    /// Push-pull (`true`) or open drain (`false`) output.
    pub push_pull: bool,
    /// Assert when new data is available in the data registers.
    pub on_data: bool,
    /// Assert when new data is available in the GPR registers.
    pub on_gpr: bool,
    /// Enable the pin.
    pub enable: bool,
}

impl InterruptConfig {
    fn bits(&self) -> u8 {
        let mut bits = 0;
        if self.enable {
            bits |= config_bits::ENABLE;
        }
        if self.on_data {
            bits |= config_bits::ON_DATA;
        }
        if self.on_gpr {
            bits |= config_bits::ON_GPR;
        }
        if self.push_pull {
            bits |= config_bits::PUSH_PULL;
        }
        if self.active_high {
            bits |= config_bits::ACTIVE_HIGH;
        }
        bits
    }
}

/// Firmware version reported after [`Command::GetAppVersion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FirmwareVersion {
    pub major: u8,
    pub minor: u8,
    pub release: u8,
}

/// One gas measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GasReading {
    pub validity: Validity,
    /// Air quality index, UBA scale 1 (excellent) to 5 (unhealthy).
    pub aqi: u16,
    /// Total volatile organic compounds in ppb.
    pub tvoc_ppb: u16,
    /// Equivalent CO2 in ppm.
    pub eco2_ppm: u16,
    /// Raw hot plate resistances, `log2(R) * 2048`.
    pub gpr_resistances: [u16; 4],
}

impl GasReading {
    /// Resistance of hot plate `index` in Ohms, `None` past the fourth plate.
    pub fn resistance_ohms(&self, index: usize) -> Option<f32> {
        self.gpr_resistances.get(index).map(|&raw| calc::gpr_to_ohms(raw))
    }
}

/// The ENS160 driver. `STATE` tracks identity verification at compile time.
#[derive(Debug)]
pub struct Ens160<I2C, STATE> {
    bus: RegisterBus<I2C>,
    config: Ens160Config,
    _state: PhantomData<STATE>,
}

impl<I2C, STATE, E> Ens160<I2C, STATE>
where
    I2C: i2c::I2c<Error = E>,
{
    /// Reads the PART_ID register (expected value: 0x0160).
    pub fn part_id(&mut self) -> error::Result<u16, E> {
        self.bus.read_u16(regs::PART_ID)
    }

    /// Configuration the driver was created with.
    pub fn config(&self) -> &Ens160Config {
        &self.config
    }

    /// Gives the I2C handle back.
    pub fn release(self) -> I2C {
        self.bus.release()
    }
}

impl<I2C, E> Ens160<I2C, Uninitialized>
where
    I2C: i2c::I2c<Error = E>,
{
    /// Creates a driver. Does not communicate with the sensor yet.
    ///
    /// # Arguments
    /// * `i2c` - The I2C bus object, owned by the driver from now on.
    /// * `config` - Address ([`DEFAULT_ADDRESS`] or [`ALTERNATE_ADDRESS`]) and
    ///   the settings [`configure`](Ens160::configure) applies later.
    pub fn new(i2c: I2C, config: Ens160Config) -> Self {
        Ens160 {
            bus: RegisterBus::new(i2c, config.address),
            config,
            _state: PhantomData,
        }
    }

    /// Verifies the part id and requests Standard mode.
    ///
    /// Does not wait for the device to report Standard mode.
    ///
    /// # Errors
    /// [`SensorError::IdentityMismatch`] if another device answers at the
    /// address. Nothing is written in that case.
    pub fn init(mut self) -> error::Result<Ens160<I2C, Ready>, E> {
        let found = self.part_id()?;
        if found != PART_ID {
            return Err(SensorError::IdentityMismatch {
                expected: PART_ID,
                found,
            });
        }
        debug!("ENS160 found at {=u8:#x}", self.bus.address());

        let mut sensor = Ens160 {
            bus: self.bus,
            config: self.config,
            _state: PhantomData,
        };
        sensor.set_mode(OperatingMode::Standard)?;

        Ok(sensor)
    }
}

impl<I2C, E> Ens160<I2C, Ready>
where
    I2C: i2c::I2c<Error = E>,
{
    /// Applies interrupt setup and the initial compensation values of the
    /// driver's configuration.
    ///
    /// Call once the device reports Standard mode.
    pub fn configure(&mut self) -> error::Result<(), E> {
        let config = self.config;
        if let Some(interrupt) = config.interrupt {
            self.configure_interrupt(interrupt)?;
        }
        self.set_temperature_compensation(config.temperature_compensation)?;
        self.set_humidity_compensation(config.humidity_compensation)?;
        Ok(())
    }

    /// Reads the operating mode the device currently reports.
    ///
    /// # Errors
    /// [`SensorError::UnknownMode`] for a code outside [`OperatingMode`].
    pub fn mode(&mut self) -> error::Result<OperatingMode, E> {
        let code = self.bus.read_u8(regs::OPMODE)?;
        OperatingMode::try_from(code).map_err(SensorError::UnknownMode)
    }

    /// Requests an operating mode.
    pub fn set_mode(&mut self, mode: OperatingMode) -> error::Result<(), E> {
        trace!("ENS160 opmode {=u8:#x}", mode as u8);
        self.bus.write_u8(regs::OPMODE, mode as u8)
    }

    /// Requests an operating mode given as raw OPMODE code.
    ///
    /// # Errors
    /// [`SensorError::InvalidModeRequest`] for codes outside [`OperatingMode`],
    /// before anything is written.
    pub fn set_mode_raw(&mut self, code: u8) -> error::Result<(), E> {
        let mode = OperatingMode::try_from(code).map_err(SensorError::InvalidModeRequest)?;
        self.set_mode(mode)
    }

    /// Writes the ambient temperature used for compensation.
    ///
    /// The value is not re-validated by the device. A stale value silently
    /// degrades accuracy, so refresh it before every [`read`](Self::read).
    pub fn set_temperature_compensation(&mut self, celsius: f64) -> error::Result<(), E> {
        self.bus.write_u16(regs::TEMP_IN, calc::celsius_to_raw(celsius))
    }

    /// Writes the ambient relative humidity used for compensation.
    pub fn set_humidity_compensation(&mut self, percent: f64) -> error::Result<(), E> {
        self.bus.write_u16(regs::RH_IN, calc::percent_to_raw(percent))
    }

    /// Reads and decodes the STATUS register.
    pub fn status(&mut self) -> error::Result<Status, E> {
        Ok(Status::from_byte(self.bus.read_u8(regs::STATUS)?))
    }

    /// Reads AQI, TVOC, eCO2 and the four hot plate resistances.
    ///
    /// STATUS and the data registers are fetched in one burst, so the new-data
    /// check and the values belong to the same snapshot. Never waits.
    ///
    /// # Errors
    /// [`SensorError::DataNotReady`] if the device has not flagged new data.
    pub fn read(&mut self) -> error::Result<GasReading, E> {
        let mut data = [0u8; DATA_LEN];
        self.bus.read(regs::STATUS, &mut data)?;

        let status = Status::from_byte(data[0]);
        if !status.new_data {
            return Err(SensorError::DataNotReady);
        }

        let mut gpr = [0u8; GPR_LEN];
        self.bus.read(regs::GPR_READ, &mut gpr)?;

        Ok(GasReading {
            validity: status.validity,
            aqi: u16::from(data[1] & AQI_MASK),
            tvoc_ppb: decode_u16_le([data[2], data[3]]),
            eco2_ppm: decode_u16_le([data[4], data[5]]),
            gpr_resistances: core::array::from_fn(|i| {
                decode_u16_le([gpr[2 * i], gpr[2 * i + 1]])
            }),
        })
    }

    /// Configures the INTn pin. Bits of CONFIG outside the interrupt fields
    /// are preserved.
    pub fn configure_interrupt(&mut self, interrupt: InterruptConfig) -> error::Result<(), E> {
        let register = self.bus.read_u8(regs::CONFIG)?;
        let new_reg_val = (register & !config_bits::MASK) | interrupt.bits();
        self.bus.write_u8(regs::CONFIG, new_reg_val)
    }

    /// Writes a command to the COMMAND register.
    pub fn command(&mut self, command: Command) -> error::Result<(), E> {
        self.bus.write_u8(regs::COMMAND, command as u8)
    }

    /// Clears the general purpose read registers.
    pub fn clear_gpr(&mut self) -> error::Result<(), E> {
        self.command(Command::ClearGpr)
    }

    /// Asks the device for its firmware version. Requires Idle mode; the
    /// driver does not switch modes for this.
    pub fn firmware_version(&mut self) -> error::Result<FirmwareVersion, E> {
        self.command(Command::GetAppVersion)?;

        let mut version = [0u8; 3];
        self.bus.read(GPR_VERSION, &mut version)?;

        Ok(FirmwareVersion {
            major: version[0],
            minor: version[1],
            release: version[2],
        })
    }
}
