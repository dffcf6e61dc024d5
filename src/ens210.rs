//! # ENS210 Relative Humidity and Temperature Sensor
//!
//! Conversions are started explicitly and the driver waits a fixed conversion
//! time before reading the result; there is no polling of ready bits. The only
//! places that block are [`Ens210::reset`], [`Ens210::set_power_mode`] and
//! [`Ens210::measure`], all through the caller's delay provider.

use core::marker::PhantomData;

use embedded_hal::{delay::DelayNs, i2c};

use crate::bus::{decode_u16_le, RegisterBus};
use crate::calc;
use crate::error::{self, SensorError};
use crate::settings::Ens210Config;
use crate::{Milliseconds, Ready, Uninitialized};

/// Fixed I2C address.
pub const DEFAULT_ADDRESS: u8 = 0x43;
/// Expected content of the PART_ID register.
pub const PART_ID: u16 = 0x0210;

/// Boot time after power-on, reset or switching power modes.
pub const BOOT_TIME: Milliseconds = Milliseconds(2);
/// Conversion time of a single-shot T/H measurement.
pub const CONVERSION_SINGLE_SHOT: Milliseconds = Milliseconds(130);
/// Conversion time of a continuous T/H measurement.
pub const CONVERSION_CONTINUOUS: Milliseconds = Milliseconds(238);

/// Register addresses.
pub mod regs {
    pub const PART_ID: u8 = 0x00;
    pub const UID: u8 = 0x04;
    pub const SYS_CTRL: u8 = 0x10;
    pub const SYS_STAT: u8 = 0x11;
    pub const SENS_RUN: u8 = 0x21;
    pub const SENS_START: u8 = 0x22;
    pub const SENS_STOP: u8 = 0x23;
    pub const SENS_STAT: u8 = 0x24;
    pub const T_VAL: u8 = 0x30;
    pub const T_STAT: u8 = 0x32;
    pub const H_VAL: u8 = 0x33;
    pub const H_STAT: u8 = 0x35;
}

mod sys_ctrl {
    pub const RESET: u8 = 0x80;
    pub const LOW_POWER: u8 = 0x01;
    pub const HIGH_POWER: u8 = 0x00;
}

/// Temperature and humidity bits, used by SENS_RUN, SENS_START and SENS_STOP.
const T_AND_H: u8 = 0x03;
/// SENS_RUN value written by `set_single_shot(true)`.
const RUN_CLEARED: u8 = 0x00;
/// T_VAL through H_STAT in one burst.
const DATA_LEN: usize = (regs::H_STAT - regs::T_VAL + 1) as usize;
/// Bit0 of T_STAT / H_STAT, set when the value is valid.
const VALID: u8 = 0x01;

/// Conversion scheme of the temperature and humidity sensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RunMode {
    /// One conversion per start command.
    SingleShot,
    /// Free-running periodic conversion.
    Continuous,
}

impl RunMode {
    /// Fixed time to wait between starting and reading a conversion.
    pub fn conversion_time(self) -> Milliseconds {
        match self {
            RunMode::SingleShot => CONVERSION_SINGLE_SHOT,
            RunMode::Continuous => CONVERSION_CONTINUOUS,
        }
    }
}

/// One climate measurement in physical units.
///
/// The values are converted even when the sensor flags them invalid.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClimateReading {
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub temp_valid: bool,
    pub humidity_valid: bool,
}

/// Conversion-in-progress flags of SENS_STAT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorBusy {
    pub temperature: bool,
    pub humidity: bool,
}

/// The ENS210 driver. `STATE` tracks identity verification at compile time.
#[derive(Debug)]
pub struct Ens210<I2C, STATE> {
    bus: RegisterBus<I2C>,
    solder_correction: i32,
    low_power: bool,
    run_mode: RunMode,
    _state: PhantomData<STATE>,
}

impl<I2C, STATE, E> Ens210<I2C, STATE>
where
    I2C: i2c::I2c<Error = E>,
{
    /// Reads the PART_ID register (expected value: 0x0210).
    pub fn part_id(&mut self) -> error::Result<u16, E> {
        self.bus.read_u16(regs::PART_ID)
    }

    /// Gives the I2C handle back.
    pub fn release(self) -> I2C {
        self.bus.release()
    }
}

impl<I2C, E> Ens210<I2C, Uninitialized>
where
    I2C: i2c::I2c<Error = E>,
{
    /// Creates a driver. Does not communicate with the sensor yet.
    pub fn new(i2c: I2C, config: Ens210Config) -> Self {
        Ens210 {
            bus: RegisterBus::new(i2c, config.address),
            solder_correction: config.solder_correction,
            low_power: config.low_power,
            run_mode: config.run_mode,
            _state: PhantomData,
        }
    }

    /// Verifies the part id, resets the sensor and applies run and power mode.
    ///
    /// Blocks for three boot times: after the reset, after the power mode
    /// switch and once more before returning.
    ///
    /// # Errors
    /// [`SensorError::IdentityMismatch`] if another device answers at the
    /// address. Nothing is written in that case.
    pub fn init(mut self, delay: &mut impl DelayNs) -> error::Result<Ens210<I2C, Ready>, E> {
        let found = self.part_id()?;
        if found != PART_ID {
            return Err(SensorError::IdentityMismatch {
                expected: PART_ID,
                found,
            });
        }
        debug!("ENS210 found at {=u8:#x}", self.bus.address());

        let mut sensor = Ens210 {
            bus: self.bus,
            solder_correction: self.solder_correction,
            low_power: self.low_power,
            run_mode: self.run_mode,
            _state: PhantomData,
        };

        let single_shot = sensor.run_mode == RunMode::SingleShot;
        let low_power = sensor.low_power;

        sensor.reset(delay)?;
        sensor.set_single_shot(single_shot)?;
        sensor.set_power_mode(low_power, delay)?;

        delay.delay_ms(BOOT_TIME.0);

        Ok(sensor)
    }
}

impl<I2C, E> Ens210<I2C, Ready>
where
    I2C: i2c::I2c<Error = E>,
{
    /// Performs a soft reset and waits for the sensor to boot.
    pub fn reset(&mut self, delay: &mut impl DelayNs) -> error::Result<(), E> {
        self.bus.write_u8(regs::SYS_CTRL, sys_ctrl::RESET)?;
        delay.delay_ms(BOOT_TIME.0);
        Ok(())
    }

    /// Selects low (`true`) or high (`false`) power mode and waits for the
    /// sensor to settle.
    pub fn set_power_mode(
        &mut self,
        low_power: bool,
        delay: &mut impl DelayNs,
    ) -> error::Result<(), E> {
        let value = if low_power {
            sys_ctrl::LOW_POWER
        } else {
            sys_ctrl::HIGH_POWER
        };
        self.bus.write_u8(regs::SYS_CTRL, value)?;
        self.low_power = low_power;

        delay.delay_ms(BOOT_TIME.0);
        Ok(())
    }

    /// Selects single-shot (`true`) or continuous (`false`) operation.
    ///
    /// Register polarity: `true` writes `0x00` to SENS_RUN, `false` writes
    /// `0x03` (run bits of both T and H). The values look swapped relative to
    /// the flag name and must stay that way. The flag also selects the
    /// conversion time [`measure`](Self::measure) waits.
    pub fn set_single_shot(&mut self, enable: bool) -> error::Result<(), E> {
        let (value, mode) = if enable {
            (RUN_CLEARED, RunMode::SingleShot)
        } else {
            (T_AND_H, RunMode::Continuous)
        };
        self.bus.write_u8(regs::SENS_RUN, value)?;
        self.run_mode = mode;
        Ok(())
    }

    /// Same as [`set_single_shot`](Self::set_single_shot) with a [`RunMode`].
    pub fn set_run_mode(&mut self, mode: RunMode) -> error::Result<(), E> {
        self.set_single_shot(mode == RunMode::SingleShot)
    }

    pub fn run_mode(&self) -> RunMode {
        self.run_mode
    }

    pub fn low_power(&self) -> bool {
        self.low_power
    }

    /// Solder correction in raw counts (1/64 K).
    pub fn solder_correction(&self) -> i32 {
        self.solder_correction
    }

    /// Starts a conversion, waits the fixed conversion time of the current run
    /// mode and returns the converted result.
    ///
    /// In single-shot mode the run configuration is written again first.
    pub fn measure(&mut self, delay: &mut impl DelayNs) -> error::Result<ClimateReading, E> {
        if self.run_mode == RunMode::SingleShot {
            self.set_single_shot(true)?;
        }

        self.bus.write_u8(regs::SENS_START, T_AND_H)?;
        delay.delay_ms(self.run_mode.conversion_time().0);

        let mut data = [0u8; DATA_LEN];
        self.bus.read(regs::T_VAL, &mut data)?;

        let raw_t = decode_u16_le([data[0], data[1]]);
        let raw_h = decode_u16_le([data[3], data[4]]);
        let reading = ClimateReading {
            temperature_c: calc::raw_to_celsius(raw_t, self.solder_correction),
            humidity_pct: calc::raw_to_percent(raw_h),
            temp_valid: data[2] & VALID == VALID,
            humidity_valid: data[5] & VALID == VALID,
        };
        trace!(
            "ENS210 raw T {=u16} H {=u16} valid {=bool} {=bool}",
            raw_t,
            raw_h,
            reading.temp_valid,
            reading.humidity_valid
        );

        Ok(reading)
    }

    /// Stops continuous conversion of temperature and humidity.
    pub fn stop(&mut self) -> error::Result<(), E> {
        self.bus.write_u8(regs::SENS_STOP, T_AND_H)
    }

    /// Reads the factory programmed unique id.
    pub fn uid(&mut self) -> error::Result<u64, E> {
        self.bus.read_u64(regs::UID)
    }

    /// `true` while the system is active, `false` in standby.
    pub fn system_active(&mut self) -> error::Result<bool, E> {
        Ok(self.bus.read_u8(regs::SYS_STAT)? & 0x01 != 0)
    }

    /// Which sensors are converting right now.
    pub fn sensor_status(&mut self) -> error::Result<SensorBusy, E> {
        let stat = self.bus.read_u8(regs::SENS_STAT)?;
        Ok(SensorBusy {
            temperature: stat & 0x01 != 0,
            humidity: stat & 0x02 != 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{FakeDelay, FakeI2c};
    use crate::settings::Ens210Builder;

    fn device() -> FakeI2c {
        FakeI2c::new(DEFAULT_ADDRESS).with_u16(regs::PART_ID, PART_ID)
    }

    fn ready(fake: FakeI2c, config: Ens210Config) -> Ens210<FakeI2c, Ready> {
        Ens210::new(fake, config)
            .init(&mut FakeDelay::default())
            .unwrap()
    }

    #[test]
    fn init_resets_and_applies_defaults() {
        let mut delay = FakeDelay::default();
        let sensor = Ens210::new(device(), Ens210Config::default())
            .init(&mut delay)
            .unwrap();
        assert_eq!(sensor.run_mode(), RunMode::SingleShot);
        assert!(sensor.low_power());

        let fake = sensor.release();
        assert_eq!(
            fake.writes,
            vec![
                (regs::SYS_CTRL, vec![0x80]),
                (regs::SENS_RUN, vec![0x00]),
                (regs::SYS_CTRL, vec![0x01]),
            ]
        );
        assert_eq!(delay.waits_ms, vec![2, 2, 2]);
    }

    #[test]
    fn init_honours_config() {
        let config = Ens210Builder::new()
            .low_power(false)
            .run_mode(RunMode::Continuous)
            .build();
        let fake = ready(device(), config).release();

        assert_eq!(fake.writes_to(regs::SENS_RUN), vec![vec![0x03]]);
        assert_eq!(fake.writes_to(regs::SYS_CTRL), vec![vec![0x80], vec![0x00]]);
    }

    #[test]
    fn init_rejects_foreign_part_id() {
        let mut delay = FakeDelay::default();
        let mut fake = FakeI2c::new(DEFAULT_ADDRESS).with_u16(regs::PART_ID, 0x0160);
        let result = Ens210::new(&mut fake, Ens210Config::default()).init(&mut delay);

        assert!(matches!(
            result,
            Err(SensorError::IdentityMismatch {
                expected: 0x0210,
                found: 0x0160
            })
        ));
        assert!(delay.waits_ms.is_empty());
        assert!(fake.writes.is_empty());
    }

    #[test]
    fn single_shot_flag_register_polarity() {
        let mut sensor = ready(device(), Ens210Config::default());

        sensor.set_single_shot(false).unwrap();
        assert_eq!(sensor.run_mode(), RunMode::Continuous);
        sensor.set_single_shot(true).unwrap();
        assert_eq!(sensor.run_mode(), RunMode::SingleShot);
        sensor.set_run_mode(RunMode::Continuous).unwrap();

        let fake = sensor.release();
        assert_eq!(
            fake.writes_to(regs::SENS_RUN),
            vec![vec![0x00], vec![0x03], vec![0x00], vec![0x03]]
        );
    }

    #[test]
    fn power_mode_waits_for_boot() {
        let mut sensor = ready(device(), Ens210Config::default());
        let mut delay = FakeDelay::default();

        sensor.set_power_mode(false, &mut delay).unwrap();
        sensor.reset(&mut delay).unwrap();
        assert_eq!(delay.waits_ms, vec![2, 2]);
        assert!(!sensor.low_power());

        let fake = sensor.release();
        assert_eq!(
            fake.writes_to(regs::SYS_CTRL)[2..],
            [vec![0x00], vec![0x80]]
        );
    }

    #[test]
    fn single_shot_measure_waits_single_shot_time() {
        let mut sensor = ready(device(), Ens210Config::default());
        let mut delay = FakeDelay::default();

        sensor.measure(&mut delay).unwrap();
        assert_eq!(delay.waits_ms, vec![130]);

        let fake = sensor.release();
        assert_eq!(
            fake.written_regs()[3..],
            [regs::SENS_RUN, regs::SENS_START]
        );
        assert_eq!(fake.writes_to(regs::SENS_START), vec![vec![0x03]]);
    }

    #[test]
    fn continuous_measure_waits_continuous_time() {
        let mut sensor = ready(device(), Ens210Config::default());
        sensor.set_single_shot(false).unwrap();
        let mut delay = FakeDelay::default();

        sensor.measure(&mut delay).unwrap();
        sensor.measure(&mut delay).unwrap();
        assert_eq!(delay.waits_ms, vec![238, 238]);

        let fake = sensor.release();
        // only the explicit switch touched SENS_RUN after init
        assert_eq!(fake.writes_to(regs::SENS_RUN).len(), 2);
        assert_eq!(fake.writes_to(regs::SENS_START).len(), 2);
    }

    #[test]
    fn measure_converts_and_flags_validity() {
        let fake = device()
            .with_u16(regs::T_VAL, 19082)
            .with_u8(regs::T_STAT, 0x01)
            .with_u16(regs::H_VAL, 256)
            .with_u8(regs::H_STAT, 0x00);
        let mut sensor = ready(fake, Ens210Config::default());

        let reading = sensor.measure(&mut FakeDelay::default()).unwrap();
        assert!((reading.temperature_c - 25.0).abs() < 0.01);
        assert_eq!(reading.humidity_pct, 0.5);
        assert!(reading.temp_valid);
        assert!(!reading.humidity_valid);
    }

    #[test]
    fn solder_correction_only_shifts_temperature() {
        let fake = device()
            .with_u16(regs::T_VAL, 17729)
            .with_u8(regs::T_STAT, 0xFF)
            .with_u16(regs::H_VAL, 25600)
            .with_u8(regs::H_STAT, 0x03);
        let config = Ens210Builder::new().solder_correction(64).build();
        let mut sensor = ready(fake, config);
        assert_eq!(sensor.solder_correction(), 64);

        let reading = sensor.measure(&mut FakeDelay::default()).unwrap();
        assert!((reading.temperature_c - 2.865_625).abs() < 1e-9);
        assert_eq!(reading.humidity_pct, 50.0);
        assert!(reading.temp_valid);
        assert!(reading.humidity_valid);
    }

    #[test]
    fn identity_and_status_registers() {
        let mut fake = device()
            .with_u8(regs::SYS_STAT, 0x01)
            .with_u8(regs::SENS_STAT, 0x02);
        fake.regs[regs::UID as usize..regs::UID as usize + 8]
            .copy_from_slice(&0x0011_2233_4455_6677u64.to_le_bytes());
        let mut sensor = ready(fake, Ens210Config::default());

        assert_eq!(sensor.part_id().unwrap(), PART_ID);
        assert_eq!(sensor.uid().unwrap(), 0x0011_2233_4455_6677);
        assert!(sensor.system_active().unwrap());
        assert_eq!(
            sensor.sensor_status().unwrap(),
            SensorBusy {
                temperature: false,
                humidity: true
            }
        );

        sensor.stop().unwrap();
        let fake = sensor.release();
        assert_eq!(fake.writes_to(regs::SENS_STOP), vec![vec![0x03]]);
    }
}
