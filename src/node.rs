//! One sensor node: an ENS160 compensated by an ENS210.
//!
//! [`SensorNode::poll`] runs a single cycle (check for new gas data, measure
//! climate, compensate, read gas). Scheduling the cycles and storing the
//! resulting [`Sample`]s is up to the caller; [`Sink`] is the seam for the
//! time-series store.

use embedded_hal::{delay::DelayNs, i2c};

use crate::compensation::{self, CompensationPolicy};
use crate::ens160::{Ens160, GasReading, OperatingMode};
use crate::ens210::{ClimateReading, Ens210};
use crate::error::{self, SensorError};
use crate::{Milliseconds, Ready};

/// Measurement name of gas readings.
pub const GAS_MEASUREMENT: &str = "ENS160";
/// Measurement name of climate readings.
pub const CLIMATE_MEASUREMENT: &str = "ENS210";

/// Interval between OPMODE reads in [`SensorNode::wait_for_standard`].
pub const MODE_POLL_INTERVAL: Milliseconds = Milliseconds(100);

/// Value of a stored field.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FieldValue {
    Float(f64),
    Integer(i64),
}

/// A named field of a stored point.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Field {
    pub name: &'static str,
    pub value: FieldValue,
}

impl Field {
    fn float(name: &'static str, value: f64) -> Self {
        Field {
            name,
            value: FieldValue::Float(value),
        }
    }

    fn integer(name: &'static str, value: i64) -> Self {
        Field {
            name,
            value: FieldValue::Integer(value),
        }
    }
}

/// Destination of readings, e.g. a time-series database.
pub trait Sink {
    type Error;

    /// Stores one point. `timestamp` is in milliseconds since the Unix epoch.
    fn write(
        &mut self,
        measurement: &str,
        fields: &[Field],
        timestamp: u64,
    ) -> Result<(), Self::Error>;
}

impl GasReading {
    /// Fields stored for a gas reading: `status` (1..=4), `AQI`, `TVOC`,
    /// `eCO2` and the hot plate resistances `R0`..`R3` in Ohms.
    pub fn fields(&self) -> [Field; 8] {
        let ohms = |i: usize| f64::from(self.resistance_ohms(i).unwrap_or_default());
        [
            Field::integer("status", i64::from(self.validity.status_code())),
            Field::integer("AQI", i64::from(self.aqi)),
            Field::integer("TVOC", i64::from(self.tvoc_ppb)),
            Field::integer("eCO2", i64::from(self.eco2_ppm)),
            Field::float("R0", ohms(0)),
            Field::float("R1", ohms(1)),
            Field::float("R2", ohms(2)),
            Field::float("R3", ohms(3)),
        ]
    }
}

impl ClimateReading {
    /// Fields stored for a climate reading: `T`, `H` and the validity flags
    /// `T_status` / `H_status` (1 = valid).
    pub fn fields(&self) -> [Field; 4] {
        [
            Field::float("T", self.temperature_c),
            Field::float("H", self.humidity_pct),
            Field::integer("T_status", i64::from(self.temp_valid)),
            Field::integer("H_status", i64::from(self.humidity_valid)),
        ]
    }
}

/// Readings of one poll cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Sample {
    pub climate: ClimateReading,
    pub gas: GasReading,
}

impl Sample {
    /// Writes the gas point, then the climate point.
    pub fn publish<S: Sink>(&self, sink: &mut S, timestamp: u64) -> Result<(), S::Error> {
        sink.write(GAS_MEASUREMENT, &self.gas.fields(), timestamp)?;
        sink.write(CLIMATE_MEASUREMENT, &self.climate.fields(), timestamp)
    }
}

/// Owns both drivers and runs the measure, compensate, read cycle.
#[derive(Debug)]
pub struct SensorNode<I2C> {
    gas: Ens160<I2C, Ready>,
    climate: Ens210<I2C, Ready>,
    policy: CompensationPolicy,
}

impl<I2C, E> SensorNode<I2C>
where
    I2C: i2c::I2c<Error = E>,
{
    pub fn new(
        gas: Ens160<I2C, Ready>,
        climate: Ens210<I2C, Ready>,
        policy: CompensationPolicy,
    ) -> Self {
        Self {
            gas,
            climate,
            policy,
        }
    }

    /// Polls the gas sensor until it reports Standard mode.
    ///
    /// # Errors
    /// [`SensorError::Timeout`] after `attempts` reads without Standard mode.
    pub fn wait_for_standard(
        &mut self,
        delay: &mut impl DelayNs,
        attempts: u32,
    ) -> error::Result<(), E> {
        for _ in 0..attempts {
            if self.gas.mode()? == OperatingMode::Standard {
                debug!("ENS160 in standard mode");
                return Ok(());
            }
            delay.delay_ms(MODE_POLL_INTERVAL.0);
        }

        Err(SensorError::Timeout)
    }

    /// Runs one cycle.
    ///
    /// Returns `None` without touching the climate sensor if the gas sensor has
    /// no new data. Blocks for one ENS210 conversion otherwise.
    pub fn poll(&mut self, delay: &mut impl DelayNs) -> error::Result<Option<Sample>, E> {
        if !self.gas.status()?.new_data {
            return Ok(None);
        }

        let climate = self.climate.measure(delay)?;
        compensation::apply_with(&mut self.gas, &climate, self.policy)?;
        let gas = self.gas.read()?;

        Ok(Some(Sample { climate, gas }))
    }

    pub fn gas(&mut self) -> &mut Ens160<I2C, Ready> {
        &mut self.gas
    }

    pub fn climate(&mut self) -> &mut Ens210<I2C, Ready> {
        &mut self.climate
    }

    pub fn policy(&self) -> CompensationPolicy {
        self.policy
    }

    /// Splits the node back into its drivers.
    pub fn release(self) -> (Ens160<I2C, Ready>, Ens210<I2C, Ready>) {
        (self.gas, self.climate)
    }
}
