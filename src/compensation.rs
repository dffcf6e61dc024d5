//! Feeds ENS210 readings into the ENS160 compensation registers.
//!
//! Call [`apply`] right before every [`Ens160::read`]. There is no caching and no
//! staleness check; every call overwrites both registers.

use embedded_hal::i2c;

use crate::ens160::Ens160;
use crate::ens210::ClimateReading;
use crate::error;
use crate::Ready;

/// What to do with climate values the ENS210 flagged invalid.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CompensationPolicy {
    /// Write the numeric value regardless of its validity flag.
    #[default]
    Always,
    /// Keep the previous compensation value of a channel flagged invalid.
    SkipInvalid,
}

/// Which compensation registers a call wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Applied {
    pub temperature: bool,
    pub humidity: bool,
}

/// Writes temperature, then humidity of `climate` into the gas sensor.
///
/// Values flagged invalid are written as well.
pub fn apply<I2C, E>(gas: &mut Ens160<I2C, Ready>, climate: &ClimateReading) -> error::Result<(), E>
where
    I2C: i2c::I2c<Error = E>,
{
    apply_with(gas, climate, CompensationPolicy::Always).map(|_| ())
}

/// Writes `climate` into the gas sensor as allowed by `policy`.
pub fn apply_with<I2C, E>(
    gas: &mut Ens160<I2C, Ready>,
    climate: &ClimateReading,
    policy: CompensationPolicy,
) -> error::Result<Applied, E>
where
    I2C: i2c::I2c<Error = E>,
{
    let applied = match policy {
        CompensationPolicy::Always => Applied {
            temperature: true,
            humidity: true,
        },
        CompensationPolicy::SkipInvalid => Applied {
            temperature: climate.temp_valid,
            humidity: climate.humidity_valid,
        },
    };

    if applied.temperature {
        if !climate.temp_valid {
            debug!("compensating with invalid temperature {=f64}", climate.temperature_c);
        }
        gas.set_temperature_compensation(climate.temperature_c)?;
    }

    if applied.humidity {
        if !climate.humidity_valid {
            debug!("compensating with invalid humidity {=f64}", climate.humidity_pct);
        }
        gas.set_humidity_compensation(climate.humidity_pct)?;
    }

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ens160::{regs, DEFAULT_ADDRESS, PART_ID};
    use crate::mock::FakeI2c;
    use crate::settings::Ens160Config;

    fn gas() -> Ens160<FakeI2c, Ready> {
        let fake = FakeI2c::new(DEFAULT_ADDRESS).with_u16(regs::PART_ID, PART_ID);
        Ens160::new(fake, Ens160Config::default()).init().unwrap()
    }

    fn reading(temp_valid: bool, humidity_valid: bool) -> ClimateReading {
        ClimateReading {
            temperature_c: 21.5,
            humidity_pct: 40.0,
            temp_valid,
            humidity_valid,
        }
    }

    #[test]
    fn writes_temperature_then_humidity() {
        let mut gas = gas();
        apply(&mut gas, &reading(true, true)).unwrap();

        let fake = gas.release();
        assert_eq!(
            fake.written_regs(),
            vec![regs::OPMODE, regs::TEMP_IN, regs::RH_IN]
        );
        // (21.5 + 273.15) * 64 = 18857.6, 40 * 512 = 20480
        assert_eq!(fake.writes_to(regs::TEMP_IN), vec![vec![0xAA, 0x49]]);
        assert_eq!(fake.writes_to(regs::RH_IN), vec![vec![0x00, 0x50]]);
    }

    #[test]
    fn invalid_readings_pass_through() {
        let mut gas = gas();
        apply(&mut gas, &reading(false, false)).unwrap();
        apply(&mut gas, &reading(false, false)).unwrap();

        let fake = gas.release();
        assert_eq!(fake.writes_to(regs::TEMP_IN).len(), 2);
        assert_eq!(fake.writes_to(regs::RH_IN).len(), 2);
    }

    #[test]
    fn skip_invalid_keeps_previous_value() {
        let mut gas = gas();
        let applied =
            apply_with(&mut gas, &reading(true, false), CompensationPolicy::SkipInvalid).unwrap();
        assert_eq!(
            applied,
            Applied {
                temperature: true,
                humidity: false
            }
        );

        let fake = gas.release();
        assert_eq!(fake.writes_to(regs::TEMP_IN).len(), 1);
        assert!(fake.writes_to(regs::RH_IN).is_empty());
    }
}
