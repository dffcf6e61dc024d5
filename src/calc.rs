//! Conversions between raw register values and physical units.
//!
//! The ENS210 reports temperature in 1/64 Kelvin and humidity in 1/512 %RH.
//! The ENS160 compensation inputs TEMP_IN and RH_IN use the same encodings, so
//! a climate reading can be written back without loss.

/// Offset between Kelvin and degrees Celsius.
const KELVIN_OFFSET: f64 = 273.15;
/// LSBs per Kelvin in T_VAL and TEMP_IN.
const TEMP_LSB_PER_KELVIN: f64 = 64.0;
/// LSBs per percent relative humidity in H_VAL and RH_IN.
const HUM_LSB_PER_PERCENT: f64 = 512.0;
/// GPR resistance registers hold `log2(R) * 2048`.
const GPR_LSB_PER_OCTAVE: f32 = 2048.0;

/// Converts a raw T_VAL reading into degrees Celsius.
///
/// `solder_correction` is given in raw counts and subtracted before scaling, to
/// cancel the self-heating offset of a soldered part.
pub fn raw_to_celsius(raw: u16, solder_correction: i32) -> f64 {
    (f64::from(raw) - f64::from(solder_correction)) / TEMP_LSB_PER_KELVIN - KELVIN_OFFSET
}

/// Converts a raw H_VAL reading into percent relative humidity.
pub fn raw_to_percent(raw: u16) -> f64 {
    f64::from(raw) / HUM_LSB_PER_PERCENT
}

/// Encodes degrees Celsius for the ENS160 TEMP_IN register.
///
/// Values outside the register range saturate at `0` / `u16::MAX`.
pub fn celsius_to_raw(celsius: f64) -> u16 {
    saturate_u16((celsius + KELVIN_OFFSET) * TEMP_LSB_PER_KELVIN)
}

/// Encodes percent relative humidity for the ENS160 RH_IN register.
pub fn percent_to_raw(percent: f64) -> u16 {
    saturate_u16(percent * HUM_LSB_PER_PERCENT)
}

/// Converts a raw ENS160 GPR resistance value into Ohms.
pub fn gpr_to_ohms(raw: u16) -> f32 {
    libm::powf(2.0, f32::from(raw) / GPR_LSB_PER_OCTAVE)
}

// Float to int `as` casts saturate and map NaN to 0.
fn saturate_u16(value: f64) -> u16 {
    libm::round(value) as u16
}
