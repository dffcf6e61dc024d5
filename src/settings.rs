use crate::compensation::CompensationPolicy;
use crate::ens160::{self, InterruptConfig};
use crate::ens210::{self, RunMode};

/// Start-up configuration of the ENS210 climate sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ens210Config {
    /// 7-bit I2C address.
    pub address: u8,
    /// Temperature offset in raw counts (1/64 K) subtracted from every reading.
    /// Compensates self-heating of a soldered part.
    pub solder_correction: i32,
    /// Low power mode lets the sensor drop to standby between conversions.
    pub low_power: bool,
    /// Run mode selected during initialization.
    pub run_mode: RunMode,
}

impl Default for Ens210Config {
    fn default() -> Self {
        Self {
            address: ens210::DEFAULT_ADDRESS,
            solder_correction: 0,
            low_power: true,
            run_mode: RunMode::SingleShot,
        }
    }
}

/// Start-up configuration of the ENS160 gas sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ens160Config {
    /// 7-bit I2C address.
    pub address: u8,
    /// Interrupt pin setup. `None` leaves the CONFIG register untouched.
    pub interrupt: Option<InterruptConfig>,
    /// Ambient temperature assumed until the first climate reading arrives.
    pub temperature_compensation: f64,
    /// Ambient humidity assumed until the first climate reading arrives.
    pub humidity_compensation: f64,
    /// How climate readings flagged invalid are fed back.
    pub compensation_policy: CompensationPolicy,
}

impl Default for Ens160Config {
    fn default() -> Self {
        Self {
            address: ens160::DEFAULT_ADDRESS,
            interrupt: None,
            temperature_compensation: 23.0,
            humidity_compensation: 50.0,
            compensation_policy: CompensationPolicy::Always,
        }
    }
}

/// Builder for an [`Ens210Config`].
#[derive(Default)]
pub struct Ens210Builder {
    config: Ens210Config,
}

impl Ens210Builder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the I2C address.
    pub fn address(mut self, address: u8) -> Self {
        self.config.address = address;
        self
    }

    /// Sets the solder correction in raw counts (1/64 K).
    pub fn solder_correction(mut self, counts: i32) -> Self {
        self.config.solder_correction = counts;
        self
    }

    /// Selects low (`true`) or high (`false`) power mode.
    pub fn low_power(mut self, enable: bool) -> Self {
        self.config.low_power = enable;
        self
    }

    pub fn run_mode(mut self, mode: RunMode) -> Self {
        self.config.run_mode = mode;
        self
    }

    pub fn build(self) -> Ens210Config {
        self.config
    }
}

/// Builder for an [`Ens160Config`].
#[derive(Default)]
pub struct Ens160Builder {
    config: Ens160Config,
}

impl Ens160Builder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the I2C address.
    pub fn address(mut self, address: u8) -> Self {
        self.config.address = address;
        self
    }

    /// Configures the INTn pin during [`Ens160::configure`](crate::Ens160::configure).
    pub fn interrupt(mut self, interrupt: InterruptConfig) -> Self {
        self.config.interrupt = Some(interrupt);
        self
    }

    /// Sets the initial compensation values.
    pub fn compensation(mut self, celsius: f64, percent: f64) -> Self {
        self.config.temperature_compensation = celsius;
        self.config.humidity_compensation = percent;
        self
    }

    pub fn compensation_policy(mut self, policy: CompensationPolicy) -> Self {
        self.config.compensation_policy = policy;
        self
    }

    pub fn build(self) -> Ens160Config {
        self.config
    }
}
