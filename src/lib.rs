#![cfg_attr(not(test), no_std)]

//! # ENS160 / ENS210 Sensor Node Drivers
//!
//! `no_std` drivers for the ScioSense ENS160 digital metal-oxide gas sensor and
//! the ENS210 relative humidity and temperature sensor, built on the blocking
//! `embedded-hal` 1.0 traits.
//!
//! The ENS160 estimates air quality more accurately when it knows the ambient
//! temperature and humidity. The [`compensation`] module feeds every ENS210
//! reading into the ENS160 compensation registers before the next gas read, and
//! [`node::SensorNode`] runs that whole cycle.
//!
//! Both drivers use the typestate pattern: a driver is created `Uninitialized`
//! and becomes `Ready` once the part id has been verified.
//!
//! ## Units
//! - **Temperature**: degrees Celsius (`f64`)
//! - **Humidity**: relative humidity in percent (`f64`)
//! - **TVOC**: parts per billion
//! - **eCO2**: parts per million

#[macro_use]
mod fmt;

pub mod bus;
pub mod calc;
pub mod compensation;
pub mod ens160;
pub mod ens210;
pub mod node;
pub mod settings;

#[cfg(test)]
mod mock;

pub use compensation::CompensationPolicy;
pub use ens160::{Ens160, GasReading, InterruptConfig, OperatingMode, Status, Validity};
pub use ens210::{ClimateReading, Ens210, RunMode};
pub use node::{Sample, SensorNode, Sink};
pub use settings::{Ens160Builder, Ens160Config, Ens210Builder, Ens210Config};

// --- Typestates ---

/// Driver has been created but the part id has not been verified yet.
#[derive(Debug)]
pub struct Uninitialized;
/// Part id verified, driver may talk to the sensor.
#[derive(Debug)]
pub struct Ready;

/// Error types shared by both drivers.
pub mod error {
    /// Errors that can occur during communication or configuration.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub enum SensorError<E> {
        /// I2C bus error. Never retried by the drivers.
        I2CError(E),
        /// The device at the given address reported an unexpected part id.
        IdentityMismatch {
            /// Part id the driver was built for.
            expected: u16,
            /// Part id the device reported.
            found: u16,
        },
        /// A read was attempted before the sensor flagged new data.
        DataNotReady,
        /// The caller asked for an operating mode code the sensor does not know.
        /// Rejected before anything is written.
        InvalidModeRequest(u8),
        /// The sensor reported an operating mode code outside the known set.
        UnknownMode(u8),
        /// Polling for a device state ran out of attempts.
        Timeout,
    }

    /// Result type alias for driver operations.
    pub type Result<T, E> = core::result::Result<T, SensorError<E>>;
}

/// Duration wrapper for type-safety. Stored in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Milliseconds(pub u32);
