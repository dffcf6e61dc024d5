//! Example: ENS160 + ENS210 sensor node on a Raspberry Pi.
//!
//! This example demonstrates:
//! 1. **Initialization**: Opening the I2C bus and bringing up both drivers.
//! 2. **Configuration**: Interrupt pin and initial compensation of the ENS160,
//!    written after it reports Standard mode.
//! 3. **Poll Cycle**: Measuring climate, compensating the gas sensor and
//!    reading gas data once per second.
//! 4. **Persistence**: Handing every sample to a sink. This one prints
//!    InfluxDB line protocol to stdout.
//!
//! Run with `cargo run --example raspberry_pi` on the Pi.

use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use ens_sensornode::node::{Field, FieldValue, Sink};
use ens_sensornode::*;
use rppal::hal::Delay;
use rppal::i2c::I2c;

const SAMPLING_INTERVAL: Duration = Duration::from_secs(1);
/// The ENS160 needs a few seconds after power-up before it reports Standard.
const MODE_POLL_ATTEMPTS: u32 = 100;

/// Prints every point as a line of InfluxDB line protocol.
struct LineProtocolSink;

impl Sink for LineProtocolSink {
    type Error = std::convert::Infallible;

    fn write(&mut self, measurement: &str, fields: &[Field], timestamp: u64) -> Result<(), Self::Error> {
        let fields: Vec<String> = fields
            .iter()
            .map(|field| match field.value {
                FieldValue::Float(v) => format!("{}={}", field.name, v),
                FieldValue::Integer(v) => format!("{}={}i", field.name, v),
            })
            .collect();
        println!("{} {} {}", measurement, fields.join(","), timestamp);
        Ok(())
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // --- 1. Hardware Setup ---
    // Each driver owns its own handle on /dev/i2c-1.
    let mut delay = Delay::new();

    // --- 2. Driver Initialization ---
    let gas_config = Ens160Builder::new()
        .address(ens160::ALTERNATE_ADDRESS)
        .interrupt(InterruptConfig {
            active_high: false, // active low
            push_pull: true,
            on_data: true,
            on_gpr: false,
            enable: true,
        })
        .build();

    let gas = Ens160::new(I2c::new()?, gas_config)
        .init()
        .map_err(|e| format!("ENS160 init failed: {e:?}"))?;

    let climate = Ens210::new(I2c::new()?, Ens210Config::default())
        .init(&mut delay)
        .map_err(|e| format!("ENS210 init failed: {e:?}"))?;

    let mut node = SensorNode::new(gas, climate, gas_config.compensation_policy);
    node.wait_for_standard(&mut delay, MODE_POLL_ATTEMPTS)
        .map_err(|e| format!("ENS160 did not reach standard mode: {e:?}"))?;

    // Interrupt and initial compensation only once the sensor runs.
    node.gas()
        .configure()
        .map_err(|e| format!("ENS160 configuration failed: {e:?}"))?;

    // --- 3. Measurement Loop ---
    let mut sink = LineProtocolSink;
    loop {
        match node.poll(&mut delay) {
            Ok(Some(sample)) => {
                // Infallible sink
                let _ = sample.publish(&mut sink, unix_millis());
            }
            Ok(None) => {}
            // Bus errors are not fatal for the loop, try again next cycle.
            Err(e) => eprintln!("poll failed: {e:?}"),
        }

        thread::sleep(SAMPLING_INTERVAL);
    }
}
