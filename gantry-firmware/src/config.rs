//! Embedded machine configuration
//!
//! machine.toml is validated and encoded by the build script; the firmware
//! only decodes the postcard bytes.

use defmt::*;
use heapless::Vec;

use gantry_core::config::{AxisHwConfig, MachineConfig, MotorHwConfig, PinConfig};
use gantry_core::motion::{AxisCalibration, AxisId};

/// Encoded machine.toml
const MACHINE_BLOB: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/machine.bin"));

/// Load the embedded configuration
///
/// Falls back to a minimal single-motor gantry with an empty waypoint
/// table if the blob does not decode or validate.
pub fn load() -> MachineConfig {
    let config = match postcard::from_bytes::<MachineConfig>(MACHINE_BLOB) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to decode embedded config: {:?}", Debug2Format(&e));
            error!("Using minimal fallback configuration");
            return create_minimal_fallback_config();
        }
    };

    match config.validate() {
        Ok(()) => {
            info!("Decoded embedded configuration ({} bytes)", MACHINE_BLOB.len());
            config
        }
        Err(e) => {
            error!("Embedded config rejected: {:?}", e);
            error!("Using minimal fallback configuration");
            create_minimal_fallback_config()
        }
    }
}

/// Minimal fallback configuration
///
/// One motor per axis on the first pool pins. With no waypoints the
/// sequence only homes and pauses.
fn create_minimal_fallback_config() -> MachineConfig {
    let mut config = MachineConfig::default();

    for (axis, step_pin, dir_pin) in [(AxisId::X, 2, 3), (AxisId::Y, 4, 5)] {
        let mut motors = Vec::new();
        let _ = motors.push(MotorHwConfig {
            step_pin,
            dir_pin: PinConfig::new(dir_pin),
        });
        let calibration = AxisCalibration::default();
        let _ = config.axes.push(AxisHwConfig {
            axis,
            motors,
            steps_per_mm: calibration.steps_per_mm,
            min_mm: calibration.min_mm,
            max_mm: calibration.max_mm,
        });
    }

    config
}
