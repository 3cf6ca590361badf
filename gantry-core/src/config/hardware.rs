//! Hardware configuration types
//!
//! Pin assignments for the axis motors and the effector servos, plus the
//! per-axis calibration.

use heapless::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::motion::{AxisCalibration, AxisId};

/// Maximum ganged motors on one axis
pub const MAX_MOTORS_PER_AXIS: usize = 4;

/// Pin configuration with optional inversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PinConfig {
    /// GPIO pin number (0-29 for RP2040)
    pub pin: u8,
    /// Drive the complement of the logical level
    #[cfg_attr(feature = "serde", serde(default))]
    pub inverted: bool,
}

impl PinConfig {
    /// Create a new pin config
    pub const fn new(pin: u8) -> Self {
        Self {
            pin,
            inverted: false,
        }
    }

    /// Create an inverted pin
    pub const fn inverted(pin: u8) -> Self {
        Self {
            pin,
            inverted: true,
        }
    }
}

/// One step/direction motor driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MotorHwConfig {
    /// Step pulse pin
    pub step_pin: u8,
    /// Direction pin; `inverted` for a motor mounted mirrored on a ganged axis
    pub dir_pin: PinConfig,
}

/// One logical axis
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AxisHwConfig {
    pub axis: AxisId,
    /// Motors driven in lockstep
    pub motors: Vec<MotorHwConfig, MAX_MOTORS_PER_AXIS>,
    /// Measured steps per millimetre
    pub steps_per_mm: f32,
    /// Minimum travel (mm)
    pub min_mm: f32,
    /// Maximum travel (mm)
    pub max_mm: f32,
}

impl AxisHwConfig {
    /// Calibration and bounds of this axis
    pub fn calibration(&self) -> AxisCalibration {
        AxisCalibration {
            steps_per_mm: self.steps_per_mm,
            min_mm: self.min_mm,
            max_mm: self.max_mm,
        }
    }
}

/// Hobby servo output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ServoHwConfig {
    /// PWM pin
    pub pin: u8,
    /// Pulse width at 0 degrees (us)
    pub min_pulse_us: u16,
    /// Pulse width at 180 degrees (us)
    pub max_pulse_us: u16,
}

impl ServoHwConfig {
    /// Create a servo on `pin` with the common 500-2500us range
    pub const fn new(pin: u8) -> Self {
        Self {
            pin,
            min_pulse_us: 500,
            max_pulse_us: 2500,
        }
    }
}

/// The two effector servos
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ServosConfig {
    pub rack: ServoHwConfig,
    pub screw: ServoHwConfig,
}

impl Default for ServosConfig {
    fn default() -> Self {
        Self {
            rack: ServoHwConfig::new(18),
            screw: ServoHwConfig::new(19),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_config() {
        let pin = PinConfig::new(10);
        assert_eq!(pin.pin, 10);
        assert!(!pin.inverted);

        let inverted = PinConfig::inverted(12);
        assert!(inverted.inverted);
    }

    #[test]
    fn test_axis_calibration() {
        let axis = AxisHwConfig {
            axis: AxisId::X,
            motors: Vec::new(),
            steps_per_mm: 5.2631,
            min_mm: 0.0,
            max_mm: 280.0,
        };
        let cal = axis.calibration();
        assert_eq!(cal.steps_per_mm, 5.2631);
        assert!(cal.is_in_bounds(280.0));
        assert!(!cal.is_in_bounds(280.1));
    }

    #[test]
    fn test_servo_defaults() {
        let servos = ServosConfig::default();
        assert_eq!(servos.rack.min_pulse_us, 500);
        assert_eq!(servos.screw.max_pulse_us, 2500);
        assert_ne!(servos.rack.pin, servos.screw.pin);
    }
}
