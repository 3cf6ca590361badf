//! Machine configuration
//!
//! The top-level configuration is written as TOML on the host, checked
//! with [`MachineConfig::validate`] and shipped to the firmware as
//! postcard-serialized binary data.

use heapless::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::hardware::{AxisHwConfig, ServoHwConfig, ServosConfig};
use crate::effector::EffectorConfig;
use crate::motion::{AxisId, MoveProfile, TrackerConfig};
use crate::sequence::SequenceConfig;

/// Current configuration format version
pub const CONFIG_VERSION: u8 = 1;

/// Maximum axis entries per config
pub const MAX_AXIS_CONFIGS: usize = 2;

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Version field does not match [`CONFIG_VERSION`]
    VersionMismatch(u8),
    /// No configuration for a required axis
    MissingAxis(AxisId),
    /// Two entries for the same axis
    DuplicateAxis(AxisId),
    /// Axis has no motors
    NoMotors(AxisId),
    /// Steps per mm is not a positive finite number
    InvalidCalibration(AxisId),
    /// Minimum travel exceeds maximum travel
    InvalidBounds(AxisId),
    /// Cruise delay is zero or above the start delay, or no acceleration
    InvalidProfile,
    /// An effector angle is above 180 degrees
    ServoAngle,
    /// Servo pulse range is empty
    ServoPulse,
    /// A GPIO pin is assigned twice
    DuplicatePin(u8),
}

/// Complete machine configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MachineConfig {
    /// Configuration version for compatibility checks
    pub version: u8,
    /// Axis configurations
    pub axes: Vec<AxisHwConfig, MAX_AXIS_CONFIGS>,
    /// Velocity profile used for gantry moves
    #[cfg_attr(feature = "serde", serde(default))]
    pub profile: MoveProfile,
    /// Effector angles and timings
    #[cfg_attr(feature = "serde", serde(default))]
    pub effector: EffectorConfig,
    /// Effector servo outputs
    #[cfg_attr(feature = "serde", serde(default))]
    pub servos: ServosConfig,
    /// Home position, timings and waypoint table
    #[cfg_attr(feature = "serde", serde(default))]
    pub sequence: SequenceConfig,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            axes: Vec::new(),
            profile: MoveProfile::default(),
            effector: EffectorConfig::default(),
            servos: ServosConfig::default(),
            sequence: SequenceConfig::default(),
        }
    }
}

impl MachineConfig {
    /// Create a new empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Find an axis by identifier
    pub fn find_axis(&self, axis: AxisId) -> Option<&AxisHwConfig> {
        self.axes.iter().find(|a| a.axis == axis)
    }

    /// Tracker configuration for the X/Y gantry
    pub fn tracker_config(&self) -> Result<TrackerConfig, ConfigError> {
        let x = self
            .find_axis(AxisId::X)
            .ok_or(ConfigError::MissingAxis(AxisId::X))?;
        let y = self
            .find_axis(AxisId::Y)
            .ok_or(ConfigError::MissingAxis(AxisId::Y))?;
        Ok(TrackerConfig {
            x: x.calibration(),
            y: y.calibration(),
            profile: self.profile,
            home: self.sequence.home,
        })
    }

    /// Check the configuration for values the machine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != CONFIG_VERSION {
            return Err(ConfigError::VersionMismatch(self.version));
        }

        for axis in [AxisId::X, AxisId::Y] {
            let mut matching = self.axes.iter().filter(|a| a.axis == axis);
            let cfg = matching.next().ok_or(ConfigError::MissingAxis(axis))?;
            if matching.next().is_some() {
                return Err(ConfigError::DuplicateAxis(axis));
            }
            if cfg.motors.is_empty() {
                return Err(ConfigError::NoMotors(axis));
            }
            if !(cfg.steps_per_mm.is_finite() && cfg.steps_per_mm > 0.0) {
                return Err(ConfigError::InvalidCalibration(axis));
            }
            if !(cfg.min_mm <= cfg.max_mm) {
                return Err(ConfigError::InvalidBounds(axis));
            }
        }

        if !self.profile.is_valid() || self.profile.accel_us == 0 {
            return Err(ConfigError::InvalidProfile);
        }

        if !self.effector.angles_in_range() {
            return Err(ConfigError::ServoAngle);
        }
        for servo in [&self.servos.rack, &self.servos.screw] {
            if servo.min_pulse_us >= servo.max_pulse_us {
                return Err(ConfigError::ServoPulse);
            }
        }

        self.check_pins()
    }

    fn check_pins(&self) -> Result<(), ConfigError> {
        let mut used: Vec<u8, 32> = Vec::new();
        let motor_pins = self
            .axes
            .iter()
            .flat_map(|a| a.motors.iter())
            .flat_map(|m| [m.step_pin, m.dir_pin.pin]);
        let servo_pins = [self.servos.rack, self.servos.screw]
            .into_iter()
            .map(|s: ServoHwConfig| s.pin);

        for pin in motor_pins.chain(servo_pins) {
            if used.contains(&pin) {
                return Err(ConfigError::DuplicatePin(pin));
            }
            // More pins than the RP2040 has means a duplicate was found above
            let _ = used.push(pin);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::hardware::{MotorHwConfig, PinConfig};

    fn axis(axis: AxisId, pins: &[(u8, u8, bool)]) -> AxisHwConfig {
        let mut motors = Vec::new();
        for &(step, dir, inverted) in pins {
            motors
                .push(MotorHwConfig {
                    step_pin: step,
                    dir_pin: PinConfig { pin: dir, inverted },
                })
                .unwrap();
        }
        AxisHwConfig {
            axis,
            motors,
            steps_per_mm: 5.2631,
            min_mm: 0.0,
            max_mm: 250.0,
        }
    }

    fn valid() -> MachineConfig {
        let mut config = MachineConfig::new();
        config.axes.push(axis(AxisId::X, &[(2, 3, false)])).unwrap();
        config
            .axes
            .push(axis(AxisId::Y, &[(4, 5, false), (6, 7, true)]))
            .unwrap();
        config
    }

    #[test]
    fn test_valid_config() {
        let config = valid();
        assert_eq!(config.validate(), Ok(()));
        let tracker = config.tracker_config().unwrap();
        assert_eq!(tracker.x.steps_per_mm, 5.2631);
        assert_eq!(tracker.profile, MoveProfile::default());
    }

    #[test]
    fn test_empty_config() {
        let config = MachineConfig::new();
        assert!(config.axes.is_empty());
        assert_eq!(
            config.validate(),
            Err(ConfigError::MissingAxis(AxisId::X))
        );
        assert!(config.tracker_config().is_err());
    }

    #[test]
    fn test_version_checked() {
        let mut config = valid();
        config.version = 9;
        assert_eq!(config.validate(), Err(ConfigError::VersionMismatch(9)));
    }

    #[test]
    fn test_axis_checks() {
        let mut config = valid();
        config.axes[0].steps_per_mm = 0.0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidCalibration(AxisId::X))
        );

        let mut config = valid();
        config.axes[1].min_mm = 300.0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidBounds(AxisId::Y)));

        let mut config = valid();
        config.axes[1].motors.clear();
        assert_eq!(config.validate(), Err(ConfigError::NoMotors(AxisId::Y)));

        let mut config = valid();
        config.axes[1].axis = AxisId::X;
        assert_eq!(config.validate(), Err(ConfigError::DuplicateAxis(AxisId::X)));
    }

    #[test]
    fn test_profile_checked() {
        let mut config = valid();
        config.profile = MoveProfile::new(400, 500, 10);
        assert_eq!(config.validate(), Err(ConfigError::InvalidProfile));

        config.profile = MoveProfile::new(2000, 500, 0);
        assert_eq!(config.validate(), Err(ConfigError::InvalidProfile));
    }

    #[test]
    fn test_effector_checked() {
        let mut config = valid();
        config.effector.rack_bottom = 181;
        assert_eq!(config.validate(), Err(ConfigError::ServoAngle));

        let mut config = valid();
        config.servos.screw.min_pulse_us = 2500;
        assert_eq!(config.validate(), Err(ConfigError::ServoPulse));
    }

    #[test]
    fn test_duplicate_pin() {
        let mut config = valid();
        config.servos.rack.pin = 7;
        assert_eq!(config.validate(), Err(ConfigError::DuplicatePin(7)));
    }
}
