//! Hobby servo trait
//!
//! Positional servos (rack) and continuous-rotation servos (screw) are both
//! commanded with an angle in degrees, 0-180.

/// Largest angle a servo accepts
pub const MAX_SERVO_ANGLE: u8 = 180;

/// Errors that can occur with servo operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ServoError {
    /// Angle above [`MAX_SERVO_ANGLE`]
    AngleOutOfRange,
    /// PWM output rejected the duty cycle
    Pwm,
}

/// Trait for servo outputs
pub trait ServoDriver {
    /// Command the servo to an angle in degrees
    ///
    /// The servo starts travelling immediately; there is no position feedback.
    fn set_angle(&mut self, degrees: u8) -> Result<(), ServoError>;

    /// Last commanded angle
    fn angle(&self) -> u8;
}
