//! Hobby servo on a PWM channel
//!
//! Standard 50 Hz servo signal: a 20 ms frame with a pulse between the
//! configured minimum (0 degrees) and maximum (180 degrees) width.

use embedded_hal::pwm::SetDutyCycle;

use gantry_core::config::ServoHwConfig;
use gantry_core::traits::{ServoDriver, ServoError, MAX_SERVO_ANGLE};

/// Servo frame period in microseconds (50 Hz)
pub const FRAME_US: u16 = 20_000;

/// Hobby servo driver
pub struct HobbyServo<P> {
    pwm: P,
    min_pulse_us: u16,
    max_pulse_us: u16,
    angle: u8,
}

impl<P: SetDutyCycle> HobbyServo<P> {
    /// Create a servo driver
    ///
    /// The PWM channel must already run at a 20 ms period. Nothing is
    /// output until the first `set_angle`.
    pub fn new(pwm: P, min_pulse_us: u16, max_pulse_us: u16) -> Self {
        Self {
            pwm,
            min_pulse_us,
            max_pulse_us,
            angle: 0,
        }
    }

    /// Create a servo driver from its hardware configuration
    pub fn from_config(pwm: P, config: &ServoHwConfig) -> Self {
        Self::new(pwm, config.min_pulse_us, config.max_pulse_us)
    }

    /// Pulse width for an angle, in microseconds
    pub fn pulse_width_us(&self, degrees: u8) -> u16 {
        let span = self.max_pulse_us.saturating_sub(self.min_pulse_us) as u32;
        let offset = span * degrees.min(MAX_SERVO_ANGLE) as u32 / MAX_SERVO_ANGLE as u32;
        self.min_pulse_us + offset as u16
    }

    /// Release the PWM channel
    pub fn release(self) -> P {
        self.pwm
    }
}

impl<P: SetDutyCycle> ServoDriver for HobbyServo<P> {
    fn set_angle(&mut self, degrees: u8) -> Result<(), ServoError> {
        if degrees > MAX_SERVO_ANGLE {
            return Err(ServoError::AngleOutOfRange);
        }
        let pulse = self.pulse_width_us(degrees);
        self.pwm
            .set_duty_cycle_fraction(pulse, FRAME_US)
            .map_err(|_| ServoError::Pwm)?;
        self.angle = degrees;
        Ok(())
    }

    fn angle(&self) -> u8 {
        self.angle
    }
}
