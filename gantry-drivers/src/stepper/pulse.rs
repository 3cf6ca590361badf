//! Step pulse generation
//!
//! Drives the step and direction lines of every motor bound to one logical
//! axis. Ganged motors are pulsed in lockstep; each motor's direction line
//! gets the logical level with its own inversion applied, so two motors
//! mounted mirror-image still push the carriage the same way.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{OutputPin, PinState};
use heapless::Vec;

use gantry_core::config::MAX_MOTORS_PER_AXIS;
use gantry_core::traits::{Direction, StepperError};

/// Step/direction lines of one motor
pub struct MotorBinding<S, D> {
    step: S,
    dir: D,
    inverted: bool,
}

impl<S, D> MotorBinding<S, D> {
    /// Bind a motor's step and direction lines
    pub fn new(step: S, dir: D, inverted: bool) -> Self {
        Self {
            step,
            dir,
            inverted,
        }
    }

    /// Check if the direction line is inverted
    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    /// Release the pins
    pub fn into_pins(self) -> (S, D) {
        (self.step, self.dir)
    }
}

/// Pulse generator for all motors of one axis
pub struct StepPulseGenerator<S, D, const N: usize = MAX_MOTORS_PER_AXIS> {
    motors: Vec<MotorBinding<S, D>, N>,
    step_high: bool,
    direction: Option<Direction>,
}

impl<S, D, const N: usize> Default for StepPulseGenerator<S, D, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, D, const N: usize> StepPulseGenerator<S, D, N> {
    /// Create a generator with no motors
    pub fn new() -> Self {
        Self {
            motors: Vec::new(),
            step_high: false,
            direction: None,
        }
    }

    /// Bind another motor to the axis
    ///
    /// Hands the binding back if the axis is full.
    pub fn bind(&mut self, motor: MotorBinding<S, D>) -> Result<(), MotorBinding<S, D>> {
        self.motors.push(motor)
    }

    /// Number of bound motors
    pub fn motor_count(&self) -> usize {
        self.motors.len()
    }

    /// Check if the step lines are currently high
    pub fn is_step_high(&self) -> bool {
        self.step_high
    }

    /// Last direction written
    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    /// Borrow the bound motors
    pub fn motors(&self) -> &[MotorBinding<S, D>] {
        &self.motors
    }
}

impl<S: OutputPin, D: OutputPin, const N: usize> StepPulseGenerator<S, D, N> {
    /// Write the direction line of every motor
    pub fn set_direction(&mut self, direction: Direction) -> Result<(), StepperError> {
        for motor in self.motors.iter_mut() {
            let level = PinState::from(direction.level(motor.inverted));
            motor
                .dir
                .set_state(level)
                .map_err(|_| StepperError::Pin)?;
        }
        self.direction = Some(direction);
        Ok(())
    }

    /// Drive every step line to one level
    pub fn set_step(&mut self, high: bool) -> Result<(), StepperError> {
        let level = PinState::from(high);
        for motor in self.motors.iter_mut() {
            motor
                .step
                .set_state(level)
                .map_err(|_| StepperError::Pin)?;
        }
        self.step_high = high;
        Ok(())
    }

    /// Flip every step line; returns the new level
    pub fn toggle_step(&mut self) -> Result<bool, StepperError> {
        let next = !self.step_high;
        self.set_step(next)?;
        Ok(next)
    }

    /// Emit one full pulse, holding each edge for `half_period_us`
    pub fn pulse<T: DelayNs>(&mut self, delay: &mut T, half_period_us: u32) -> Result<(), StepperError> {
        self.set_step(true)?;
        delay.delay_us(half_period_us);
        self.set_step(false)?;
        delay.delay_us(half_period_us);
        Ok(())
    }
}
