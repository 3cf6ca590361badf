//! Logical axis controller
//!
//! One axis made of one or more ganged motors. Moves can run blocking
//! (`move_by_steps`, holding the caller for the whole move) or be advanced
//! incrementally through [`StepperAxis`] by the motion scheduler.
//!
//! In incremental mode the controller keeps the timestamp of the last step
//! edge. Each call to `step_if_due` flips the step lines only once the
//! current delay has elapsed; a step counts (and the next delay is
//! computed) on the falling edge.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use gantry_core::config::MAX_MOTORS_PER_AXIS;
use gantry_core::motion::{AxisCalibration, MoveProfile, VelocityProfile};
use gantry_core::traits::{Direction, StepperAxis, StepperError};

use super::pulse::StepPulseGenerator;

/// Controller for one logical axis
pub struct AxisController<S, D, const N: usize = MAX_MOTORS_PER_AXIS> {
    pulses: StepPulseGenerator<S, D, N>,
    calibration: AxisCalibration,
    position: i64,
    direction: Direction,
    profile: Option<VelocityProfile>,
    last_edge_us: u64,
}

impl<S: OutputPin, D: OutputPin, const N: usize> AxisController<S, D, N> {
    /// Create an axis over a set of bound motors
    pub fn new(pulses: StepPulseGenerator<S, D, N>, calibration: AxisCalibration) -> Self {
        Self {
            pulses,
            calibration,
            position: 0,
            direction: Direction::Increasing,
            profile: None,
            last_edge_us: 0,
        }
    }

    /// Direction of the current or last move
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Get calibration reference
    pub fn calibration(&self) -> &AxisCalibration {
        &self.calibration
    }

    /// Position in millimetres derived from the step count
    pub fn position_mm(&self) -> f32 {
        self.calibration.steps_to_mm(self.position)
    }

    /// Steps remaining in the current move
    pub fn remaining_steps(&self) -> u32 {
        self.profile
            .as_ref()
            .map(|p| p.total_steps() - p.steps_done())
            .unwrap_or(0)
    }

    /// Borrow the pulse generator
    pub fn pulses(&self) -> &StepPulseGenerator<S, D, N> {
        &self.pulses
    }

    /// Move by a signed number of steps, blocking until done
    ///
    /// Each step holds the step lines high and then low for the profile
    /// delay of that step.
    pub fn move_by_steps<T: DelayNs>(
        &mut self,
        steps: i32,
        profile: MoveProfile,
        delay: &mut T,
    ) -> Result<(), StepperError> {
        if self.is_moving() {
            return Err(StepperError::Busy);
        }
        if steps == 0 {
            return Ok(());
        }

        self.direction = Direction::from_steps(steps);
        self.pulses.set_direction(self.direction)?;
        for half_period_us in profile.delays(steps.unsigned_abs()) {
            self.pulses.pulse(delay, half_period_us)?;
            self.position += self.direction.sign();
        }

        #[cfg(feature = "defmt")]
        defmt::trace!("axis moved {} steps, now at {}", steps, self.position);

        Ok(())
    }

    /// Move by a distance in millimetres, blocking until done
    pub fn move_by_mm<T: DelayNs>(
        &mut self,
        distance_mm: f32,
        profile: MoveProfile,
        delay: &mut T,
    ) -> Result<(), StepperError> {
        let steps = self.calibration.mm_to_steps(distance_mm) as i32;
        self.move_by_steps(steps, profile, delay)
    }
}

impl<S: OutputPin, D: OutputPin, const N: usize> StepperAxis for AxisController<S, D, N> {
    fn begin_move(
        &mut self,
        steps: i32,
        profile: MoveProfile,
        now_us: u64,
    ) -> Result<(), StepperError> {
        if self.is_moving() {
            return Err(StepperError::Busy);
        }
        let Some(running) = VelocityProfile::new(profile, steps.unsigned_abs()) else {
            return Ok(());
        };

        self.direction = Direction::from_steps(steps);
        if let Err(e) = self
            .pulses
            .set_direction(self.direction)
            .and_then(|()| self.pulses.set_step(false))
        {
            self.abort();
            return Err(e);
        }
        self.profile = Some(running);
        self.last_edge_us = now_us;
        Ok(())
    }

    fn step_if_due(&mut self, now_us: u64) -> Result<bool, StepperError> {
        let Some(running) = self.profile.as_mut() else {
            return Ok(false);
        };
        if now_us.saturating_sub(self.last_edge_us) < running.delay_us() as u64 {
            return Ok(true);
        }

        self.last_edge_us = now_us;
        let step_high = match self.pulses.toggle_step() {
            Ok(high) => high,
            Err(e) => {
                self.abort();
                return Err(e);
            }
        };
        if !step_high {
            // Falling edge completes the step
            self.position += self.direction.sign();
            running.advance();
            if running.is_finished() {
                self.profile = None;
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn abort(&mut self) {
        self.profile = None;
        // Best effort: the line that just failed may fail again
        let _ = self.pulses.set_step(false);
    }

    fn is_moving(&self) -> bool {
        self.profile.is_some()
    }

    fn position_steps(&self) -> i64 {
        self.position
    }
}
