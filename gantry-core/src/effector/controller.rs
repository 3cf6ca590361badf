//! End effector controller
//!
//! Drives the rack servo and the screw gripper servo through the pick and
//! place choreographies. Open loop: a missed pick or a stuck rack cannot be
//! detected.

use embedded_hal::delay::DelayNs;
use heapless::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::stages::{Operation, RackTarget, RampSpeed, ScrewMode, Stage};
use super::state::{EffectorEvent, EffectorState};
use crate::traits::{ServoDriver, ServoError, MAX_SERVO_ANGLE};

/// Maximum stages recorded in the history
pub const MAX_HISTORY: usize = 16;

/// Effector errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EffectorError {
    /// A servo rejected a command
    Servo(ServoError),
    /// A stage list does not end with a rack stage
    InvalidTransition,
}

impl From<ServoError> for EffectorError {
    fn from(e: ServoError) -> Self {
        EffectorError::Servo(e)
    }
}

/// Servo angles and timings of the effector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EffectorConfig {
    /// Rack angle when retracted
    pub rack_top: u8,
    /// Rack angle part way down
    pub rack_middle: u8,
    /// Rack angle when fully extended
    pub rack_bottom: u8,
    /// Screw command that stops the gripper
    pub screw_off: u8,
    /// Screw command that drives the part in
    pub screw_in: u8,
    /// Screw command that engages the part
    pub screw_out: u8,
    /// Settle time for `Hold` stages (ms)
    pub hold_ms: u32,
    /// Per-unit delay of the lifting ramp after a pick (ms)
    pub pickup_ramp_ms: u32,
    /// Per-unit delay of the lowering ramp during a place (ms)
    pub place_ramp_ms: u32,
}

impl Default for EffectorConfig {
    fn default() -> Self {
        Self {
            rack_top: 0,
            rack_middle: 100,
            rack_bottom: 180,
            screw_off: 90,
            screw_in: 0,
            screw_out: 180,
            hold_ms: 500,
            pickup_ramp_ms: 20,
            place_ramp_ms: 15,
        }
    }
}

impl EffectorConfig {
    /// Rack angle of a named position
    pub fn rack_angle(&self, target: RackTarget) -> u8 {
        match target {
            RackTarget::Top => self.rack_top,
            RackTarget::Middle => self.rack_middle,
            RackTarget::Bottom => self.rack_bottom,
        }
    }

    /// Screw command of a mode
    pub fn screw_angle(&self, mode: ScrewMode) -> u8 {
        match mode {
            ScrewMode::Off => self.screw_off,
            ScrewMode::In => self.screw_in,
            ScrewMode::Out => self.screw_out,
        }
    }

    /// Per-unit ramp delay (ms)
    pub fn ramp_ms(&self, speed: RampSpeed) -> u32 {
        match speed {
            RampSpeed::Pickup => self.pickup_ramp_ms,
            RampSpeed::Place => self.place_ramp_ms,
        }
    }

    /// Check that every angle is one a servo accepts
    pub fn angles_in_range(&self) -> bool {
        [
            self.rack_top,
            self.rack_middle,
            self.rack_bottom,
            self.screw_off,
            self.screw_in,
            self.screw_out,
        ]
        .iter()
        .all(|a| *a <= MAX_SERVO_ANGLE)
    }
}

/// End effector controller
pub struct EndEffectorController<R, S, D> {
    rack: R,
    screw: S,
    delay: D,
    config: EffectorConfig,
    state: EffectorState,
    rack_position: u8,
    screw_angle: u8,
    history: Vec<Stage, MAX_HISTORY>,
}

impl<R: ServoDriver, S: ServoDriver, D: DelayNs> EndEffectorController<R, S, D> {
    /// Create a controller and put the effector in its rest pose
    ///
    /// The rack is retracted and the screw stopped.
    pub fn new(rack: R, screw: S, delay: D, config: EffectorConfig) -> Result<Self, EffectorError> {
        let mut controller = Self {
            rack,
            screw,
            delay,
            config,
            state: EffectorState::Idle,
            rack_position: config.rack_top,
            screw_angle: config.screw_off,
            history: Vec::new(),
        };
        controller.rack.set_angle(config.rack_top)?;
        controller.screw.set_angle(config.screw_off)?;
        Ok(controller)
    }

    /// Current state
    pub fn state(&self) -> EffectorState {
        self.state
    }

    /// Last commanded rack position
    pub fn rack_position(&self) -> u8 {
        self.rack_position
    }

    /// Last commanded screw angle
    pub fn screw_angle(&self) -> u8 {
        self.screw_angle
    }

    /// Get configuration reference
    pub fn config(&self) -> &EffectorConfig {
        &self.config
    }

    /// Stages completed by the most recent operation
    pub fn history(&self) -> &[Stage] {
        &self.history
    }

    /// Pick up a part at the current position
    pub fn pick_up(&mut self) -> Result<(), EffectorError> {
        self.run(Operation::PickUp)
    }

    /// Put down the held part at the current position
    pub fn put_down(&mut self) -> Result<(), EffectorError> {
        self.run(Operation::PutDown)
    }

    /// Run one operation to completion
    pub fn run(&mut self, operation: Operation) -> Result<(), EffectorError> {
        self.run_stages(operation.stages())
    }

    /// Run an arbitrary stage list to completion
    ///
    /// The list must end with a rack stage so the effector finishes
    /// retracted; anything else is rejected with
    /// [`EffectorError::InvalidTransition`] once the stages have run. On
    /// failure the state machine is aborted back to `Idle` and the servos
    /// are left at their last commanded angles. Only the first
    /// [`MAX_HISTORY`] stages are recorded.
    pub fn run_stages(&mut self, stages: &[Stage]) -> Result<(), EffectorError> {
        self.history.clear();

        for stage in stages {
            if let Err(e) = self.run_stage(*stage) {
                self.abort();
                return Err(e);
            }
            let _ = self.history.push(*stage);
        }

        if let Err(e) = self.apply(EffectorEvent::Finish) {
            self.abort();
            return Err(e);
        }
        Ok(())
    }

    fn abort(&mut self) {
        self.state = self
            .state
            .transition(EffectorEvent::Abort)
            .unwrap_or_default();
    }

    fn run_stage(&mut self, stage: Stage) -> Result<(), EffectorError> {
        match stage {
            Stage::RackTo(target) => {
                self.apply(EffectorEvent::StartRack)?;
                self.set_rack(self.config.rack_angle(target))
            }
            Stage::RackRamp(target, speed) => {
                self.apply(EffectorEvent::StartRack)?;
                self.ramp_rack(self.config.rack_angle(target), self.config.ramp_ms(speed))
            }
            Stage::Screw(mode) => {
                self.apply(EffectorEvent::StartScrew)?;
                let angle = self.config.screw_angle(mode);
                self.screw.set_angle(angle)?;
                self.screw_angle = angle;
                Ok(())
            }
            Stage::Hold => {
                self.delay.delay_ms(self.config.hold_ms);
                Ok(())
            }
        }
    }

    fn apply(&mut self, event: EffectorEvent) -> Result<(), EffectorError> {
        self.state = self
            .state
            .transition(event)
            .ok_or(EffectorError::InvalidTransition)?;
        Ok(())
    }

    fn set_rack(&mut self, angle: u8) -> Result<(), EffectorError> {
        self.rack.set_angle(angle)?;
        self.rack_position = angle;
        Ok(())
    }

    /// Sweep the rack to `target` one unit at a time
    fn ramp_rack(&mut self, target: u8, step_ms: u32) -> Result<(), EffectorError> {
        while self.rack_position != target {
            let next = if self.rack_position < target {
                self.rack_position + 1
            } else {
                self.rack_position - 1
            };
            self.set_rack(next)?;
            self.delay.delay_ms(step_ms);
        }
        Ok(())
    }
}
