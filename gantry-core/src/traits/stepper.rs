//! Stepper axis trait
//!
//! This trait abstracts over a logical axis driven by one or more
//! step/direction motor drivers (A4988, DRV8825, TMC2209 in step mode, ...).

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::motion::MoveProfile;

/// Logical travel direction of an axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Direction {
    /// Position count goes up
    Increasing,
    /// Position count goes down
    Decreasing,
}

impl Direction {
    /// Direction implied by the sign of a step delta
    ///
    /// Zero maps to `Increasing`; zero-length moves never pulse anyway.
    pub fn from_steps(steps: i32) -> Self {
        if steps < 0 {
            Direction::Decreasing
        } else {
            Direction::Increasing
        }
    }

    /// Get the opposite direction
    pub fn opposite(self) -> Self {
        match self {
            Direction::Increasing => Direction::Decreasing,
            Direction::Decreasing => Direction::Increasing,
        }
    }

    /// Signed unit step for this direction
    pub fn sign(self) -> i64 {
        match self {
            Direction::Increasing => 1,
            Direction::Decreasing => -1,
        }
    }

    /// Direction line level for a motor
    ///
    /// `Increasing` drives the line high; an inverted motor sees the
    /// complement so that ganged motors turn the same physical way.
    pub fn level(self, inverted: bool) -> bool {
        (self == Direction::Increasing) != inverted
    }
}

/// Errors that can occur with stepper operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StepperError {
    /// A move was requested while the axis is still moving
    Busy,
    /// Writing a step or direction line failed
    Pin,
}

/// Trait for a logical stepper axis
///
/// Implementations own the step/direction lines of every motor bound to the
/// axis. The non-blocking pair `begin_move` / `step_if_due` is what the
/// motion scheduler drives; it must never block.
pub trait StepperAxis {
    /// Start a move of `steps` signed steps
    ///
    /// A zero-length move completes immediately. Fails with
    /// [`StepperError::Busy`] if a move is already in progress.
    fn begin_move(
        &mut self,
        steps: i32,
        profile: MoveProfile,
        now_us: u64,
    ) -> Result<(), StepperError>;

    /// Advance the current move if its step delay has elapsed
    ///
    /// Returns `Ok(true)` while the move is still in progress. An error
    /// ends the move; the axis is idle afterwards.
    fn step_if_due(&mut self, now_us: u64) -> Result<bool, StepperError>;

    /// End the current move where it is
    ///
    /// Completed steps stay counted. Does nothing when idle.
    fn abort(&mut self);

    /// Check if a move is in progress
    fn is_moving(&self) -> bool;

    /// Absolute position in steps since initialization
    fn position_steps(&self) -> i64;
}
