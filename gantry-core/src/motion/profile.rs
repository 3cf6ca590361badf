//! Step-delay velocity profile
//!
//! Speed is expressed as the delay between step pulse edges: a smaller delay
//! means a faster motor. A move accelerates (delay shrinks towards the cruise
//! floor) for the first 75% of its steps and decelerates (delay grows back
//! towards the start delay) for the remaining 25%. Short moves never reach
//! cruise speed.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default starting (and slowest) step delay in microseconds
pub const DEFAULT_START_DELAY_US: u32 = 2000;

/// Default cruise (fastest) step delay in microseconds
pub const DEFAULT_MIN_DELAY_US: u32 = 500;

/// Default delay change per step in microseconds
pub const DEFAULT_ACCEL_US: u32 = 10;

/// Fraction of a move spent accelerating, as numerator / denominator
const ACCEL_NUM: u64 = 3;
const ACCEL_DEN: u64 = 4;

/// Current phase of a profiled move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProfilePhase {
    /// Delay is shrinking towards the cruise floor
    Accelerating,
    /// Delay is growing back towards the start delay
    Decelerating,
}

/// Timing parameters for one move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MoveProfile {
    /// Delay for the first step; also the ceiling while decelerating
    pub start_delay_us: u32,
    /// Cruise floor; the delay never drops below this
    pub min_delay_us: u32,
    /// Delay change applied per step
    pub accel_us: u32,
}

impl Default for MoveProfile {
    fn default() -> Self {
        Self {
            start_delay_us: DEFAULT_START_DELAY_US,
            min_delay_us: DEFAULT_MIN_DELAY_US,
            accel_us: DEFAULT_ACCEL_US,
        }
    }
}

impl MoveProfile {
    /// Create a profile
    pub const fn new(start_delay_us: u32, min_delay_us: u32, accel_us: u32) -> Self {
        Self {
            start_delay_us,
            min_delay_us,
            accel_us,
        }
    }

    /// Check that the cruise floor does not exceed the start delay
    pub fn is_valid(&self) -> bool {
        self.min_delay_us > 0 && self.min_delay_us <= self.start_delay_us
    }

    /// Phase of step `step_index` within a move of `total_steps`
    pub fn phase(step_index: u32, total_steps: u32) -> ProfilePhase {
        if (step_index as u64) * ACCEL_DEN < (total_steps as u64) * ACCEL_NUM {
            ProfilePhase::Accelerating
        } else {
            ProfilePhase::Decelerating
        }
    }

    /// Compute the delay that follows step `step_index`
    ///
    /// The result is always within `[min_delay_us, start_delay_us]`, even if
    /// `previous_delay_us` is not. Callers must not profile zero-length moves.
    pub fn delay_for_step(&self, step_index: u32, total_steps: u32, previous_delay_us: u32) -> u32 {
        let next = match Self::phase(step_index, total_steps) {
            ProfilePhase::Accelerating => previous_delay_us.saturating_sub(self.accel_us),
            ProfilePhase::Decelerating => previous_delay_us.saturating_add(self.accel_us),
        };
        next.min(self.start_delay_us).max(self.min_delay_us)
    }

    /// Iterate over the delay used for each step of a move
    pub fn delays(&self, total_steps: u32) -> DelayIter {
        DelayIter {
            profile: *self,
            total_steps,
            step_index: 0,
            delay_us: self.start_delay_us,
        }
    }

    /// Estimate how long a move takes in microseconds
    ///
    /// Each step is a high and a low edge, each held for the step delay.
    pub fn duration_us(&self, total_steps: u32) -> u64 {
        self.delays(total_steps).map(|d| 2 * d as u64).sum()
    }
}

/// Iterator over per-step delays of a move
#[derive(Debug, Clone)]
pub struct DelayIter {
    profile: MoveProfile,
    total_steps: u32,
    step_index: u32,
    delay_us: u32,
}

impl Iterator for DelayIter {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.step_index >= self.total_steps {
            return None;
        }
        let current = self.delay_us;
        self.delay_us =
            self.profile
                .delay_for_step(self.step_index, self.total_steps, self.delay_us);
        self.step_index += 1;
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.total_steps - self.step_index) as usize;
        (remaining, Some(remaining))
    }
}

/// Running velocity profile for one move in progress
///
/// Holds the step counter and the current delay. [`VelocityProfile::advance`]
/// is called once per completed step.
#[derive(Debug, Clone)]
pub struct VelocityProfile {
    profile: MoveProfile,
    total_steps: u32,
    step_index: u32,
    delay_us: u32,
}

impl VelocityProfile {
    /// Start a profile for a move of `total_steps`
    ///
    /// Returns `None` for a zero-length move, which must be skipped.
    pub fn new(profile: MoveProfile, total_steps: u32) -> Option<Self> {
        if total_steps == 0 {
            return None;
        }
        Some(Self {
            profile,
            total_steps,
            step_index: 0,
            delay_us: profile.start_delay_us.max(profile.min_delay_us),
        })
    }

    /// Delay to wait before the next pulse edge
    pub fn delay_us(&self) -> u32 {
        self.delay_us
    }

    /// Steps completed so far
    pub fn steps_done(&self) -> u32 {
        self.step_index
    }

    /// Total steps in the move
    pub fn total_steps(&self) -> u32 {
        self.total_steps
    }

    /// Check if all steps have been taken
    pub fn is_finished(&self) -> bool {
        self.step_index >= self.total_steps
    }

    /// Current phase of the move
    pub fn phase(&self) -> ProfilePhase {
        MoveProfile::phase(self.step_index, self.total_steps)
    }

    /// Check if the delay is at the cruise floor
    pub fn is_cruising(&self) -> bool {
        self.delay_us == self.profile.min_delay_us
    }

    /// Record a completed step and compute the next delay
    ///
    /// Returns the new delay. Does nothing once the move is finished.
    pub fn advance(&mut self) -> u32 {
        if self.is_finished() {
            return self.delay_us;
        }
        self.delay_us = self
            .profile
            .delay_for_step(self.step_index, self.total_steps, self.delay_us);
        self.step_index += 1;
        self.delay_us
    }
}
