//! Host-side doubles for the device traits

use core::cell::{Cell, RefCell};
use std::vec::Vec;

use embedded_hal::delay::DelayNs;

use crate::motion::{MoveProfile, VelocityProfile};
use crate::traits::{Direction, MonotonicClock, ServoDriver, ServoError, StepperAxis, StepperError};

/// Clock that advances by a fixed tick on every read
pub struct FakeClock {
    now: Cell<u64>,
    tick: u64,
}

impl FakeClock {
    pub fn new(tick: u64) -> Self {
        Self {
            now: Cell::new(0),
            tick,
        }
    }
}

impl MonotonicClock for FakeClock {
    fn now_us(&self) -> u64 {
        let now = self.now.get();
        self.now.set(now + self.tick);
        now
    }
}

/// Stepper axis without pins, timed like the real controller
pub struct SimAxis {
    position: i64,
    direction: Direction,
    profile: Option<VelocityProfile>,
    last_edge_us: u64,
    step_high: bool,
    moves_started: u32,
    step_times: Vec<u64>,
    fail_at_edge: Option<u32>,
    edges: u32,
    fail_next_start: bool,
}

impl SimAxis {
    pub fn new() -> Self {
        Self {
            position: 0,
            direction: Direction::Increasing,
            profile: None,
            last_edge_us: 0,
            step_high: false,
            moves_started: 0,
            step_times: Vec::new(),
            fail_at_edge: None,
            edges: 0,
            fail_next_start: false,
        }
    }

    /// Fail the nth step edge (counted from one) with a pin error
    pub fn failing_at_edge(mut self, edge: u32) -> Self {
        self.fail_at_edge = Some(edge);
        self
    }

    /// Fail the next `begin_move` with a pin error
    pub fn failing_to_start(mut self) -> Self {
        self.fail_next_start = true;
        self
    }

    pub fn moves_started(&self) -> u32 {
        self.moves_started
    }

    /// Clock readings at which each step completed
    pub fn step_times(&self) -> &[u64] {
        &self.step_times
    }
}

impl StepperAxis for SimAxis {
    fn begin_move(
        &mut self,
        steps: i32,
        profile: MoveProfile,
        now_us: u64,
    ) -> Result<(), StepperError> {
        if self.is_moving() {
            return Err(StepperError::Busy);
        }
        if self.fail_next_start {
            self.fail_next_start = false;
            return Err(StepperError::Pin);
        }
        self.moves_started += 1;
        self.direction = Direction::from_steps(steps);
        self.profile = VelocityProfile::new(profile, steps.unsigned_abs());
        self.last_edge_us = now_us;
        self.step_high = false;
        Ok(())
    }

    fn step_if_due(&mut self, now_us: u64) -> Result<bool, StepperError> {
        let Some(profile) = self.profile.as_mut() else {
            return Ok(false);
        };
        if now_us.saturating_sub(self.last_edge_us) < profile.delay_us() as u64 {
            return Ok(true);
        }
        self.last_edge_us = now_us;
        self.edges += 1;
        if self.fail_at_edge == Some(self.edges) {
            self.abort();
            return Err(StepperError::Pin);
        }
        if !self.step_high {
            self.step_high = true;
            return Ok(true);
        }
        self.step_high = false;
        self.position += self.direction.sign();
        self.step_times.push(now_us);
        profile.advance();
        if profile.is_finished() {
            self.profile = None;
            return Ok(false);
        }
        Ok(true)
    }

    fn abort(&mut self) {
        self.profile = None;
        self.step_high = false;
    }

    fn is_moving(&self) -> bool {
        self.profile.is_some()
    }

    fn position_steps(&self) -> i64 {
        self.position
    }
}

/// One observable action of the effector hardware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Servo(&'static str, u8),
    DelayMs(u32),
}

pub type Trace = RefCell<Vec<Action>>;

/// Servo that appends every command to a shared trace
pub struct RecordingServo<'a> {
    name: &'static str,
    angle: u8,
    trace: &'a Trace,
    fail: bool,
}

impl<'a> RecordingServo<'a> {
    pub fn new(name: &'static str, trace: &'a Trace) -> Self {
        Self {
            name,
            angle: 0,
            trace,
            fail: false,
        }
    }

    /// Make every command fail with a PWM error
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

impl ServoDriver for RecordingServo<'_> {
    fn set_angle(&mut self, degrees: u8) -> Result<(), ServoError> {
        if self.fail {
            return Err(ServoError::Pwm);
        }
        self.angle = degrees;
        self.trace.borrow_mut().push(Action::Servo(self.name, degrees));
        Ok(())
    }

    fn angle(&self) -> u8 {
        self.angle
    }
}

/// Delay that appends millisecond waits to a shared trace
pub struct RecordingDelay<'a> {
    trace: &'a Trace,
}

impl<'a> RecordingDelay<'a> {
    pub fn new(trace: &'a Trace) -> Self {
        Self { trace }
    }
}

impl DelayNs for RecordingDelay<'_> {
    fn delay_ns(&mut self, ns: u32) {
        self.trace
            .borrow_mut()
            .push(Action::DelayMs(ns / 1_000_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.trace.borrow_mut().push(Action::DelayMs(ms));
    }
}
