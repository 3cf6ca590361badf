//! Pick-and-place sequence task
//!
//! Runs the waypoint table forever. Moves and effector stages are timed
//! with busy-wait delays, so this task owns the core while it runs.

use defmt::*;
use embassy_rp::pwm::PwmOutput;
use embassy_time::Delay;

use gantry_core::effector::EndEffectorController;
use gantry_core::motion::PositionTracker;
use gantry_core::sequence::SequenceRunner;
use gantry_drivers::servo::HobbyServo;

use crate::board::Axis;
use crate::diagnostics::DefmtSink;
use crate::time::EmbassyClock;

/// Servo on one PWM channel
pub type Servo = HobbyServo<PwmOutput<'static>>;

/// X/Y gantry
pub type Tracker = PositionTracker<Axis, Axis, EmbassyClock>;

/// Rack and screw servos
pub type Effector = EndEffectorController<Servo, Servo, Delay>;

/// Fully wired sequence runner
pub type Runner = SequenceRunner<'static, Tracker, Effector, Delay, DefmtSink>;

/// Sequence task
#[embassy_executor::task]
pub async fn sequence_task(mut runner: Runner) {
    info!("Sequence task started");
    runner.run_forever()
}
