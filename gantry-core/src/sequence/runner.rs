//! Waypoint sequence runner
//!
//! Visits every (load, hole) pair in order: move to the load position,
//! pick, move to the hole, place. After the last pair the runner pauses
//! and starts over. Failures are reported to the diagnostics sink and the
//! runner carries on with the next call.

use embedded_hal::delay::DelayNs;

use super::table::{Label, WaypointPair};
use crate::effector::{EffectorError, EndEffectorController};
use crate::motion::{AxisId, AxisOutcome, MotionError, MoveReport, Point, PositionTracker};
use crate::traits::{
    DiagnosticsSink, MonotonicClock, Progress, ServoDriver, StepperAxis, StopKind,
};

/// Something that can move the effector to an absolute position
pub trait Positioner {
    /// Move to `target` and wait for arrival
    fn goto(&mut self, target: Point) -> Result<MoveReport, MotionError>;

    /// Current position
    fn position(&self) -> Point;
}

impl<X: StepperAxis, Y: StepperAxis, C: MonotonicClock> Positioner for PositionTracker<X, Y, C> {
    fn goto(&mut self, target: Point) -> Result<MoveReport, MotionError> {
        self.goto_xy(target)
    }

    fn position(&self) -> Point {
        PositionTracker::position(self)
    }
}

/// Something that can pick and place parts
pub trait PickPlace {
    fn pick_up(&mut self) -> Result<(), EffectorError>;
    fn put_down(&mut self) -> Result<(), EffectorError>;
}

impl<R: ServoDriver, S: ServoDriver, D: DelayNs> PickPlace for EndEffectorController<R, S, D> {
    fn pick_up(&mut self) -> Result<(), EffectorError> {
        EndEffectorController::pick_up(self)
    }

    fn put_down(&mut self) -> Result<(), EffectorError> {
        EndEffectorController::put_down(self)
    }
}

/// Timings of the runner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RunnerTiming {
    /// Pause after every move and effector operation (ms)
    pub settle_ms: u32,
    /// Pause after a full pass (ms)
    pub cycle_pause_ms: u32,
}

/// Outcome of one pass over the waypoint table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CycleReport {
    /// One-based pass number
    pub cycle: u32,
    /// Pairs where every call succeeded
    pub pairs_completed: u16,
    /// Calls that failed
    pub faults: u16,
}

/// Drives the positioner and effector through the waypoint table
pub struct SequenceRunner<'a, P, E, D, K> {
    positioner: P,
    effector: E,
    delay: D,
    sink: K,
    waypoints: &'a [WaypointPair],
    timing: RunnerTiming,
    cycle: u32,
}

impl<'a, P, E, D, K> SequenceRunner<'a, P, E, D, K>
where
    P: Positioner,
    E: PickPlace,
    D: DelayNs,
    K: DiagnosticsSink,
{
    /// Create a runner over a waypoint table
    pub fn new(
        positioner: P,
        effector: E,
        delay: D,
        sink: K,
        waypoints: &'a [WaypointPair],
        timing: RunnerTiming,
    ) -> Self {
        Self {
            positioner,
            effector,
            delay,
            sink,
            waypoints,
            timing,
            cycle: 0,
        }
    }

    /// Number of passes started so far
    pub fn cycles(&self) -> u32 {
        self.cycle
    }

    /// Borrow the positioner
    pub fn positioner(&self) -> &P {
        &self.positioner
    }

    /// Borrow the effector
    pub fn effector(&self) -> &E {
        &self.effector
    }

    /// Run the table forever
    pub fn run_forever(&mut self) -> ! {
        loop {
            self.run_cycle();
        }
    }

    /// Run one pass over the table, including the closing pause
    pub fn run_cycle(&mut self) -> CycleReport {
        self.cycle = self.cycle.wrapping_add(1);
        let mut report = CycleReport {
            cycle: self.cycle,
            ..CycleReport::default()
        };
        self.sink.record(&Progress::CycleStarted { cycle: self.cycle });

        let waypoints = self.waypoints;
        for (i, pair) in waypoints.iter().enumerate() {
            let index = i as u16;
            let results = [
                self.visit(StopKind::Load, index, &pair.label, pair.load),
                self.actuate(StopKind::Load, index),
                self.visit(StopKind::Hole, index, &pair.label, pair.hole),
                self.actuate(StopKind::Hole, index),
            ];
            let failed = results.iter().filter(|ok| !**ok).count() as u16;
            if failed == 0 {
                report.pairs_completed += 1;
            }
            report.faults += failed;
        }

        self.sink.record(&Progress::CycleComplete {
            cycle: self.cycle,
            pairs: report.pairs_completed,
        });
        self.delay.delay_ms(self.timing.cycle_pause_ms);
        report
    }

    fn visit(&mut self, kind: StopKind, index: u16, label: &Label, target: Point) -> bool {
        self.sink.record(&Progress::Heading {
            kind,
            index,
            label: label.clone(),
            from: self.positioner.position(),
            to: target,
        });

        let ok = match self.positioner.goto(target) {
            Ok(report) => {
                for axis in [AxisId::X, AxisId::Y] {
                    if report.outcome(axis) == AxisOutcome::OutOfRange {
                        self.sink.record(&Progress::AxisSkipped {
                            axis,
                            target_mm: target.get(axis),
                        });
                    }
                }
                self.sink.record(&Progress::Arrived {
                    kind,
                    index,
                    label: label.clone(),
                    position: report.position,
                });
                true
            }
            Err(error) => {
                self.sink
                    .record(&Progress::MoveFailed { kind, index, error });
                false
            }
        };

        self.delay.delay_ms(self.timing.settle_ms);
        ok
    }

    fn actuate(&mut self, kind: StopKind, index: u16) -> bool {
        let result = match kind {
            StopKind::Load => self.effector.pick_up(),
            StopKind::Hole => self.effector.put_down(),
        };

        let ok = match result {
            Ok(()) => {
                let event = match kind {
                    StopKind::Load => Progress::Picked { index },
                    StopKind::Hole => Progress::Placed { index },
                };
                self.sink.record(&event);
                true
            }
            Err(error) => {
                self.sink
                    .record(&Progress::EffectorFailed { kind, index, error });
                false
            }
        };

        self.delay.delay_ms(self.timing.settle_ms);
        ok
    }
}
