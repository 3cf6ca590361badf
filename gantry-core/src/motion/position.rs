//! Absolute position tracking
//!
//! The tracker owns the X and Y axes and the effector's position in
//! millimetres. Targets are converted into signed step deltas per axis and
//! executed as one coordinated move.

use core::fmt;

use micromath::F32Ext;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::profile::MoveProfile;
use super::scheduler::{AxisMove, MotionError, MotionScheduler};
use crate::traits::{MonotonicClock, StepperAxis};

/// Axis identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AxisId {
    /// Horizontal travel along the gantry beam
    X,
    /// Travel of the gantry beam (usually two ganged motors)
    Y,
}

/// A point in machine coordinates, millimetres
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    /// Create a point
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Coordinate along one axis
    pub fn get(&self, axis: AxisId) -> f32 {
        match axis {
            AxisId::X => self.x,
            AxisId::Y => self.y,
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// Calibration and travel limits of one axis
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AxisCalibration {
    /// Steps per millimetre of travel (measured, not nominal)
    pub steps_per_mm: f32,
    /// Minimum allowed position in mm
    pub min_mm: f32,
    /// Maximum allowed position in mm
    pub max_mm: f32,
}

impl Default for AxisCalibration {
    fn default() -> Self {
        Self {
            steps_per_mm: 5.2631,
            min_mm: 0.0,
            max_mm: 300.0,
        }
    }
}

impl AxisCalibration {
    /// Check if a position is within bounds
    pub fn is_in_bounds(&self, position_mm: f32) -> bool {
        position_mm >= self.min_mm && position_mm <= self.max_mm
    }

    /// Absolute step index of a position, rounded to the nearest step
    pub fn mm_to_steps(&self, mm: f32) -> i64 {
        F32Ext::round(mm * self.steps_per_mm) as i64
    }

    /// Position of an absolute step index
    pub fn steps_to_mm(&self, steps: i64) -> f32 {
        steps as f32 / self.steps_per_mm
    }

    /// Signed step delta to travel from one position to another
    ///
    /// Both ends are rounded to absolute steps first, so a chain of moves
    /// never accumulates rounding error.
    pub fn step_delta(&self, from_mm: f32, to_mm: f32) -> i32 {
        (self.mm_to_steps(to_mm) - self.mm_to_steps(from_mm)) as i32
    }
}

/// What a move did on one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AxisOutcome {
    /// The axis moved by this many signed steps
    Moved { steps: i32 },
    /// Target rounds to the current step; nothing issued
    Unchanged,
    /// Target outside travel bounds; axis skipped
    OutOfRange,
}

impl AxisOutcome {
    /// Signed steps issued on this axis
    pub fn steps(&self) -> i32 {
        match self {
            AxisOutcome::Moved { steps } => *steps,
            _ => 0,
        }
    }
}

/// Result of a `goto_xy` call
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MoveReport {
    pub x: AxisOutcome,
    pub y: AxisOutcome,
    /// Tracked position after the move
    pub position: Point,
}

impl MoveReport {
    /// Outcome for one axis
    pub fn outcome(&self, axis: AxisId) -> AxisOutcome {
        match axis {
            AxisId::X => self.x,
            AxisId::Y => self.y,
        }
    }

    /// Check if no steps were issued at all
    pub fn is_noop(&self) -> bool {
        self.x.steps() == 0 && self.y.steps() == 0
    }
}

/// Static configuration of the tracker
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TrackerConfig {
    pub x: AxisCalibration,
    pub y: AxisCalibration,
    /// Profile used for every gantry move
    pub profile: MoveProfile,
    /// Position assumed at power-on
    pub home: Point,
}

/// Position tracker for the X/Y gantry
///
/// Owns both axes and the only copy of the effector position. The position
/// changes only through `goto_xy`: to the target when the move completes,
/// or by the steps actually taken when it fails part way.
pub struct PositionTracker<X, Y, C> {
    x: X,
    y: Y,
    clock: C,
    config: TrackerConfig,
    position: Point,
}

impl<X: StepperAxis, Y: StepperAxis, C: MonotonicClock> PositionTracker<X, Y, C> {
    /// Create a tracker; the effector is assumed to be at `config.home`
    pub fn new(x: X, y: Y, clock: C, config: TrackerConfig) -> Self {
        Self {
            x,
            y,
            clock,
            position: config.home,
            config,
        }
    }

    /// Current tracked position
    pub fn position(&self) -> Point {
        self.position
    }

    /// Get configuration reference
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Calibration of one axis
    pub fn calibration(&self, axis: AxisId) -> &AxisCalibration {
        match axis {
            AxisId::X => &self.config.x,
            AxisId::Y => &self.config.y,
        }
    }

    /// Work out what `goto_xy(target)` would do on one axis
    pub fn plan_axis(&self, axis: AxisId, target_mm: f32) -> AxisOutcome {
        let cal = self.calibration(axis);
        if !cal.is_in_bounds(target_mm) {
            return AxisOutcome::OutOfRange;
        }
        match cal.step_delta(self.position.get(axis), target_mm) {
            0 => AxisOutcome::Unchanged,
            steps => AxisOutcome::Moved { steps },
        }
    }

    /// Move the effector to an absolute position
    ///
    /// An axis whose target lies outside its bounds is left where it is and
    /// reported as [`AxisOutcome::OutOfRange`]; the other axis still moves.
    /// Blocks until every moving axis has finished. On an axis error every
    /// axis is stopped and the position follows the steps already taken.
    pub fn goto_xy(&mut self, target: Point) -> Result<MoveReport, MotionError> {
        let x_out = self.plan_axis(AxisId::X, target.x);
        let y_out = self.plan_axis(AxisId::Y, target.y);
        let profile = self.config.profile;
        let x_before = self.x.position_steps();
        let y_before = self.y.position_steps();

        let mut scheduler = MotionScheduler::new();
        if let AxisOutcome::Moved { steps } = x_out {
            scheduler.add(AxisMove::new(AxisId::X, &mut self.x, steps, profile))?;
        }
        if let AxisOutcome::Moved { steps } = y_out {
            scheduler.add(AxisMove::new(AxisId::Y, &mut self.y, steps, profile))?;
        }
        if !scheduler.is_empty() {
            if let Err(e) = scheduler.run(&self.clock) {
                self.position.x += self
                    .config
                    .x
                    .steps_to_mm(self.x.position_steps() - x_before);
                self.position.y += self
                    .config
                    .y
                    .steps_to_mm(self.y.position_steps() - y_before);
                return Err(e);
            }
        }

        if x_out != AxisOutcome::OutOfRange {
            self.position.x = target.x;
        }
        if y_out != AxisOutcome::OutOfRange {
            self.position.y = target.y;
        }

        Ok(MoveReport {
            x: x_out,
            y: y_out,
            position: self.position,
        })
    }

    /// Borrow the X axis
    pub fn x_axis(&self) -> &X {
        &self.x
    }

    /// Borrow the Y axis
    pub fn y_axis(&self) -> &Y {
        &self.y
    }

    /// Take the tracker apart
    pub fn into_parts(self) -> (X, Y, C) {
        (self.x, self.y, self.clock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeClock, SimAxis};
    use crate::traits::StepperError;

    const FAST: MoveProfile = MoveProfile::new(40, 10, 5);

    fn tracker(x_max: f32, y_max: f32) -> PositionTracker<SimAxis, SimAxis, FakeClock> {
        tracker_over(SimAxis::new(), SimAxis::new(), x_max, y_max)
    }

    fn tracker_over(
        x: SimAxis,
        y: SimAxis,
        x_max: f32,
        y_max: f32,
    ) -> PositionTracker<SimAxis, SimAxis, FakeClock> {
        let config = TrackerConfig {
            x: AxisCalibration {
                steps_per_mm: 5.2631,
                min_mm: 0.0,
                max_mm: x_max,
            },
            y: AxisCalibration {
                steps_per_mm: 4.0,
                min_mm: 0.0,
                max_mm: y_max,
            },
            profile: FAST,
            home: Point::new(0.0, 0.0),
        };
        PositionTracker::new(x, y, FakeClock::new(3), config)
    }

    #[test]
    fn test_calibrated_step_count() {
        let mut t = tracker(300.0, 300.0);
        t.goto_xy(Point::new(90.0, 0.0)).unwrap();
        let before = t.x_axis().position_steps();

        let report = t.goto_xy(Point::new(182.0, 0.0)).unwrap();
        let steps = report.x.steps();
        assert!((483..=485).contains(&steps), "got {}", steps);
        assert!(steps > 0);
        assert_eq!(t.x_axis().position_steps() - before, steps as i64);
        assert_eq!(report.y, AxisOutcome::Unchanged);
    }

    #[test]
    fn test_goto_twice_is_noop() {
        let mut t = tracker(300.0, 300.0);
        let p = Point::new(120.5, 33.25);

        let first = t.goto_xy(p).unwrap();
        assert!(!first.is_noop());
        let x_steps = t.x_axis().position_steps();
        let y_steps = t.y_axis().position_steps();

        let second = t.goto_xy(p).unwrap();
        assert!(second.is_noop());
        assert_eq!(second.x, AxisOutcome::Unchanged);
        assert_eq!(second.y, AxisOutcome::Unchanged);
        assert_eq!(t.x_axis().moves_started(), 1);
        assert_eq!(t.x_axis().position_steps(), x_steps);
        assert_eq!(t.y_axis().position_steps(), y_steps);
    }

    #[test]
    fn test_out_of_range_axis_is_skipped() {
        let mut t = tracker(200.0, 150.0);
        t.goto_xy(Point::new(50.0, 20.0)).unwrap();

        let report = t.goto_xy(Point::new(250.0, 40.0)).unwrap();
        assert_eq!(report.x, AxisOutcome::OutOfRange);
        assert_eq!(report.y, AxisOutcome::Moved { steps: 80 });
        assert_eq!(t.position(), Point::new(50.0, 40.0));

        let report = t.goto_xy(Point::new(-1.0, 40.0)).unwrap();
        assert_eq!(report.x, AxisOutcome::OutOfRange);
        assert!(report.is_noop());
        assert_eq!(t.position(), Point::new(50.0, 40.0));
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let mut t = tracker(200.0, 150.0);
        let report = t.goto_xy(Point::new(200.0, 0.0)).unwrap();
        assert!(matches!(report.x, AxisOutcome::Moved { .. }));
        assert_eq!(t.position().x, 200.0);
    }

    #[test]
    fn test_negative_moves() {
        let mut t = tracker(300.0, 300.0);
        t.goto_xy(Point::new(100.0, 100.0)).unwrap();
        let report = t.goto_xy(Point::new(10.0, 100.0)).unwrap();
        assert!(report.x.steps() < 0);

        // Back home lands exactly on step zero
        t.goto_xy(Point::new(0.0, 0.0)).unwrap();
        assert_eq!(t.x_axis().position_steps(), 0);
        assert_eq!(t.y_axis().position_steps(), 0);
    }

    #[test]
    fn test_no_drift_over_many_moves() {
        let mut t = tracker(300.0, 300.0);
        for i in 0..20 {
            let x = 13.7 * i as f32;
            t.goto_xy(Point::new(x, 0.0)).unwrap();
            let expected = t.calibration(AxisId::X).mm_to_steps(x);
            assert_eq!(t.x_axis().position_steps(), expected);
        }
    }

    #[test]
    fn test_busy_axis_rejected() {
        let mut t = tracker(300.0, 300.0);
        let (mut x, y, clock) = t.into_parts();
        x.begin_move(10, FAST, 0).unwrap();
        let config = TrackerConfig {
            x: AxisCalibration::default(),
            y: AxisCalibration::default(),
            profile: FAST,
            home: Point::default(),
        };
        t = PositionTracker::new(x, y, clock, config);

        let err = t.goto_xy(Point::new(10.0, 10.0)).unwrap_err();
        assert!(matches!(
            err,
            MotionError::Stepper {
                axis: AxisId::X,
                ..
            }
        ));
        // Nothing moved, position unchanged
        assert_eq!(t.position(), Point::default());
        assert_eq!(t.y_axis().moves_started(), 0);
    }

    #[test]
    fn test_failed_move_tracks_steps_taken() {
        let mut t = tracker_over(SimAxis::new().failing_at_edge(6), SimAxis::new(), 300.0, 300.0);
        let target = Point::new(10.0, 10.0);

        assert_eq!(
            t.goto_xy(target),
            Err(MotionError::Stepper {
                axis: AxisId::X,
                error: StepperError::Pin,
            })
        );
        assert!(!t.x_axis().is_moving());
        assert!(!t.y_axis().is_moving());
        assert_eq!(t.x_axis().position_steps(), 2);
        assert_eq!(t.position().x, t.calibration(AxisId::X).steps_to_mm(2));
        let y_steps = t.y_axis().position_steps();
        assert!(y_steps < 40);
        assert_eq!(t.position().y, t.calibration(AxisId::Y).steps_to_mm(y_steps));

        // Retrying reaches the target with the planned totals
        let report = t.goto_xy(target).unwrap();
        assert_eq!(report.position, target);
        assert_eq!(t.x_axis().position_steps(), 53);
        assert_eq!(t.y_axis().position_steps(), 40);
    }

    #[test]
    fn test_step_rounding_is_half_away_from_zero() {
        let cal = AxisCalibration {
            steps_per_mm: 1.0,
            min_mm: -10.0,
            max_mm: 10.0,
        };
        assert_eq!(cal.mm_to_steps(2.5), 3);
        assert_eq!(cal.mm_to_steps(-2.5), -3);
        assert_eq!(cal.mm_to_steps(2.49), 2);
        assert_eq!(cal.mm_to_steps(-0.4), 0);

        let cal = AxisCalibration::default();
        assert_eq!(cal.mm_to_steps(90.0), 474);
        assert_eq!(cal.mm_to_steps(182.0), 958);
        assert_eq!(cal.step_delta(90.0, 182.0), 484);
    }

    #[test]
    fn test_calibration_conversions() {
        let cal = AxisCalibration {
            steps_per_mm: 80.0,
            min_mm: -10.0,
            max_mm: 100.0,
        };
        assert_eq!(cal.mm_to_steps(10.0), 800);
        assert_eq!(cal.mm_to_steps(-10.0), -800);
        assert_eq!(cal.steps_to_mm(800), 10.0);
        assert!(cal.is_in_bounds(-10.0));
        assert!(!cal.is_in_bounds(100.5));
        assert_eq!(cal.step_delta(90.0, 182.0), 7360);
    }
}
