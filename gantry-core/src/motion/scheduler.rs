//! Coordinated multi-axis scheduling
//!
//! Every axis in a coordinated move is started together and then polled in
//! one loop: on each pass every unfinished axis gets a chance to step. No
//! axis blocks another, so a short move on one axis finishes early while a
//! long move on another keeps going. The call returns once all axes are
//! idle.
//!
//! A failure on any axis ends the whole batch: every axis that is still
//! moving is stopped where it is before the error is returned.

use heapless::Vec;

use super::position::AxisId;
use super::profile::MoveProfile;
use crate::traits::{MonotonicClock, StepperAxis, StepperError};

/// Maximum number of axes in one coordinated move
pub const MAX_AXES: usize = 4;

/// Motion errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionError {
    /// An axis failed to start or to step
    Stepper { axis: AxisId, error: StepperError },
    /// More than [`MAX_AXES`] moves in one batch
    TooManyAxes,
}

/// One axis' part of a coordinated move
pub struct AxisMove<'a> {
    axis: AxisId,
    stepper: &'a mut dyn StepperAxis,
    steps: i32,
    profile: MoveProfile,
}

impl<'a> AxisMove<'a> {
    /// Describe a move of `steps` signed steps on `stepper`
    pub fn new(
        axis: AxisId,
        stepper: &'a mut dyn StepperAxis,
        steps: i32,
        profile: MoveProfile,
    ) -> Self {
        Self {
            axis,
            stepper,
            steps,
            profile,
        }
    }

    /// Axis identifier
    pub fn axis(&self) -> AxisId {
        self.axis
    }

    /// Signed step count
    pub fn steps(&self) -> i32 {
        self.steps
    }
}

/// Completion record for one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisReport {
    pub axis: AxisId,
    pub steps: i32,
    /// Clock reading at which the axis was seen idle
    pub finished_at_us: u64,
}

/// Completion record for a coordinated move
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatedReport {
    pub started_at_us: u64,
    pub axes: Vec<AxisReport, MAX_AXES>,
}

impl CoordinatedReport {
    /// Completion record of one axis, if it took part
    pub fn axis(&self, axis: AxisId) -> Option<&AxisReport> {
        self.axes.iter().find(|r| r.axis == axis)
    }

    /// Time at which the last axis finished
    pub fn finished_at_us(&self) -> u64 {
        self.axes
            .iter()
            .map(|r| r.finished_at_us)
            .max()
            .unwrap_or(self.started_at_us)
    }
}

/// Drives a batch of axis moves to completion together
pub struct MotionScheduler<'a> {
    moves: Vec<AxisMove<'a>, MAX_AXES>,
    finished: Vec<Option<u64>, MAX_AXES>,
    started_at_us: Option<u64>,
}

impl<'a> Default for MotionScheduler<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> MotionScheduler<'a> {
    /// Create an empty scheduler
    pub fn new() -> Self {
        Self {
            moves: Vec::new(),
            finished: Vec::new(),
            started_at_us: None,
        }
    }

    /// Add an axis move to the batch
    pub fn add(&mut self, mv: AxisMove<'a>) -> Result<(), MotionError> {
        self.moves.push(mv).map_err(|_| MotionError::TooManyAxes)?;
        self.finished
            .push(None)
            .map_err(|_| MotionError::TooManyAxes)
    }

    /// Check if the batch has no moves
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Check if the batch has been started
    pub fn is_started(&self) -> bool {
        self.started_at_us.is_some()
    }

    /// Start every axis in the batch
    ///
    /// If any axis is already moving, nothing is started and the busy axis
    /// is reported. If an axis fails to start, the axes started before it
    /// are stopped again.
    pub fn start(&mut self, now_us: u64) -> Result<(), MotionError> {
        if let Some(busy) = self.moves.iter().find(|m| m.stepper.is_moving()) {
            return Err(MotionError::Stepper {
                axis: busy.axis,
                error: StepperError::Busy,
            });
        }

        self.started_at_us = Some(now_us);
        let mut failure = None;
        for (mv, done) in self.moves.iter_mut().zip(self.finished.iter_mut()) {
            if let Err(error) = mv.stepper.begin_move(mv.steps, mv.profile, now_us) {
                failure = Some(MotionError::Stepper {
                    axis: mv.axis,
                    error,
                });
                break;
            }
            if !mv.stepper.is_moving() {
                *done = Some(now_us);
            }
        }

        match failure {
            Some(error) => {
                self.abort(now_us);
                Err(error)
            }
            None => Ok(()),
        }
    }

    /// Give every unfinished axis a chance to step
    ///
    /// Returns `Ok(true)` while any axis is still moving. The first axis
    /// error stops every other axis and is returned.
    pub fn poll(&mut self, now_us: u64) -> Result<bool, MotionError> {
        let mut pending = false;
        let mut failure = None;
        for (mv, done) in self.moves.iter_mut().zip(self.finished.iter_mut()) {
            if done.is_some() {
                continue;
            }
            match mv.stepper.step_if_due(now_us) {
                Ok(true) => pending = true,
                Ok(false) => *done = Some(now_us),
                Err(error) => {
                    *done = Some(now_us);
                    failure = Some(MotionError::Stepper {
                        axis: mv.axis,
                        error,
                    });
                    break;
                }
            }
        }

        match failure {
            Some(error) => {
                self.abort(now_us);
                Err(error)
            }
            None => Ok(pending),
        }
    }

    /// Stop every unfinished axis where it is
    ///
    /// Steps already taken are kept by each axis. The stopped axes are
    /// marked finished at `now_us`.
    pub fn abort(&mut self, now_us: u64) {
        for (mv, done) in self.moves.iter_mut().zip(self.finished.iter_mut()) {
            if done.is_none() {
                mv.stepper.abort();
                *done = Some(now_us);
            }
        }
    }

    /// Check if every axis has finished
    pub fn is_complete(&self) -> bool {
        self.is_started() && self.finished.iter().all(Option::is_some)
    }

    /// Completion record so far
    pub fn report(&self) -> CoordinatedReport {
        let started_at_us = self.started_at_us.unwrap_or(0);
        let mut axes = Vec::new();
        for (mv, done) in self.moves.iter().zip(self.finished.iter()) {
            if let Some(finished_at_us) = done {
                // Same capacity as `moves`
                let _ = axes.push(AxisReport {
                    axis: mv.axis,
                    steps: mv.steps,
                    finished_at_us: *finished_at_us,
                });
            }
        }
        CoordinatedReport {
            started_at_us,
            axes,
        }
    }

    /// Start the batch and poll it to completion
    pub fn run<C: MonotonicClock>(mut self, clock: &C) -> Result<CoordinatedReport, MotionError> {
        self.start(clock.now_us())?;
        while self.poll(clock.now_us())? {}
        Ok(self.report())
    }

    /// Run a set of axis moves together and wait for all of them
    pub fn coordinated_move<C, I>(moves: I, clock: &C) -> Result<CoordinatedReport, MotionError>
    where
        C: MonotonicClock,
        I: IntoIterator<Item = AxisMove<'a>>,
    {
        let mut scheduler = Self::new();
        for mv in moves {
            scheduler.add(mv)?;
        }
        scheduler.run(clock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeClock, SimAxis};

    const PROFILE: MoveProfile = MoveProfile::new(200, 50, 5);

    #[test]
    fn test_shorter_axis_finishes_first() {
        let mut x = SimAxis::new();
        let mut y = SimAxis::new();
        let clock = FakeClock::new(7);

        let report = MotionScheduler::coordinated_move(
            [
                AxisMove::new(AxisId::X, &mut x, 300, PROFILE),
                AxisMove::new(AxisId::Y, &mut y, -40, PROFILE),
            ],
            &clock,
        )
        .unwrap();

        let x_done = report.axis(AxisId::X).unwrap().finished_at_us;
        let y_done = report.axis(AxisId::Y).unwrap().finished_at_us;
        assert!(y_done <= x_done);
        assert_eq!(report.finished_at_us(), x_done);

        assert!(!x.is_moving());
        assert!(!y.is_moving());
        assert_eq!(x.position_steps(), 300);
        assert_eq!(y.position_steps(), -40);
    }

    #[test]
    fn test_axes_step_interleaved() {
        let mut x = SimAxis::new();
        let mut y = SimAxis::new();
        let clock = FakeClock::new(7);

        MotionScheduler::coordinated_move(
            [
                AxisMove::new(AxisId::X, &mut x, 100, PROFILE),
                AxisMove::new(AxisId::Y, &mut y, 100, PROFILE),
            ],
            &clock,
        )
        .unwrap();

        // Both axes were stepping over the same time window
        let x_first = x.step_times()[0];
        let y_last = *y.step_times().last().unwrap();
        let y_first = y.step_times()[0];
        let x_last = *x.step_times().last().unwrap();
        assert!(x_first < y_last);
        assert!(y_first < x_last);
    }

    #[test]
    fn test_zero_step_axis_finishes_at_start() {
        let mut x = SimAxis::new();
        let mut y = SimAxis::new();
        let clock = FakeClock::new(7);

        let report = MotionScheduler::coordinated_move(
            [
                AxisMove::new(AxisId::X, &mut x, 0, PROFILE),
                AxisMove::new(AxisId::Y, &mut y, 12, PROFILE),
            ],
            &clock,
        )
        .unwrap();

        let x_report = report.axis(AxisId::X).unwrap();
        assert_eq!(x_report.finished_at_us, report.started_at_us);
        assert_eq!(x.position_steps(), 0);
        assert_eq!(y.position_steps(), 12);
    }

    #[test]
    fn test_busy_axis_blocks_whole_batch() {
        let mut x = SimAxis::new();
        let mut y = SimAxis::new();
        y.begin_move(10, PROFILE, 0).unwrap();

        let mut scheduler = MotionScheduler::new();
        scheduler
            .add(AxisMove::new(AxisId::X, &mut x, 10, PROFILE))
            .unwrap();
        scheduler
            .add(AxisMove::new(AxisId::Y, &mut y, 10, PROFILE))
            .unwrap();

        assert_eq!(
            scheduler.start(0),
            Err(MotionError::Stepper {
                axis: AxisId::Y,
                error: StepperError::Busy,
            })
        );
        assert!(!scheduler.is_started());
        drop(scheduler);
        assert_eq!(x.moves_started(), 0);
    }

    #[test]
    fn test_poll_reports_progress() {
        let mut x = SimAxis::new();
        let mut scheduler = MotionScheduler::new();
        scheduler
            .add(AxisMove::new(AxisId::X, &mut x, 2, PROFILE))
            .unwrap();
        scheduler.start(0).unwrap();
        assert!(!scheduler.is_complete());

        let mut now = 0;
        while scheduler.poll(now).unwrap() {
            now += 10;
        }
        assert!(scheduler.is_complete());
        assert_eq!(scheduler.report().axes.len(), 1);
    }

    #[test]
    fn test_batch_capacity() {
        let mut axes = [
            SimAxis::new(),
            SimAxis::new(),
            SimAxis::new(),
            SimAxis::new(),
            SimAxis::new(),
        ];
        let mut scheduler = MotionScheduler::new();
        let mut result = Ok(());
        for axis in axes.iter_mut() {
            result = scheduler.add(AxisMove::new(AxisId::X, axis, 1, PROFILE));
        }
        assert_eq!(result, Err(MotionError::TooManyAxes));
    }

    #[test]
    fn test_empty_batch_completes_immediately() {
        let clock = FakeClock::new(1);
        let report = MotionScheduler::new().run(&clock).unwrap();
        assert!(report.axes.is_empty());
        assert_eq!(report.finished_at_us(), report.started_at_us);
    }

    #[test]
    fn test_step_failure_stops_every_axis() {
        let mut x = SimAxis::new().failing_at_edge(6);
        let mut y = SimAxis::new();
        let clock = FakeClock::new(7);

        let result = MotionScheduler::coordinated_move(
            [
                AxisMove::new(AxisId::X, &mut x, 10, PROFILE),
                AxisMove::new(AxisId::Y, &mut y, 10, PROFILE),
            ],
            &clock,
        );
        assert_eq!(
            result,
            Err(MotionError::Stepper {
                axis: AxisId::X,
                error: StepperError::Pin,
            })
        );
        assert!(!x.is_moving());
        assert!(!y.is_moving());
        assert_eq!(x.position_steps(), 2);
        assert!(y.position_steps() < 10);

        // Neither axis is left busy
        let report = MotionScheduler::coordinated_move(
            [
                AxisMove::new(AxisId::X, &mut x, 3, PROFILE),
                AxisMove::new(AxisId::Y, &mut y, 3, PROFILE),
            ],
            &clock,
        )
        .unwrap();
        assert_eq!(report.axes.len(), 2);
        assert_eq!(x.position_steps(), 5);
    }

    #[test]
    fn test_start_failure_stops_started_axes() {
        let mut x = SimAxis::new();
        let mut y = SimAxis::new().failing_to_start();

        let mut scheduler = MotionScheduler::new();
        scheduler
            .add(AxisMove::new(AxisId::X, &mut x, 10, PROFILE))
            .unwrap();
        scheduler
            .add(AxisMove::new(AxisId::Y, &mut y, 10, PROFILE))
            .unwrap();

        assert_eq!(
            scheduler.start(0),
            Err(MotionError::Stepper {
                axis: AxisId::Y,
                error: StepperError::Pin,
            })
        );
        assert!(scheduler.is_complete());
        assert_eq!(scheduler.poll(1_000), Ok(false));
        drop(scheduler);

        assert_eq!(x.moves_started(), 1);
        assert!(!x.is_moving());
        assert!(!y.is_moving());
        assert_eq!(x.position_steps(), 0);
    }
}
