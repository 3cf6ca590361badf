//! Motion planning and execution
//!
//! Step-delay profiles, coordinated multi-axis scheduling and absolute
//! position tracking for the gantry.

pub mod position;
pub mod profile;
pub mod scheduler;

pub use position::{
    AxisCalibration, AxisId, AxisOutcome, MoveReport, Point, PositionTracker, TrackerConfig,
};
pub use profile::{DelayIter, MoveProfile, ProfilePhase, VelocityProfile};
pub use scheduler::{
    AxisMove, AxisReport, CoordinatedReport, MotionError, MotionScheduler, MAX_AXES,
};
