//! Step/direction stepper drivers

pub mod axis;
pub mod pulse;

pub use axis::AxisController;
pub use pulse::{MotorBinding, StepPulseGenerator};
