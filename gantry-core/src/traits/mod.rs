//! Device traits
//!
//! These traits define the interface between the application logic
//! and hardware-specific implementations.

pub mod diagnostics;
pub mod servo;
pub mod stepper;
pub mod time;

pub use diagnostics::{DiagnosticsSink, Progress, StopKind};
pub use servo::{ServoDriver, ServoError, MAX_SERVO_ANGLE};
pub use stepper::{Direction, StepperAxis, StepperError};
pub use time::MonotonicClock;
