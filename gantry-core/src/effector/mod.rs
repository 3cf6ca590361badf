//! End effector: rack servo plus screw gripper
//!
//! Pick and place are fixed stage lists executed through a small guarded
//! state machine.

pub mod controller;
pub mod stages;
pub mod state;

pub use controller::{EffectorConfig, EffectorError, EndEffectorController, MAX_HISTORY};
pub use stages::{
    Operation, RackTarget, RampSpeed, ScrewMode, Stage, PICK_UP_STAGES, PUT_DOWN_STAGES,
};
pub use state::{EffectorEvent, EffectorState};
