//! Pick-and-place sequencing
//!
//! The waypoint table and the runner that cycles through it.

pub mod runner;
pub mod table;

pub use runner::{CycleReport, PickPlace, Positioner, RunnerTiming, SequenceRunner};
pub use table::{Label, SequenceConfig, WaypointPair, MAX_LABEL_LEN, MAX_WAYPOINTS};
