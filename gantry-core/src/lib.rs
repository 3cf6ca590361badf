//! Board-agnostic core logic for the gantry controller
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Device traits (stepper axis, servo, clock, diagnostics sink)
//! - Velocity profile and multi-axis motion scheduling
//! - Absolute position tracking in millimetres
//! - End effector pick/place state machine
//! - Waypoint sequence runner
//! - Configuration type definitions

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
#[macro_use]
extern crate std;

pub mod config;
pub mod effector;
pub mod motion;
pub mod sequence;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;
