//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in gantry-core on top of `embedded-hal` 1.0:
//!
//! - Step pulse generation for ganged step/direction motors
//! - Logical axis controller (blocking and incremental moves)
//! - Hobby servos on PWM channels

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod servo;
pub mod stepper;
