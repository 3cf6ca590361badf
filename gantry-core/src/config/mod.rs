//! Configuration types
//!
//! Board-agnostic configuration structures stored as postcard binary data.

pub mod calibration;
pub mod hardware;
pub mod types;

pub use calibration::{corrected_steps_per_mm, steps_per_mm_from_travel};
pub use hardware::*;
pub use types::*;
