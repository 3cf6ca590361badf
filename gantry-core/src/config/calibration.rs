//! Steps-per-millimetre calibration
//!
//! Nominal values from belt pitch and pulley teeth are rarely exact. The
//! calibration is measured instead: command a known number of steps, measure
//! how far the carriage actually travelled.

/// Steps per millimetre from a commanded step count and the measured travel
///
/// Returns `None` if the measurement cannot produce a positive, finite
/// result. The sign of both inputs is ignored.
pub fn steps_per_mm_from_travel(commanded_steps: i64, measured_mm: f32) -> Option<f32> {
    if commanded_steps == 0 {
        return None;
    }
    let measured = if measured_mm < 0.0 {
        -measured_mm
    } else {
        measured_mm
    };
    let steps = commanded_steps.unsigned_abs() as f32;
    let value = steps / measured;
    (measured > 0.0 && value.is_finite()).then_some(value)
}

/// Correct an existing calibration after a test move
///
/// `requested_mm` is the distance the machine was asked to travel with the
/// current `steps_per_mm`; `measured_mm` is what it actually travelled.
pub fn corrected_steps_per_mm(steps_per_mm: f32, requested_mm: f32, measured_mm: f32) -> Option<f32> {
    let commanded = (steps_per_mm * requested_mm) as i64;
    steps_per_mm_from_travel(commanded, measured_mm)
}
