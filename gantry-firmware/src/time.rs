//! Monotonic clock backed by the embassy time driver

use embassy_time::Instant;

use gantry_core::traits::MonotonicClock;

/// Microseconds since boot
#[derive(Clone, Copy, Default)]
pub struct EmbassyClock;

impl MonotonicClock for EmbassyClock {
    fn now_us(&self) -> u64 {
        Instant::now().as_micros()
    }
}
