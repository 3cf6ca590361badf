//! Time source for the cooperative motion scheduler
//!
//! Blocking waits use [`embedded_hal::delay::DelayNs`] directly.

/// Monotonic microsecond clock
pub trait MonotonicClock {
    /// Microseconds since an arbitrary fixed origin; never decreases
    fn now_us(&self) -> u64;
}

impl<T: MonotonicClock + ?Sized> MonotonicClock for &T {
    fn now_us(&self) -> u64 {
        (**self).now_us()
    }
}
