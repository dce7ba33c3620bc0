//! Timing reference trait

/// Maps host time (seconds on the scheduler's monotonic clock) to device
/// clock ticks
///
/// Backed by the host's clock synchronisation with the device. The values
/// returned by `clock_at` must be non-decreasing in `time`.
pub trait ClockReference {
    /// Estimated device tick count at host time `time`
    fn clock_at(&self, time: f64) -> u64;

    /// Nominal number of device ticks in `secs` seconds
    fn seconds_to_clock(&self, secs: f64) -> u64;
}

impl<C: ClockReference + ?Sized> ClockReference for &C {
    fn clock_at(&self, time: f64) -> u64 {
        C::clock_at(self, time)
    }

    fn seconds_to_clock(&self, secs: f64) -> u64 {
        C::seconds_to_clock(self, secs)
    }
}
