//! Monotonic millisecond clock.

use std::cell::Cell;
use std::time::{Duration, Instant};

/// Monotonic time source and delay primitive.
pub trait Clock {
    /// Milliseconds since an arbitrary fixed epoch.
    fn now_ms(&self) -> u64;

    /// Suspend the caller for `ms` milliseconds.
    fn sleep_ms(&self, ms: u64);

    /// Milliseconds elapsed since `start` (a value from [`Clock::now_ms`]).
    fn since(&self, start: u64) -> u64 {
        self.now_ms().saturating_sub(start)
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }

    fn sleep_ms(&self, ms: u64) {
        (**self).sleep_ms(ms)
    }
}

/// Wall-clock backed implementation.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        SystemClock {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    fn sleep_ms(&self, ms: u64) {
        std::thread::sleep(Duration::from_millis(ms));
    }
}

/// A clock that only moves when slept on or advanced explicitly.
///
/// Sleeping returns immediately after advancing the virtual time, which keeps
/// timeout paths deterministic and fast.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u64>,
    slept: Cell<u64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward without counting it as sleep.
    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }

    /// Total virtual time spent in [`Clock::sleep_ms`].
    pub fn total_slept(&self) -> u64 {
        self.slept.get()
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }

    fn sleep_ms(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
        self.slept.set(self.slept.get() + ms);
    }
}
