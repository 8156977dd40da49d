//! Per-card timing on a monotonic clock.
//!
//! Wall-clock time can jump when the system clock is adjusted, so elapsed
//! times are always measured with [`Instant`]s. The clock itself is a trait so
//! the drill can be driven with a hand-controlled clock in tests.

use std::cell::Cell;
use std::rc::Rc;

use web_time::{Duration, Instant};

use crate::Seconds;

/// A source of monotonic timestamps
pub trait Clock {
    fn now(&self) -> Instant;
}

/// The system's monotonic clock
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to
///
/// Clones share the same time, so a test can keep one handle and hand another
/// to the drill.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    offset: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Rc::new(Cell::new(Duration::ZERO)),
        }
    }

    /// Moves the clock forward
    pub fn advance(&self, by: Duration) {
        self.offset.set(self.offset.get() + by);
    }

    /// Moves the clock forward by fractional seconds
    pub fn advance_secs(&self, seconds: Seconds) {
        self.advance(Duration::from_secs_f64(seconds));
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.offset.get()
    }
}

/// A running timer, created when a card becomes visible
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle {
    started_at: Instant,
}

/// Measures how long each card stays on screen
pub struct Recorder {
    clock: Box<dyn Clock>,
}

impl Recorder {
    pub fn new(clock: impl Clock + 'static) -> Self {
        Self {
            clock: Box::new(clock),
        }
    }

    /// Captures the moment a card is shown
    pub fn start(&self) -> TimerHandle {
        TimerHandle {
            started_at: self.clock.now(),
        }
    }

    /// Seconds since `handle` was started, never negative
    pub fn stop(&self, handle: TimerHandle) -> Seconds {
        self.elapsed(&handle).as_secs_f64()
    }

    /// Time since `handle` was started, without stopping anything
    pub fn elapsed(&self, handle: &TimerHandle) -> Duration {
        self.clock.now().saturating_duration_since(handle.started_at)
    }
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new(MonotonicClock)
    }
}

impl std::fmt::Debug for Recorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recorder").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_timing() {
        let clock = ManualClock::new();
        let recorder = Recorder::new(clock.clone());

        let handle = recorder.start();
        clock.advance(Duration::from_millis(1250));
        assert_eq!(recorder.stop(handle), 1.25);
    }

    #[test]
    fn test_sub_10ms_resolution() {
        let clock = ManualClock::new();
        let recorder = Recorder::new(clock.clone());

        let handle = recorder.start();
        clock.advance(Duration::from_millis(3));
        let elapsed = recorder.stop(handle);
        assert!(elapsed > 0.0 && elapsed < 0.01);
    }

    #[test]
    fn test_monotonic_clock_never_negative() {
        let recorder = Recorder::default();
        let handle = recorder.start();
        assert!(recorder.stop(handle) >= 0.0);
    }
}
