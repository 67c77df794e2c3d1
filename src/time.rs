use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// An injected source of monotonic time.
///
/// The core never reads the wall clock directly: timeout accounting in
/// [try_take()](crate::ChuteExit::try_take) and deadline computation in
/// [PeriodicBatchingWorker](crate::workers::PeriodicBatchingWorker) go
/// through a `TimeSource`, so both are deterministically testable by
/// substituting [ManualTimeSource].
pub trait TimeSource: Send + Sync {
    /// The current instant, with at least millisecond resolution.
    fn now(&self) -> Instant;
}

/// The default [TimeSource], backed by [Instant::now].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A [TimeSource] that only moves when told to. Intended for tests.
pub struct ManualTimeSource {
    now: Mutex<Instant>,
}

impl ManualTimeSource {
    pub fn new() -> Self {
        Self { now: Mutex::new(Instant::now()) }
    }

    /// Advance the reported time by `d`.
    pub fn advance(&self, d: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += d;
    }
}

impl Default for ManualTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
