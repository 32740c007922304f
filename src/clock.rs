//! Time sources for the interceptor
//!
//! Every proxy reads time through an injected [`Clock`] so that measurements
//! can be made deterministic in tests. [`SystemClock`] is the production
//! source; [`ManualClock`] only moves when told to.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// Source of the current instant
///
/// `instant()` must be monotonic enough that `end - start` is never negative
/// for well-behaved clocks. The interceptor additionally saturates at zero.
pub trait Clock: Send + Sync {
    /// Current monotonic instant, used for elapsed-time measurement
    fn instant(&self) -> Instant;

    /// Current wall-clock time, used for report headers
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock backed by `Instant::now()` and `Utc::now()`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn instant(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only advances when [`ManualClock::advance`] is called
///
/// # Example
/// ```
/// use calltime::clock::{Clock, ManualClock};
/// use std::time::Duration;
///
/// let clock = ManualClock::new();
/// let start = clock.instant();
/// clock.advance(Duration::from_millis(120));
/// assert_eq!(clock.instant() - start, Duration::from_millis(120));
/// ```
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    wall_origin: DateTime<Utc>,
    offset: Mutex<Duration>,
}

impl ManualClock {
    /// Create a clock frozen at the current instant
    pub fn new() -> Self {
        Self::starting_at(Utc::now())
    }

    /// Create a clock whose wall time starts at `wall_origin`
    pub fn starting_at(wall_origin: DateTime<Utc>) -> Self {
        Self {
            origin: Instant::now(),
            wall_origin,
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Move the clock forward by `by`
    pub fn advance(&self, by: Duration) {
        *self.offset.lock() += by;
    }

    /// Total time the clock has been advanced
    pub fn elapsed(&self) -> Duration {
        *self.offset.lock()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn instant(&self) -> Instant {
        self.origin + *self.offset.lock()
    }

    fn now(&self) -> DateTime<Utc> {
        let offset = chrono::Duration::from_std(*self.offset.lock()).unwrap_or_else(|_| chrono::Duration::zero());
        self.wall_origin + offset
    }
}
