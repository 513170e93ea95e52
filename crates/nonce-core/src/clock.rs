//! Monotonic time sources for elapsed time and deadlines.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// A monotonic clock, read as time since the clock's own origin.
pub trait Clock: Send + Sync {
    fn now(&self) -> Duration;
}

/// Wall clock backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        SystemClock {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock that only moves when told to.
///
/// With a non-zero step, every reading advances the clock by that step,
/// which makes deadline expiry deterministic regardless of hashing speed.
#[derive(Debug, Default)]
pub struct ManualClock {
    nanos: AtomicU64,
    step: u64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// A clock that advances by `step` after each reading.
    pub fn with_step(step: Duration) -> Self {
        ManualClock {
            nanos: AtomicU64::new(0),
            step: step.as_nanos() as u64,
        }
    }

    pub fn advance(&self, by: Duration) {
        self.nanos.fetch_add(by.as_nanos() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.fetch_add(self.step, Ordering::SeqCst))
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Duration {
        (**self).now()
    }
}

/// Elapsed-time tracker for one search.
pub(crate) struct Stopwatch<'a, C: ?Sized> {
    clock: &'a C,
    started: Duration,
}

impl<'a, C: Clock + ?Sized> Stopwatch<'a, C> {
    pub(crate) fn start(clock: &'a C) -> Self {
        Stopwatch {
            clock,
            started: clock.now(),
        }
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.clock.now().saturating_sub(self.started)
    }

    /// Whether `deadline` has passed; never true without a deadline.
    pub(crate) fn expired(&self, deadline: Option<Duration>) -> bool {
        match deadline {
            Some(deadline) => self.elapsed() >= deadline,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advance() {
        let clock = ManualClock::new();
        assert_eq!(clock.now(), Duration::ZERO);

        clock.advance(Duration::from_millis(250));
        assert_eq!(clock.now(), Duration::from_millis(250));
        assert_eq!(clock.now(), Duration::from_millis(250));
    }

    #[test]
    fn test_manual_clock_step() {
        let clock = ManualClock::with_step(Duration::from_secs(1));
        assert_eq!(clock.now(), Duration::ZERO);
        assert_eq!(clock.now(), Duration::from_secs(1));
        assert_eq!(clock.now(), Duration::from_secs(2));
    }

    #[test]
    fn test_stopwatch_deadline() {
        let clock = ManualClock::new();
        clock.advance(Duration::from_secs(10));
        let watch = Stopwatch::start(&clock);

        assert!(!watch.expired(None));
        assert!(!watch.expired(Some(Duration::from_secs(1))));
        assert!(watch.expired(Some(Duration::ZERO)));

        clock.advance(Duration::from_secs(1));
        assert_eq!(watch.elapsed(), Duration::from_secs(1));
        assert!(watch.expired(Some(Duration::from_secs(1))));
    }

    #[test]
    fn test_system_clock_moves_forward() {
        let clock = SystemClock::new();
        let first = clock.now();
        std::thread::sleep(Duration::from_millis(1));
        assert!(clock.now() > first);
    }
}
