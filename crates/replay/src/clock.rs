use core_types::Millis;
use std::cell::Cell;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Time source of a replayer. `now` drives the scheduler and must be
/// monotonic; `wall_time` is compared against recorded timestamps in live mode.
pub trait Clock {
    fn now(&self) -> Millis;
    fn wall_time(&self) -> Millis;
}

pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
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
    fn now(&self) -> Millis {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }

    fn wall_time(&self) -> Millis {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64() * 1000.0)
            .unwrap_or(0.0)
    }
}

/// Hand-driven clock for tests and headless seeking.
#[derive(Default)]
pub struct ManualClock {
    now: Cell<Millis>,
    wall_offset: Cell<Millis>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wall time reads as `epoch + now`.
    pub fn with_wall_epoch(epoch: Millis) -> Self {
        let clock = Self::default();
        clock.wall_offset.set(epoch);
        clock
    }

    pub fn advance(&self, ms: Millis) {
        self.now.set(self.now.get() + ms);
    }

    pub fn set(&self, ms: Millis) {
        self.now.set(ms);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Millis {
        self.now.get()
    }

    fn wall_time(&self) -> Millis {
        self.wall_offset.get() + self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::with_wall_epoch(1_000.0);
        clock.advance(16.0);
        clock.advance(4.0);
        assert_eq!(clock.now(), 20.0);
        assert_eq!(clock.wall_time(), 1_020.0);
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
        assert!(clock.wall_time() > 0.0);
    }
}
