//! Timestamp sources for samples and events.

use std::time::{SystemTime, UNIX_EPOCH};

/// Source of millisecond timestamps.
pub trait Clock: Send {
    /// Current time in Unix milliseconds.
    fn now_ms(&mut self) -> u64;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&mut self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// Deterministic clock that moves forward a fixed step on every read.
///
/// Used for headless runs and tests so replays produce identical output.
#[derive(Debug, Clone, Copy)]
pub struct VirtualClock {
    now_ms: u64,
    step_ms: u64,
}

impl VirtualClock {
    pub fn new(start_ms: u64, step_ms: u64) -> Self {
        Self {
            now_ms: start_ms,
            step_ms,
        }
    }
}

impl Clock for VirtualClock {
    fn now_ms(&mut self) -> u64 {
        let now = self.now_ms;
        self.now_ms += self.step_ms;
        now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn virtual_clock_advances_per_read() {
        let mut clock = VirtualClock::new(100, 1000);
        assert_eq!(clock.now_ms(), 100);
        assert_eq!(clock.now_ms(), 1100);
        assert_eq!(clock.now_ms(), 2100);
    }

    #[test]
    fn system_clock_is_after_2020() {
        assert!(SystemClock.now_ms() > 1_577_836_800_000);
    }
}
