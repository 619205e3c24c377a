//! Wall-clock source for time-seeded behavior.
//!
//! Scout patrol phase, live-update stamps and decision timestamps all read
//! from a [`SimClock`] so tests can pin time.

use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Mutex;

/// Source of "now" for the simulation.
pub trait SimClock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Current time as fractional epoch milliseconds.
    fn now_ms(&self) -> f64 {
        self.now().timestamp_millis() as f64
    }
}

/// Real wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SimClock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Clock pinned at `ms` milliseconds after the epoch.
    pub fn at_millis(ms: i64) -> Self {
        Self::at(DateTime::from_timestamp_millis(ms).unwrap_or_default())
    }

    pub fn advance(&self, delta: TimeDelta) {
        if let Ok(mut guard) = self.now.lock() {
            *guard += delta;
        }
    }
}

impl SimClock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.lock().map(|guard| *guard).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::at_millis(1_000);
        assert_eq!(clock.now_ms(), 1_000.0);

        clock.advance(TimeDelta::milliseconds(250));
        assert_eq!(clock.now_ms(), 1_250.0);
    }
}
