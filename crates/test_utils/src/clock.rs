//! Deterministic Clocks
//!
//! Repository timestamps come from an [`infra_db::Clock`]. Tests that
//! depend on creation order use a [`SteppingClock`], which returns a
//! strictly increasing sequence, so rows created one after another always
//! sort in creation order.

use chrono::{DateTime, Duration, TimeZone, Utc};
use infra_db::Clock;
use parking_lot::Mutex;

/// Clock that advances by a fixed step on every reading
#[derive(Debug)]
pub struct SteppingClock {
    next: Mutex<DateTime<Utc>>,
    step: Duration,
}

impl SteppingClock {
    /// Creates a clock whose first reading is `start`
    pub fn new(start: DateTime<Utc>, step: Duration) -> Self {
        Self {
            next: Mutex::new(start),
            step,
        }
    }

    /// Returns the value the next reading will produce, without advancing
    pub fn peek(&self) -> DateTime<Utc> {
        *self.next.lock()
    }
}

impl Default for SteppingClock {
    /// Starts at 2024-01-01T00:00:00Z and steps one second
    fn default() -> Self {
        let start = Utc
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        Self::new(start, Duration::seconds(1))
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let mut next = self.next.lock();
        let now = *next;
        *next = now + self.step;
        now
    }
}

/// Clock frozen at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
