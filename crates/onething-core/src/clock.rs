//! Wall clock and calendar-day helpers.
//!
//! Every day-scoped rule (condition expiry, streaks, daily earnings, reminders)
//! compares device-local calendar dates, never rolling 24h windows.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate, Timelike};

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Current timestamp in the device's local offset.
    fn now(&self) -> DateTime<FixedOffset>;

    /// Current local calendar day.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    /// The local calendar day before today.
    fn yesterday(&self) -> NaiveDate {
        self.today() - Duration::days(1)
    }

    /// Local hour of day (0-23).
    fn hour(&self) -> u32 {
        self.now().hour()
    }
}

/// Reads the operating system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// Settable clock for tests and simulations.
///
/// Clones share the same instant, so one handle can be advanced while the
/// stores hold another.
#[derive(Debug, Clone)]
pub struct FixedClock {
    at: Arc<Mutex<DateTime<FixedOffset>>>,
}

impl FixedClock {
    pub fn new(at: DateTime<FixedOffset>) -> Self {
        Self {
            at: Arc::new(Mutex::new(at)),
        }
    }

    /// Parse an RFC 3339 timestamp, e.g. `2024-03-01T10:00:00+09:00`.
    ///
    /// # Panics
    /// Panics on malformed input; intended for test fixtures.
    pub fn at(rfc3339: &str) -> Self {
        let parsed = DateTime::parse_from_rfc3339(rfc3339)
            .unwrap_or_else(|e| panic!("bad fixture timestamp {rfc3339}: {e}"));
        Self::new(parsed)
    }

    pub fn set(&self, at: DateTime<FixedOffset>) {
        *self.lock() = at;
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.lock();
        *guard += by;
    }

    pub fn advance_days(&self, days: i64) {
        self.advance(Duration::days(days));
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DateTime<FixedOffset>> {
        // A poisoned fixture clock still holds a valid instant.
        self.at.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        *self.lock()
    }
}

/// Format a calendar day as `YYYY-MM-DD`.
pub fn day_key(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn today_uses_local_offset_not_utc() {
        // 23:30 at +09:00 is still the 1st locally, though UTC is on the 1st too;
        // 00:30 at +09:00 is the 2nd locally but the 1st in UTC.
        let clock = FixedClock::at("2024-03-02T00:30:00+09:00");
        assert_eq!(day_key(clock.today()), "2024-03-02");
        assert_eq!(day_key(clock.yesterday()), "2024-03-01");
        assert_eq!(clock.hour(), 0);
    }

    #[test]
    fn clones_share_the_instant() {
        let clock = FixedClock::at("2024-03-01T10:00:00+00:00");
        let handle = clock.clone();
        handle.advance_days(2);
        assert_eq!(day_key(clock.today()), "2024-03-03");
    }
}
