//! Daily reminder schedule.
//!
//! Delivery is somebody else's job; this store only answers whether a reminder
//! is due and remembers the day one was sent.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, Timelike};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clock::Clock;
use crate::error::Result;
use crate::storage::{Persisted, StateStore};

pub const NOTIFICATION_KEY: &str = "onething-notification";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderState {
    pub enabled: bool,
    pub reminder_hour: u32,
    pub reminder_minute: u32,
    pub last_notified_date: Option<NaiveDate>,
}

impl Default for ReminderState {
    fn default() -> Self {
        Self {
            enabled: false,
            reminder_hour: 9,
            reminder_minute: 0,
            last_notified_date: None,
        }
    }
}

pub struct ReminderSchedule {
    state: Persisted<ReminderState>,
    clock: Arc<dyn Clock>,
}

impl ReminderSchedule {
    pub fn new(backend: Arc<dyn StateStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Persisted::new(NOTIFICATION_KEY, backend),
            clock,
        }
    }

    pub fn hydrate(&mut self) -> Result<()> {
        self.state.hydrate()
    }

    pub fn is_hydrated(&self) -> bool {
        self.state.is_hydrated()
    }

    pub fn state(&self) -> Result<&ReminderState> {
        self.state.get()
    }

    pub fn set_enabled(&mut self, enabled: bool) -> Result<()> {
        self.state.update(|s| s.enabled = enabled)?;
        debug!(enabled, "reminder toggled");
        Ok(())
    }

    /// Returns `false` without change for an impossible wall-clock time.
    pub fn set_reminder_time(&mut self, hour: u32, minute: u32) -> Result<bool> {
        if hour > 23 || minute > 59 {
            return Ok(false);
        }
        self.state.update(|s| {
            s.reminder_hour = hour;
            s.reminder_minute = minute;
        })?;
        Ok(true)
    }

    /// True when enabled, not yet sent on `now`'s day, and `now` is the
    /// reminder minute.
    pub fn should_notify(&self, now: DateTime<FixedOffset>) -> Result<bool> {
        let s = self.state.get()?;
        Ok(s.enabled
            && s.last_notified_date != Some(now.date_naive())
            && now.hour() == s.reminder_hour
            && now.minute() == s.reminder_minute)
    }

    pub fn should_notify_now(&self) -> Result<bool> {
        self.should_notify(self.clock.now())
    }

    pub fn mark_notified(&mut self) -> Result<()> {
        let today = self.clock.today();
        self.state.update(|s| s.last_notified_date = Some(today))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::storage::MemoryStore;
    use chrono::Duration;

    fn schedule(clock: &FixedClock) -> ReminderSchedule {
        let mut r = ReminderSchedule::new(Arc::new(MemoryStore::new()), Arc::new(clock.clone()));
        r.hydrate().unwrap();
        r
    }

    #[test]
    fn disabled_by_default() {
        let clock = FixedClock::at("2024-03-01T09:00:00+09:00");
        let r = schedule(&clock);
        assert!(!r.should_notify_now().unwrap());
        assert_eq!(r.state().unwrap().reminder_hour, 9);
    }

    #[test]
    fn fires_once_per_day_at_the_minute() {
        let clock = FixedClock::at("2024-03-01T09:00:00+09:00");
        let mut r = schedule(&clock);
        r.set_enabled(true).unwrap();
        assert!(r.should_notify_now().unwrap());

        r.mark_notified().unwrap();
        assert!(!r.should_notify_now().unwrap());

        clock.advance_days(1);
        assert!(r.should_notify_now().unwrap());
        clock.advance(Duration::minutes(1));
        assert!(!r.should_notify_now().unwrap());
    }

    #[test]
    fn custom_time() {
        let clock = FixedClock::at("2024-03-01T21:30:00+09:00");
        let mut r = schedule(&clock);
        r.set_enabled(true).unwrap();
        assert!(!r.should_notify_now().unwrap());
        assert!(r.set_reminder_time(21, 30).unwrap());
        assert!(r.should_notify_now().unwrap());
        assert!(!r.set_reminder_time(24, 0).unwrap());
        assert!(!r.set_reminder_time(7, 60).unwrap());
        assert_eq!(r.state().unwrap().reminder_hour, 21);
    }
}
