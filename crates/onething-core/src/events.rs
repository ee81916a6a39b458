use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Every focus-session transition produces an Event.
/// Front ends render them; the completion pipeline reacts to `FocusCompleted`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    FocusStarted {
        task_id: String,
        minutes: u32,
        at: DateTime<FixedOffset>,
    },
    FocusPaused {
        task_id: String,
        remaining_secs: u64,
        /// Paused because the app lost the foreground.
        backgrounded: bool,
        at: DateTime<FixedOffset>,
    },
    FocusResumed {
        task_id: String,
        remaining_secs: u64,
        at: DateTime<FixedOffset>,
    },
    FocusCompleted {
        task_id: String,
        total_secs: u64,
        at: DateTime<FixedOffset>,
    },
    FocusCancelled {
        task_id: String,
        remaining_secs: u64,
        at: DateTime<FixedOffset>,
    },
}

impl Event {
    pub fn task_id(&self) -> &str {
        match self {
            Event::FocusStarted { task_id, .. }
            | Event::FocusPaused { task_id, .. }
            | Event::FocusResumed { task_id, .. }
            | Event::FocusCompleted { task_id, .. }
            | Event::FocusCancelled { task_id, .. } => task_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let at = DateTime::parse_from_rfc3339("2024-03-01T09:00:00+09:00").unwrap();
        let e = Event::FocusCompleted {
            task_id: "todo_1".into(),
            total_secs: 300,
            at,
        };
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["type"], "FocusCompleted");
        assert_eq!(e.task_id(), "todo_1");
    }
}
