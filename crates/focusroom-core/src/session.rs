//! The focus session log record.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::day_of;

/// One finished focus attempt. Written once when a session completes or is
/// cancelled; never updated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusSession {
    pub id: String,
    /// Epoch milliseconds when the accounted time began.
    pub start_time: i64,
    /// Accrued time in milliseconds.
    pub duration: i64,
    /// Every planned work block finished.
    pub completed: bool,
    #[serde(default)]
    pub task_id: Option<String>,
}

impl FocusSession {
    /// Record a session that ended at `ended_at_ms` after `duration_ms`.
    pub fn ended_at(
        ended_at_ms: i64,
        duration_ms: u64,
        completed: bool,
        task_id: Option<String>,
    ) -> Self {
        let duration = i64::try_from(duration_ms).unwrap_or(i64::MAX);
        Self {
            id: Uuid::new_v4().to_string(),
            start_time: ended_at_ms.saturating_sub(duration),
            duration,
            completed,
            task_id,
        }
    }

    /// Completed with positive duration. Only these count toward statistics.
    pub fn is_focus(&self) -> bool {
        self.completed && self.duration > 0
    }

    /// Local calendar day the session started on.
    pub fn day(&self) -> NaiveDate {
        day_of(self.start_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_time_is_end_minus_duration() {
        let s = FocusSession::ended_at(10_000_000, 1_500_000, true, None);
        assert_eq!(s.start_time, 8_500_000);
        assert_eq!(s.duration, 1_500_000);
        assert!(s.is_focus());
    }

    #[test]
    fn partial_and_empty_sessions_are_not_focus() {
        assert!(!FocusSession::ended_at(1_000, 500, false, None).is_focus());
        assert!(!FocusSession::ended_at(1_000, 0, true, None).is_focus());
    }
}
