//! Consecutive focus-day streaks.
//!
//! The current streak is always recomputed from the session log. The longest
//! streak is a stored running maximum that only moves forward when a new
//! completed session is recorded.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::session::FocusSession;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    pub current_streak: u32,
    pub longest_streak: u32,
}

/// Days with at least one completed, positive-duration session.
pub fn focus_days(sessions: &[FocusSession]) -> HashSet<NaiveDate> {
    sessions
        .iter()
        .filter(|s| s.is_focus())
        .map(FocusSession::day)
        .collect()
}

/// Consecutive focus days ending at `today`. Zero when today has no focus.
pub fn current_streak(sessions: &[FocusSession], today: NaiveDate) -> u32 {
    let days = focus_days(sessions);
    let mut streak = 0;
    let mut cursor = Some(today);
    while let Some(day) = cursor.filter(|d| days.contains(d)) {
        streak += 1;
        cursor = day.pred_opt();
    }
    streak
}

/// New stored maximum after a freshly computed `current` streak.
pub fn advance_longest(stored: u32, current: u32) -> u32 {
    stored.max(current)
}
