//! Per-day focus totals.
//!
//! [`DailyStats`] rows are a cache: they are merged as sessions are appended
//! and can always be rebuilt from the session log with [`rebuild`].

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::session::FocusSession;

/// Focus totals for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStats {
    pub date: NaiveDate,
    /// Milliseconds of completed focus.
    pub total_focus_time: i64,
    pub completed_sessions: u32,
    /// Tasks due that day and completed, as reported by the task store.
    pub completed_tasks: u32,
}

impl DailyStats {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            total_focus_time: 0,
            completed_sessions: 0,
            completed_tasks: 0,
        }
    }

    /// Fold one session in. Sessions that are not completed focus are ignored.
    pub fn absorb(&mut self, session: &FocusSession) {
        if session.is_focus() {
            self.total_focus_time += session.duration;
            self.completed_sessions += 1;
        }
    }

    pub fn has_focus(&self) -> bool {
        self.completed_sessions > 0
    }
}

/// Totals for `date`, counting completed sessions with positive duration.
pub fn daily_stats_for(sessions: &[FocusSession], date: NaiveDate) -> DailyStats {
    let mut stats = DailyStats::empty(date);
    for session in sessions.iter().filter(|s| s.day() == date) {
        stats.absorb(session);
    }
    stats
}

/// One entry per focus day, ordered by date.
pub fn per_day(sessions: &[FocusSession]) -> BTreeMap<NaiveDate, DailyStats> {
    let mut days: BTreeMap<NaiveDate, DailyStats> = BTreeMap::new();
    for session in sessions.iter().filter(|s| s.is_focus()) {
        let day = session.day();
        days.entry(day)
            .or_insert_with(|| DailyStats::empty(day))
            .absorb(session);
    }
    days
}

/// Recompute the cache from the log, carrying over `completed_tasks` from
/// the previous cache since the log does not record it.
pub fn rebuild(sessions: &[FocusSession], previous: &[DailyStats]) -> Vec<DailyStats> {
    let mut days = per_day(sessions);
    for old in previous {
        if let Some(day) = days.get_mut(&old.date) {
            day.completed_tasks = old.completed_tasks;
        }
    }
    days.into_values().collect()
}
