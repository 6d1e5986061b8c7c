//! Statistics for focus sessions.
//!
//! Pure calculations over the session log (daily totals, month rollups, the
//! month calendar and streaks) plus [`StatsEngine`], which runs them against
//! the stores.

mod calendar;
mod daily;
mod engine;
mod month;
mod streak;

pub use calendar::{calendar_for_month, CalendarDay};
pub use daily::{daily_stats_for, per_day, rebuild, DailyStats};
pub use engine::StatsEngine;
pub use month::{month_stats, MonthStats, MonthYear};
pub use streak::{advance_longest, current_streak, focus_days, StreakState};
