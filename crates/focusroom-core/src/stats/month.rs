//! Monthly rollups.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::daily::per_day;
use super::streak::current_streak;
use crate::clock::Clock;
use crate::error::ValidationError;
use crate::session::FocusSession;
use crate::task::Task;

/// A calendar month, written `MM.yyyy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MonthYear {
    pub year: i32,
    /// 1 = January.
    pub month: u32,
}

impl MonthYear {
    pub fn new(year: i32, month: u32) -> Result<Self, ValidationError> {
        if !(1..=12).contains(&month) {
            return Err(ValidationError::InvalidMonthYear(format!("{month:02}.{year}")));
        }
        Ok(Self { year, month })
    }

    /// Month containing `date`.
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Month containing the clock's today.
    pub fn current(clock: &dyn Clock) -> Self {
        Self::of(clock.today())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    pub fn days_in_month(&self) -> u32 {
        let Some(first) = self.first_day() else {
            return 0;
        };
        let next = if self.month == 12 {
            NaiveDate::from_ymd_opt(self.year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(self.year, self.month + 1, 1)
        };
        next.map(|n| (n - first).num_days() as u32).unwrap_or(0)
    }
}

impl fmt::Display for MonthYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}.{}", self.month, self.year)
    }
}

impl FromStr for MonthYear {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidMonthYear(s.to_string());
        let (month, year) = s.trim().split_once('.').ok_or_else(invalid)?;
        if month.len() > 2 || year.len() != 4 {
            return Err(invalid());
        }
        let month: u32 = month.parse().map_err(|_| invalid())?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        Self::new(year, month).map_err(|_| invalid())
    }
}

/// Aggregates for one month.
///
/// Session figures are scoped to the month. `current_streak` spans the
/// whole history, and the task figures cover every task regardless of
/// deadline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthStats {
    pub month_year: MonthYear,
    /// Milliseconds of completed focus started in the month.
    pub total_focus_time: i64,
    pub completed_sessions: u32,
    pub completed_tasks: u32,
    /// Longest completed session in the month, milliseconds.
    pub longest_session: i64,
    /// Best single day in the month, milliseconds.
    pub max_daily_focus_time: i64,
    pub current_streak: u32,
    /// Completed tasks as a percentage of all tasks, 0 when there are none.
    pub task_completion_rate: f64,
    pub overdue_tasks: u32,
}

pub fn month_stats(
    sessions: &[FocusSession],
    tasks: &[Task],
    month_year: MonthYear,
    today: NaiveDate,
) -> MonthStats {
    let in_month: Vec<FocusSession> = sessions
        .iter()
        .filter(|s| s.is_focus() && month_year.contains(s.day()))
        .cloned()
        .collect();

    let total_focus_time = in_month.iter().map(|s| s.duration).sum();
    let longest_session = in_month.iter().map(|s| s.duration).max().unwrap_or(0);
    let max_daily_focus_time = per_day(&in_month)
        .values()
        .map(|d| d.total_focus_time)
        .max()
        .unwrap_or(0);

    let completed_tasks = tasks.iter().filter(|t| t.is_completed).count();
    let task_completion_rate = if tasks.is_empty() {
        0.0
    } else {
        completed_tasks as f64 / tasks.len() as f64 * 100.0
    };
    let overdue_tasks = tasks.iter().filter(|t| t.is_overdue(today)).count();

    MonthStats {
        month_year,
        total_focus_time,
        completed_sessions: in_month.len() as u32,
        completed_tasks: completed_tasks as u32,
        longest_session,
        max_daily_focus_time,
        current_streak: current_streak(sessions, today),
        task_completion_rate,
        overdue_tasks: overdue_tasks as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::local_noon_ms;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn session(date: NaiveDate, minutes: i64, completed: bool) -> FocusSession {
        FocusSession {
            id: format!("{date}-{minutes}"),
            start_time: local_noon_ms(date),
            duration: minutes * 60_000,
            completed,
            task_id: None,
        }
    }

    #[test]
    fn parses_month_year() {
        assert_eq!("02.2024".parse::<MonthYear>().unwrap(), MonthYear { year: 2024, month: 2 });
        assert_eq!("2.2024".parse::<MonthYear>().unwrap().month, 2);
        for bad in ["13.2024", "00.2024", "2024.02", "02-2024", "", "aa.bbbb"] {
            assert!(bad.parse::<MonthYear>().is_err(), "{bad}");
        }
        assert_eq!(MonthYear { year: 2024, month: 2 }.to_string(), "02.2024");
    }

    #[test]
    fn current_month_follows_clock() {
        let clock = crate::clock::FixedClock::on(day(2024, 12, 31));
        assert_eq!(MonthYear::current(&clock).to_string(), "12.2024");
    }

    #[test]
    fn days_in_month_handles_leap_years() {
        assert_eq!(MonthYear::new(2024, 2).unwrap().days_in_month(), 29);
        assert_eq!(MonthYear::new(2023, 2).unwrap().days_in_month(), 28);
        assert_eq!(MonthYear::new(2023, 12).unwrap().days_in_month(), 31);
    }

    #[test]
    fn month_totals_only_include_completed_sessions_in_month() {
        let sessions = vec![
            session(day(2024, 2, 1), 25, true),
            session(day(2024, 2, 1), 20, true),
            session(day(2024, 2, 14), 50, true),
            session(day(2024, 2, 15), 40, false),
            session(day(2024, 3, 1), 90, true),
        ];
        let stats = month_stats(&sessions, &[], MonthYear::new(2024, 2).unwrap(), day(2024, 3, 1));
        assert_eq!(stats.total_focus_time, 95 * 60_000);
        assert_eq!(stats.completed_sessions, 3);
        assert_eq!(stats.longest_session, 50 * 60_000);
        assert_eq!(stats.max_daily_focus_time, 50 * 60_000);
        // Streak spans months: only 1 March has focus.
        assert_eq!(stats.current_streak, 1);
    }

    #[test]
    fn empty_month_is_zeroed() {
        let stats = month_stats(&[], &[], MonthYear::new(2024, 2).unwrap(), day(2024, 2, 10));
        assert_eq!(stats.total_focus_time, 0);
        assert_eq!(stats.longest_session, 0);
        assert_eq!(stats.max_daily_focus_time, 0);
        assert_eq!(stats.task_completion_rate, 0.0);
    }

    #[test]
    fn task_figures_cover_all_tasks() {
        let today = day(2024, 2, 10);
        let mut done = Task::new("done").with_deadline(day(2023, 6, 1));
        done.is_completed = true;
        let tasks = vec![
            done,
            Task::new("late").with_deadline(day(2024, 1, 3)),
            Task::new("later").with_deadline(day(2024, 2, 20)),
            Task::new("undated"),
        ];
        let stats = month_stats(&[], &tasks, MonthYear::new(2024, 2).unwrap(), today);
        assert_eq!(stats.completed_tasks, 1);
        assert_eq!(stats.task_completion_rate, 25.0);
        assert_eq!(stats.overdue_tasks, 1);
    }
}
