//! Statistics over the stored session log.
//!
//! [`StatsEngine`] binds the pure calculations in this module to a store, a
//! task repository and a clock. Every figure is recomputed from the log;
//! the daily cache only contributes `completed_tasks`, which the log does
//! not record.

use chrono::NaiveDate;

use super::calendar::{calendar_for_month, CalendarDay};
use super::daily::{daily_stats_for, rebuild, DailyStats};
use super::month::{month_stats, MonthStats, MonthYear};
use super::streak::{advance_longest, current_streak, StreakState};
use crate::clock::Clock;
use crate::error::Result;
use crate::session::FocusSession;
use crate::storage::FocusStore;
use crate::task::TaskRepository;

pub struct StatsEngine<'a, S: ?Sized, T: ?Sized> {
    store: &'a S,
    tasks: &'a T,
    clock: &'a dyn Clock,
}

impl<'a, S, T> StatsEngine<'a, S, T>
where
    S: FocusStore + ?Sized,
    T: TaskRepository + ?Sized,
{
    pub fn new(store: &'a S, tasks: &'a T, clock: &'a dyn Clock) -> Self {
        Self {
            store,
            tasks,
            clock,
        }
    }

    /// Append a finished session and fold it into the derived data.
    ///
    /// Completed focus sessions update the day's cache row and may raise
    /// the stored longest streak.
    pub fn record_session(&self, session: &FocusSession) -> Result<()> {
        self.store.append(session)?;
        self.store.merge(session)?;
        if !session.is_focus() {
            return Ok(());
        }

        let current = self.current_streak()?;
        let stored = self.store.longest_streak()?;
        let longest = advance_longest(stored, current);
        if longest != stored {
            self.store.set_longest_streak(longest)?;
            tracing::debug!(longest, "longest streak advanced");
        }
        Ok(())
    }

    /// Store today's count of completed tasks due today on the cache row.
    pub fn refresh_completed_tasks(&self) -> Result<()> {
        let today = self.clock.today();
        let count = self.tasks.completed_due_on(today)?;
        self.store
            .set_completed_tasks(today, u32::try_from(count).unwrap_or(u32::MAX))
    }

    pub fn daily_stats(&self, date: NaiveDate) -> Result<DailyStats> {
        let sessions = self.store.all()?;
        let mut stats = daily_stats_for(&sessions, date);
        if let Some(cached) = self.store.daily_stats(date)? {
            stats.completed_tasks = cached.completed_tasks;
        }
        Ok(stats)
    }

    /// Rollup for a `MM.yyyy` month.
    ///
    /// # Errors
    /// Returns a validation error for a malformed month string.
    pub fn month_stats(&self, month_year: &str) -> Result<MonthStats> {
        let month_year: MonthYear = month_year.parse()?;
        self.month_stats_for(month_year)
    }

    pub fn month_stats_for(&self, month_year: MonthYear) -> Result<MonthStats> {
        let sessions = self.store.all()?;
        let tasks = self.tasks.all_tasks()?;
        Ok(month_stats(&sessions, &tasks, month_year, self.clock.today()))
    }

    pub fn current_month_stats(&self) -> Result<MonthStats> {
        self.month_stats_for(MonthYear::current(self.clock))
    }

    /// `month0` is zero-based: 0 is January.
    pub fn calendar_for_month(&self, year: i32, month0: u32) -> Result<Vec<CalendarDay>> {
        let sessions = self.store.all()?;
        Ok(calendar_for_month(&sessions, year, month0, self.clock.today())?)
    }

    pub fn current_streak(&self) -> Result<u32> {
        let sessions = self.store.all()?;
        Ok(current_streak(&sessions, self.clock.today()))
    }

    /// Stored running maximum. Only [`record_session`](Self::record_session)
    /// advances it.
    pub fn longest_streak(&self) -> Result<u32> {
        self.store.longest_streak()
    }

    pub fn streaks(&self) -> Result<StreakState> {
        Ok(StreakState {
            current_streak: self.current_streak()?,
            longest_streak: self.store.longest_streak()?,
        })
    }

    /// Recompute the daily cache from the log. Returns the number of rows.
    pub fn rebuild_daily_cache(&self) -> Result<usize> {
        let sessions = self.store.all()?;
        let previous = self.store.all_daily_stats()?;
        let rows = rebuild(&sessions, &previous);
        self.store.replace_all(&rows)?;
        tracing::info!(rows = rows.len(), sessions = sessions.len(), "rebuilt daily stats cache");
        Ok(rows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{local_noon_ms, FixedClock};
    use crate::error::CoreError;
    use crate::storage::{DailyStatsCache, Database, EventStore, StreakStore};
    use crate::task::Task;
    use chrono::Days;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn focus_on(date: NaiveDate, minutes: i64) -> FocusSession {
        FocusSession::ended_at(
            local_noon_ms(date) + minutes * 60_000,
            (minutes * 60_000) as u64,
            true,
            None,
        )
    }

    #[test]
    fn record_session_advances_longest_streak() {
        let db = Database::open_memory().unwrap();
        let today = day(2024, 3, 10);
        let clock = FixedClock::on(today);
        let stats = StatsEngine::new(&db, &db, &clock);

        for back in (0..3).rev() {
            stats
                .record_session(&focus_on(today - Days::new(back), 25))
                .unwrap();
        }
        assert_eq!(stats.current_streak().unwrap(), 3);
        assert_eq!(db.longest_streak().unwrap(), 3);

        clock.set(local_noon_ms(day(2024, 3, 20)));
        assert_eq!(stats.current_streak().unwrap(), 0);
        assert_eq!(stats.longest_streak().unwrap(), 3);
    }

    #[test]
    fn longest_streak_reads_the_stored_value() {
        let db = Database::open_memory().unwrap();
        let today = day(2024, 3, 10);
        let clock = FixedClock::on(today);
        let stats = StatsEngine::new(&db, &db, &clock);

        // Appended straight to the log, so nothing advanced the stored maximum.
        db.append(&focus_on(today - Days::new(1), 25)).unwrap();
        db.append(&focus_on(today, 25)).unwrap();
        assert_eq!(stats.current_streak().unwrap(), 2);
        assert_eq!(stats.longest_streak().unwrap(), 0);
        assert_eq!(
            stats.streaks().unwrap(),
            StreakState {
                current_streak: 2,
                longest_streak: 0,
            }
        );
    }

    #[test]
    fn partial_sessions_are_logged_but_not_counted() {
        let db = Database::open_memory().unwrap();
        let today = day(2024, 3, 10);
        let clock = FixedClock::on(today);
        let stats = StatsEngine::new(&db, &db, &clock);

        let partial = FocusSession::ended_at(clock.now_ms(), 600_000, false, None);
        stats.record_session(&partial).unwrap();
        assert_eq!(db.all().unwrap().len(), 1);
        assert_eq!(stats.daily_stats(today).unwrap().completed_sessions, 0);
        assert!(db.daily_stats(today).unwrap().is_none());
        assert_eq!(db.longest_streak().unwrap(), 0);
    }

    #[test]
    fn month_stats_rejects_malformed_month() {
        let db = Database::open_memory().unwrap();
        let clock = FixedClock::on(day(2024, 3, 10));
        let stats = StatsEngine::new(&db, &db, &clock);
        assert!(matches!(
            stats.month_stats("2024-03"),
            Err(CoreError::Validation(_))
        ));
        assert_eq!(stats.month_stats("03.2024").unwrap().completed_sessions, 0);
    }

    #[test]
    fn completed_tasks_come_from_the_cache() {
        let db = Database::open_memory().unwrap();
        let today = day(2024, 3, 10);
        let clock = FixedClock::on(today);
        let stats = StatsEngine::new(&db, &db, &clock);

        let mut task = Task::new("due").with_deadline(today);
        task.is_completed = true;
        db.insert_task(&task).unwrap();
        stats.record_session(&focus_on(today, 25)).unwrap();
        stats.refresh_completed_tasks().unwrap();

        let daily = stats.daily_stats(today).unwrap();
        assert_eq!(daily.completed_sessions, 1);
        assert_eq!(daily.completed_tasks, 1);
    }

    #[test]
    fn rebuild_restores_cache_from_log() {
        let db = Database::open_memory().unwrap();
        let today = day(2024, 3, 10);
        let clock = FixedClock::on(today);
        let stats = StatsEngine::new(&db, &db, &clock);

        stats.record_session(&focus_on(today, 25)).unwrap();
        stats.record_session(&focus_on(today - Days::new(1), 10)).unwrap();
        db.replace_all(&[]).unwrap();

        assert_eq!(stats.rebuild_daily_cache().unwrap(), 2);
        let row = db.daily_stats(today).unwrap().unwrap();
        assert_eq!(row.total_focus_time, 25 * 60_000);
    }

    #[test]
    fn calendar_marks_today() {
        let db = Database::open_memory().unwrap();
        let clock = FixedClock::on(day(2024, 2, 14));
        let stats = StatsEngine::new(&db, &db, &clock);
        let days = stats.calendar_for_month(2024, 1).unwrap();
        assert_eq!(days.len(), 29);
        assert!(days[13].is_today);
    }
}
