mod config;
pub mod database;
pub mod migrations;

pub use config::{Config, LoggingConfig, TimerConfig};
pub use database::Database;

use std::path::PathBuf;

use chrono::NaiveDate;

use crate::error::Result;
use crate::session::FocusSession;
use crate::stats::DailyStats;
use crate::timer::SchedulerState;

/// Returns the Focusroom data directory, creating it if needed.
///
/// `FOCUSROOM_DATA_DIR` wins when set. Otherwise `~/.config/focusroom`, or
/// `~/.config/focusroom-dev` with `FOCUSROOM_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("FOCUSROOM_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("FOCUSROOM_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("focusroom-dev")
            } else {
                base_dir.join("focusroom")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Durable slot for the running session's scheduler state.
///
/// There is a single slot: saving a state for one task replaces whatever
/// another task left behind.
pub trait SnapshotStore {
    /// The stored state, whichever task it belongs to. Unreadable data is
    /// reported as `None`.
    fn active(&self) -> Result<Option<SchedulerState>>;

    fn save(&self, state: &SchedulerState) -> Result<()>;

    /// Remove the stored state if it belongs to `task_id` (or is unreadable).
    fn clear(&self, task_id: Option<&str>) -> Result<()>;

    /// The stored state if it belongs to `task_id`.
    fn load(&self, task_id: Option<&str>) -> Result<Option<SchedulerState>> {
        Ok(self.active()?.filter(|s| s.belongs_to(task_id)))
    }
}

/// Append-only focus session log.
pub trait EventStore {
    fn append(&self, session: &FocusSession) -> Result<()>;

    /// Every recorded session. Order is unspecified.
    fn all(&self) -> Result<Vec<FocusSession>>;
}

/// Persisted longest-streak counter.
pub trait StreakStore {
    fn longest_streak(&self) -> Result<u32>;

    fn set_longest_streak(&self, value: u32) -> Result<()>;
}

/// Cached per-day totals derived from the session log.
pub trait DailyStatsCache {
    /// Fold a session into its day's row, creating the row if needed.
    /// Sessions that are not completed focus leave the cache unchanged.
    fn merge(&self, session: &FocusSession) -> Result<()>;

    /// Set the completed task count on an existing row. Days without a row
    /// are left alone.
    fn set_completed_tasks(&self, date: NaiveDate, count: u32) -> Result<()>;

    fn daily_stats(&self, date: NaiveDate) -> Result<Option<DailyStats>>;

    fn all_daily_stats(&self) -> Result<Vec<DailyStats>>;

    /// Replace every row, used when rebuilding from the log.
    fn replace_all(&self, rows: &[DailyStats]) -> Result<()>;
}

/// Everything the scheduler and statistics engine persist.
pub trait FocusStore: SnapshotStore + EventStore + StreakStore + DailyStatsCache {}

impl<T: SnapshotStore + EventStore + StreakStore + DailyStatsCache + ?Sized> FocusStore for T {}
