//! SQLite-backed storage.
//!
//! Provides persistent storage for:
//! - The append-only focus session log
//! - The daily totals cache
//! - Task records
//! - Key-value slots (scheduler snapshot, longest streak)

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{data_dir, migrations, DailyStatsCache, EventStore, SnapshotStore, StreakStore};
use crate::error::{DatabaseError, Result};
use crate::session::FocusSession;
use crate::stats::DailyStats;
use crate::task::{Task, TaskRepository};
use crate::timer::SchedulerState;

const SNAPSHOT_KEY: &str = "scheduler_snapshot";
const LONGEST_STREAK_KEY: &str = "longest_streak";

/// SQLite database holding every Focusroom store.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `<data dir>/focusroom.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("focusroom.db");
        Self::open_at(&path)
    }

    /// Open the database at an explicit path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        tracing::debug!(path = %path.display(), "opened database");
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        migrations::migrate(&self.conn)?;
        Ok(())
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_delete(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// Insert a new task.
    pub fn insert_task(&self, task: &Task) -> Result<()> {
        self.conn.execute(
            "INSERT INTO tasks (id, title, deadline, time, created_at, is_completed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                task.id,
                task.title,
                task.deadline.map(|d| d.to_string()),
                task.time,
                task.created_at.to_rfc3339(),
                task.is_completed,
            ],
        )?;
        Ok(())
    }

    /// Delete a task. Sessions referencing it keep their task id.
    pub fn delete_task(&self, id: &str) -> Result<bool> {
        let n = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
        Ok(n > 0)
    }

    fn row_to_task(row: &Row<'_>) -> rusqlite::Result<Task> {
        let deadline: Option<String> = row.get(2)?;
        let created_at: String = row.get(4)?;
        Ok(Task {
            id: row.get(0)?,
            title: row.get(1)?,
            deadline: deadline.and_then(|d| d.parse::<NaiveDate>().ok()),
            time: row.get(3)?,
            created_at: DateTime::parse_from_rfc3339(&created_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_default(),
            is_completed: row.get(5)?,
        })
    }

    fn row_to_daily(row: &Row<'_>) -> rusqlite::Result<Option<DailyStats>> {
        let date: String = row.get(0)?;
        let Ok(date) = date.parse::<NaiveDate>() else {
            return Ok(None);
        };
        Ok(Some(DailyStats {
            date,
            total_focus_time: row.get(1)?,
            completed_sessions: row.get(2)?,
            completed_tasks: row.get(3)?,
        }))
    }
}

impl EventStore for Database {
    fn append(&self, session: &FocusSession) -> Result<()> {
        self.conn.execute(
            "INSERT INTO sessions (id, start_time, duration, completed, task_id)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                session.id,
                session.start_time,
                session.duration,
                session.completed,
                session.task_id,
            ],
        )?;
        Ok(())
    }

    fn all(&self) -> Result<Vec<FocusSession>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, start_time, duration, completed, task_id
             FROM sessions
             ORDER BY start_time",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(FocusSession {
                id: row.get(0)?,
                start_time: row.get(1)?,
                duration: row.get(2)?,
                completed: row.get(3)?,
                task_id: row.get(4)?,
            })
        })?;

        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(row?);
        }
        Ok(sessions)
    }
}

impl SnapshotStore for Database {
    fn active(&self) -> Result<Option<SchedulerState>> {
        let Some(json) = self.kv_get(SNAPSHOT_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str::<SchedulerState>(&json) {
            Ok(state) => Ok(Some(state)),
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable scheduler snapshot");
                Ok(None)
            }
        }
    }

    fn save(&self, state: &SchedulerState) -> Result<()> {
        let json = serde_json::to_string(state)?;
        self.kv_set(SNAPSHOT_KEY, &json)
    }

    fn clear(&self, task_id: Option<&str>) -> Result<()> {
        let Some(json) = self.kv_get(SNAPSHOT_KEY)? else {
            return Ok(());
        };
        let owned = serde_json::from_str::<SchedulerState>(&json)
            .map(|s| s.belongs_to(task_id))
            .unwrap_or(true);
        if owned {
            self.kv_delete(SNAPSHOT_KEY)?;
        }
        Ok(())
    }
}

impl StreakStore for Database {
    fn longest_streak(&self) -> Result<u32> {
        Ok(self
            .kv_get(LONGEST_STREAK_KEY)?
            .and_then(|v| v.trim().parse::<u32>().ok())
            .unwrap_or(0))
    }

    fn set_longest_streak(&self, value: u32) -> Result<()> {
        self.kv_set(LONGEST_STREAK_KEY, &value.to_string())
    }
}

impl DailyStatsCache for Database {
    fn merge(&self, session: &FocusSession) -> Result<()> {
        if !session.is_focus() {
            return Ok(());
        }
        self.conn.execute(
            "INSERT INTO daily_stats (date, total_focus_time, completed_sessions, completed_tasks)
             VALUES (?1, ?2, 1, 0)
             ON CONFLICT(date) DO UPDATE SET
                total_focus_time = total_focus_time + excluded.total_focus_time,
                completed_sessions = completed_sessions + 1",
            params![session.day().to_string(), session.duration],
        )?;
        Ok(())
    }

    fn set_completed_tasks(&self, date: NaiveDate, count: u32) -> Result<()> {
        self.conn.execute(
            "UPDATE daily_stats SET completed_tasks = ?2 WHERE date = ?1",
            params![date.to_string(), count],
        )?;
        Ok(())
    }

    fn daily_stats(&self, date: NaiveDate) -> Result<Option<DailyStats>> {
        let row = self
            .conn
            .query_row(
                "SELECT date, total_focus_time, completed_sessions, completed_tasks
                 FROM daily_stats WHERE date = ?1",
                params![date.to_string()],
                Self::row_to_daily,
            )
            .optional()?;
        Ok(row.flatten())
    }

    fn all_daily_stats(&self) -> Result<Vec<DailyStats>> {
        let mut stmt = self.conn.prepare(
            "SELECT date, total_focus_time, completed_sessions, completed_tasks
             FROM daily_stats ORDER BY date",
        )?;
        let rows = stmt.query_map([], Self::row_to_daily)?;

        let mut stats = Vec::new();
        for row in rows {
            if let Some(day) = row? {
                stats.push(day);
            }
        }
        Ok(stats)
    }

    fn replace_all(&self, rows: &[DailyStats]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM daily_stats", [])?;
        for day in rows {
            tx.execute(
                "INSERT INTO daily_stats (date, total_focus_time, completed_sessions, completed_tasks)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    day.date.to_string(),
                    day.total_focus_time,
                    day.completed_sessions,
                    day.completed_tasks,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

impl TaskRepository for Database {
    fn get_task(&self, id: &str) -> Result<Option<Task>> {
        let task = self
            .conn
            .query_row(
                "SELECT id, title, deadline, time, created_at, is_completed
                 FROM tasks WHERE id = ?1",
                params![id],
                Self::row_to_task,
            )
            .optional()?;
        Ok(task)
    }

    fn update_task(&self, task: &Task) -> Result<()> {
        self.conn.execute(
            "UPDATE tasks SET title = ?2, deadline = ?3, time = ?4, is_completed = ?5
             WHERE id = ?1",
            params![
                task.id,
                task.title,
                task.deadline.map(|d| d.to_string()),
                task.time,
                task.is_completed,
            ],
        )?;
        Ok(())
    }

    fn all_tasks(&self) -> Result<Vec<Task>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, deadline, time, created_at, is_completed
             FROM tasks ORDER BY created_at",
        )?;
        let rows = stmt.query_map([], Self::row_to_task)?;

        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row?);
        }
        Ok(tasks)
    }
}
