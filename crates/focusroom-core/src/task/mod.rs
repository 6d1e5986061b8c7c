//! Task records consumed by the scheduler and statistics.
//!
//! Task storage belongs to the host. Focusroom only reads tasks, writes back
//! the remaining focus time, and marks tasks done, all through
//! [`TaskRepository`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;

/// Label shown when a session has no task or its task has disappeared.
pub const FALLBACK_TASK_LABEL: &str = "Task";

/// A task the user focuses on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    /// Day the task is due, if any.
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    /// Focus time still owed to the task, `HH:MM:SS`. Empty when never set.
    #[serde(default)]
    pub time: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_completed: bool,
}

impl Task {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            deadline: None,
            time: String::new(),
            created_at: Utc::now(),
            is_completed: false,
        }
    }

    pub fn with_deadline(mut self, deadline: NaiveDate) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = time.into();
        self
    }

    /// Open and due strictly before `today`.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.is_completed && self.deadline.is_some_and(|d| d < today)
    }

    pub fn is_due_on(&self, day: NaiveDate) -> bool {
        self.deadline == Some(day)
    }
}

/// Title to display for an optional task.
pub fn display_label(task: Option<&Task>) -> &str {
    task.map(|t| t.title.as_str()).unwrap_or(FALLBACK_TASK_LABEL)
}

/// Narrow view of the host's task store.
pub trait TaskRepository {
    fn get_task(&self, id: &str) -> Result<Option<Task>>;

    /// Replace the stored task with the same id. Unknown ids are ignored.
    fn update_task(&self, task: &Task) -> Result<()>;

    fn all_tasks(&self) -> Result<Vec<Task>>;

    fn overdue_tasks(&self, today: NaiveDate) -> Result<Vec<Task>> {
        Ok(self
            .all_tasks()?
            .into_iter()
            .filter(|t| t.is_overdue(today))
            .collect())
    }

    /// Completed tasks whose deadline is `day`.
    fn completed_due_on(&self, day: NaiveDate) -> Result<usize> {
        Ok(self
            .all_tasks()?
            .iter()
            .filter(|t| t.is_completed && t.is_due_on(day))
            .count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn overdue_requires_open_task_due_before_today() {
        let today = day(2024, 5, 10);
        let late = Task::new("late").with_deadline(day(2024, 5, 9));
        let due_today = Task::new("today").with_deadline(today);
        let mut done = Task::new("done").with_deadline(day(2024, 5, 1));
        done.is_completed = true;

        assert!(late.is_overdue(today));
        assert!(!due_today.is_overdue(today));
        assert!(!done.is_overdue(today));
        assert!(!Task::new("undated").is_overdue(today));
    }

    #[test]
    fn missing_task_uses_fallback_label() {
        assert_eq!(display_label(None), FALLBACK_TASK_LABEL);
        let task = Task::new("Write report");
        assert_eq!(display_label(Some(&task)), "Write report");
    }

    #[test]
    fn task_json_tolerates_missing_optional_fields() {
        let json = r#"{"id":"t1","title":"Read","created_at":"2024-01-01T00:00:00Z"}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.deadline, None);
        assert!(task.time.is_empty());
        assert!(!task.is_completed);
    }
}
