//! Task management commands for CLI.

use clap::Subcommand;
use focusroom_core::clock::{parse_day, Clock, SystemClock};
use focusroom_core::storage::Database;
use focusroom_core::task::{Task, TaskRepository};
use focusroom_core::timer::{format_hms, parse_duration_minutes};
use focusroom_core::StatsEngine;

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a new task
    Add {
        /// Task title
        title: String,
        /// Due day, dd.MM.yyyy
        #[arg(long)]
        deadline: Option<String>,
        /// Planned focus time, HH:MM:SS
        #[arg(long)]
        time: Option<String>,
    },
    /// List tasks
    List {
        /// Only open tasks past their deadline
        #[arg(long)]
        overdue: bool,
    },
    /// Show task details
    Show {
        /// Task ID
        id: String,
    },
    /// Mark a task completed
    Complete {
        /// Task ID
        id: String,
    },
}

pub fn run(action: TaskAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let clock = SystemClock;

    match action {
        TaskAction::Add {
            title,
            deadline,
            time,
        } => {
            let mut task = Task::new(title);
            if let Some(deadline) = deadline {
                task = task.with_deadline(parse_day(&deadline)?);
            }
            if let Some(time) = time {
                task = task.with_time(format_hms(parse_duration_minutes(&time) * 60));
            }
            db.insert_task(&task)?;
            println!("{}", serde_json::to_string_pretty(&task)?);
        }
        TaskAction::List { overdue } => {
            let tasks = if overdue {
                db.overdue_tasks(clock.today())?
            } else {
                db.all_tasks()?
            };
            println!("{}", serde_json::to_string_pretty(&tasks)?);
        }
        TaskAction::Show { id } => {
            let task = db.get_task(&id)?.ok_or_else(|| format!("task not found: {id}"))?;
            println!("{}", serde_json::to_string_pretty(&task)?);
        }
        TaskAction::Complete { id } => {
            let mut task = db.get_task(&id)?.ok_or_else(|| format!("task not found: {id}"))?;
            task.is_completed = true;
            db.update_task(&task)?;
            StatsEngine::new(&db, &db, &clock).refresh_completed_tasks()?;
            println!("{}", serde_json::to_string_pretty(&task)?);
        }
    }
    Ok(())
}
