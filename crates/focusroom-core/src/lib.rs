//! # Focusroom Core Library
//!
//! Core logic for Focusroom, a focus-session timer that splits a task's
//! planned time into work blocks separated by short breaks. The CLI binary
//! is a thin layer over this library.
//!
//! ## Architecture
//!
//! - **Timer**: block planning plus a pure countdown state machine. The host
//!   owns the clock and feeds ticks in.
//! - **Storage**: SQLite for the session log, daily cache, tasks and the
//!   scheduler snapshot; TOML for configuration
//! - **Stats**: daily totals, month rollups, calendar view and streaks, all
//!   derived from the session log
//!
//! ## Key Components
//!
//! - [`FocusScheduler`]: drives a session and records it when it ends
//! - [`SchedulerState`]: resumable countdown state machine
//! - [`StatsEngine`]: statistics over the stored log
//! - [`Database`]: SQLite implementation of every store
//! - [`Config`]: application configuration management

pub mod clock;
pub mod error;
pub mod events;
pub mod session;
pub mod stats;
pub mod storage;
pub mod task;
pub mod timer;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use session::FocusSession;
pub use stats::{CalendarDay, DailyStats, MonthStats, MonthYear, StatsEngine, StreakState};
pub use storage::{Config, Database};
pub use task::{Task, TaskRepository};
pub use timer::{
    format_hms, plan_blocks, BlockPlan, FocusScheduler, Phase, SchedulerState, TimerInput,
};
