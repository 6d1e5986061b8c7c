use serde::{Deserialize, Serialize};

use crate::timer::{BlockPlan, Phase};

/// Every scheduler transition produces one or more events.
/// Hosts render them; the CLI prints them as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    SessionStarted {
        task_id: Option<String>,
        plan: BlockPlan,
        /// True when an interrupted countdown was picked up again.
        restored: bool,
    },
    /// A work block or break began counting down.
    BlockStarted {
        phase: Phase,
        block_index: u32,
        duration_ms: u64,
    },
    BlockFinished {
        phase: Phase,
        block_index: u32,
    },
    /// A work block ended and more remain: the host decides whether the
    /// break runs or is skipped.
    BreakPending {
        next_block_index: u32,
        break_duration_min: u32,
    },
    TimerPaused {
        remaining_ms: u64,
    },
    TimerResumed {
        remaining_ms: u64,
    },
    SessionCompleted {
        duration_ms: u64,
    },
    SessionCancelled {
        duration_ms: u64,
        /// Unconsumed time written back to the task.
        remaining_secs: i64,
    },
    StateSnapshot {
        task_id: Option<String>,
        phase: Phase,
        block_index: u32,
        total_blocks: u32,
        remaining_ms: u64,
        current_block_ms: u64,
        /// Countdown as `HH:MM:SS`.
        display: String,
        running: bool,
        awaiting_break_decision: bool,
        last_minute: bool,
    },
}
