//! Focus session state machine.
//!
//! The state machine is pure: it owns no clock and no storage. The host
//! feeds it [`TimerInput`]s (usually a `Tick(1000)` every second) and gets
//! back a [`Transition`] holding the next state and the events to surface.
//! Persisting the returned state is the caller's job.
//!
//! ## State Transitions
//!
//! ```text
//! Working(0) -> [BreakPending] -> OnBreak(1) -> Working(1) -> ... -> Completed
//!                     \--- skip ----------------^
//! any state  -> Cancelled
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let (mut state, events) = SchedulerState::start(plan, task_id, saved);
//! // Once per second:
//! match state.advance(TimerInput::Tick(1000)).outcome {
//!     Outcome::Active(next) => state = next,
//!     Outcome::Completed { .. } | Outcome::Cancelled { .. } => break,
//! }
//! ```

use serde::{Deserialize, Serialize};

use super::plan::{format_hms_ms, BlockPlan};
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Working,
    OnBreak,
}

/// Input fed to [`SchedulerState::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerInput {
    /// Milliseconds elapsed since the previous tick.
    Tick(u64),
    Pause,
    Resume,
    /// Run the break offered by a `BreakPending` event.
    StartBreak,
    /// Jump from a pending or running break straight to the next work block.
    SkipBreak,
    Cancel,
}

/// Where a transition left the session.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Active(SchedulerState),
    /// Every work block finished.
    Completed { duration_ms: u64 },
    /// Stopped early. `remaining_secs` is the unconsumed plan time.
    Cancelled { duration_ms: u64, remaining_secs: i64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub outcome: Outcome,
    pub events: Vec<Event>,
}

impl Transition {
    fn active(state: SchedulerState, events: Vec<Event>) -> Self {
        Self {
            outcome: Outcome::Active(state),
            events,
        }
    }

    /// The state after the transition, if the session is still running.
    pub fn state(&self) -> Option<&SchedulerState> {
        match &self.outcome {
            Outcome::Active(state) => Some(state),
            _ => None,
        }
    }
}

/// Resumable countdown through a [`BlockPlan`].
///
/// Serialized as the persisted snapshot. [`SchedulerState::start`] runs a
/// restored snapshot again whatever its stored `running` flag says.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerState {
    task_id: Option<String>,
    plan: BlockPlan,
    phase: Phase,
    current_block_index: u32,
    remaining_time_ms: u64,
    current_block_time_ms: u64,
    total_planned_time_ms: u64,
    #[serde(default)]
    awaiting_break_decision: bool,
    #[serde(default)]
    running: bool,
}

impl SchedulerState {
    /// Fresh, idle state at the start of the first work block.
    pub fn new(plan: BlockPlan, task_id: Option<String>) -> Self {
        let block_ms = plan.work_block_ms();
        Self {
            task_id,
            plan,
            phase: Phase::Working,
            current_block_index: 0,
            remaining_time_ms: block_ms,
            current_block_time_ms: block_ms,
            total_planned_time_ms: plan.span_ms(),
            awaiting_break_decision: false,
            running: false,
        }
    }

    /// Start a session for `task_id`, picking up `saved` when it belongs to
    /// the same task and still has time on the clock.
    ///
    /// Anything else in `saved` (another task, an exhausted or inconsistent
    /// countdown) is ignored and a fresh session begins.
    pub fn start(
        plan: BlockPlan,
        task_id: Option<String>,
        saved: Option<SchedulerState>,
    ) -> (Self, Vec<Event>) {
        if let Some(mut state) = saved.filter(|s| s.belongs_to(task_id.as_deref()) && s.is_restorable())
        {
            let mut events = vec![Event::SessionStarted {
                task_id: state.task_id.clone(),
                plan: state.plan,
                restored: true,
            }];
            if state.awaiting_break_decision {
                events.push(Event::BreakPending {
                    next_block_index: state.current_block_index,
                    break_duration_min: state.plan.break_duration,
                });
            } else {
                state.running = true;
                events.push(Event::TimerResumed {
                    remaining_ms: state.remaining_time_ms,
                });
            }
            return (state, events);
        }

        let mut state = Self::new(plan, task_id);
        state.running = true;
        let events = vec![
            Event::SessionStarted {
                task_id: state.task_id.clone(),
                plan,
                restored: false,
            },
            Event::BlockStarted {
                phase: Phase::Working,
                block_index: 0,
                duration_ms: state.current_block_time_ms,
            },
        ];
        (state, events)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn task_id(&self) -> Option<&str> {
        self.task_id.as_deref()
    }

    pub fn plan(&self) -> &BlockPlan {
        &self.plan
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_block_index(&self) -> u32 {
        self.current_block_index
    }

    pub fn remaining_time_ms(&self) -> u64 {
        self.remaining_time_ms
    }

    pub fn current_block_time_ms(&self) -> u64 {
        self.current_block_time_ms
    }

    pub fn total_planned_time_ms(&self) -> u64 {
        self.total_planned_time_ms
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn awaiting_break_decision(&self) -> bool {
        self.awaiting_break_decision
    }

    pub fn belongs_to(&self, task_id: Option<&str>) -> bool {
        self.task_id.as_deref() == task_id
    }

    /// Whether a persisted copy of this state can be resumed.
    pub fn is_restorable(&self) -> bool {
        self.remaining_time_ms > 0
            && self.current_block_time_ms > 0
            && self.remaining_time_ms <= self.current_block_time_ms
            && self.plan.total_blocks >= 1
            && self.plan.work_block_duration >= 1
            && self.current_block_index < self.plan.total_blocks
    }

    /// Countdown as `HH:MM:SS`.
    pub fn remaining_display(&self) -> String {
        format_hms_ms(self.remaining_time_ms as i64)
    }

    /// Final minute of a work block, used to highlight the countdown.
    pub fn is_last_minute(&self) -> bool {
        self.phase == Phase::Working
            && self.remaining_time_ms > 0
            && self.remaining_time_ms <= 60_000
    }

    /// 0.0 .. 1.0 progress within the current block.
    pub fn block_progress(&self) -> f64 {
        if self.current_block_time_ms == 0 {
            return 0.0;
        }
        1.0 - (self.remaining_time_ms as f64 / self.current_block_time_ms as f64)
    }

    /// Seconds of plan time not yet consumed: the rest of the current block
    /// plus every later work block and break.
    pub fn unconsumed_secs(&self) -> i64 {
        let n = i64::from(self.plan.total_blocks);
        let i = i64::from(self.current_block_index);
        let work_secs = i64::from(self.plan.work_block_duration) * 60;
        let break_secs = i64::from(self.plan.break_duration) * 60;
        let current = (self.remaining_time_ms / 1000) as i64;

        let (future_work, future_breaks) = match self.phase {
            Phase::Working => (n - i - 1, n - i - 1),
            Phase::OnBreak => (n - i, n - i - 1),
        };

        (current + future_work.max(0) * work_secs + future_breaks.max(0) * break_secs).max(0)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            task_id: self.task_id.clone(),
            phase: self.phase,
            block_index: self.current_block_index,
            total_blocks: self.plan.total_blocks,
            remaining_ms: self.remaining_time_ms,
            current_block_ms: self.current_block_time_ms,
            display: self.remaining_display(),
            running: self.running,
            awaiting_break_decision: self.awaiting_break_decision,
            last_minute: self.is_last_minute(),
        }
    }

    // ── Transitions ──────────────────────────────────────────────────

    pub fn advance(mut self, input: TimerInput) -> Transition {
        match input {
            TimerInput::Tick(elapsed_ms) => {
                if !self.running {
                    return Transition::active(self, Vec::new());
                }
                self.remaining_time_ms = self.remaining_time_ms.saturating_sub(elapsed_ms);
                if self.remaining_time_ms > 0 {
                    return Transition::active(self, Vec::new());
                }
                self.finish_block()
            }
            TimerInput::Pause => {
                if !self.running {
                    return Transition::active(self, Vec::new());
                }
                self.running = false;
                let remaining_ms = self.remaining_time_ms;
                Transition::active(self, vec![Event::TimerPaused { remaining_ms }])
            }
            TimerInput::Resume => {
                if self.running || self.awaiting_break_decision || self.remaining_time_ms == 0 {
                    return Transition::active(self, Vec::new());
                }
                self.running = true;
                let remaining_ms = self.remaining_time_ms;
                Transition::active(self, vec![Event::TimerResumed { remaining_ms }])
            }
            TimerInput::StartBreak => {
                if !self.awaiting_break_decision {
                    return Transition::active(self, Vec::new());
                }
                self.awaiting_break_decision = false;
                self.running = true;
                let event = Event::BlockStarted {
                    phase: Phase::OnBreak,
                    block_index: self.current_block_index,
                    duration_ms: self.current_block_time_ms,
                };
                Transition::active(self, vec![event])
            }
            TimerInput::SkipBreak => {
                if self.phase != Phase::OnBreak {
                    return Transition::active(self, Vec::new());
                }
                let index = self.current_block_index;
                let event = self.enter_work(index);
                Transition::active(self, vec![event])
            }
            TimerInput::Cancel => {
                let remaining_secs = self.unconsumed_secs();
                let consumed_ms = self
                    .total_planned_time_ms
                    .saturating_sub((remaining_secs as u64).saturating_mul(1000));
                Transition {
                    outcome: Outcome::Cancelled {
                        duration_ms: consumed_ms,
                        remaining_secs,
                    },
                    events: vec![Event::SessionCancelled {
                        duration_ms: consumed_ms,
                        remaining_secs,
                    }],
                }
            }
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn finish_block(mut self) -> Transition {
        let index = self.current_block_index;
        let mut events = vec![Event::BlockFinished {
            phase: self.phase,
            block_index: index,
        }];

        match self.phase {
            Phase::OnBreak => {
                events.push(self.enter_work(index));
                Transition::active(self, events)
            }
            Phase::Working if index + 1 < self.plan.total_blocks => {
                let next = index + 1;
                if self.plan.break_ms() == 0 {
                    events.push(self.enter_work(next));
                    return Transition::active(self, events);
                }
                self.phase = Phase::OnBreak;
                self.current_block_index = next;
                self.current_block_time_ms = self.plan.break_ms();
                self.remaining_time_ms = self.current_block_time_ms;
                self.running = false;
                self.awaiting_break_decision = true;
                events.push(Event::BreakPending {
                    next_block_index: next,
                    break_duration_min: self.plan.break_duration,
                });
                Transition::active(self, events)
            }
            Phase::Working => {
                let duration_ms = self
                    .total_planned_time_ms
                    .saturating_sub(self.remaining_time_ms);
                events.push(Event::SessionCompleted { duration_ms });
                Transition {
                    outcome: Outcome::Completed { duration_ms },
                    events,
                }
            }
        }
    }

    fn enter_work(&mut self, index: u32) -> Event {
        self.phase = Phase::Working;
        self.current_block_index = index;
        self.current_block_time_ms = self.plan.work_block_ms();
        self.remaining_time_ms = self.current_block_time_ms;
        self.awaiting_break_decision = false;
        self.running = true;
        Event::BlockStarted {
            phase: Phase::Working,
            block_index: index,
            duration_ms: self.current_block_time_ms,
        }
    }
}
