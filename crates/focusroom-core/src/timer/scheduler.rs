//! Stateful driver around [`SchedulerState`].
//!
//! [`FocusScheduler`] feeds inputs into the pure state machine, persists the
//! snapshot after every change, and on completion or cancellation records
//! the session, updates the task and notifies listeners.

use super::engine::{Outcome, SchedulerState, TimerInput, Transition};
use super::plan::{format_hms, BlockPlan};
use crate::clock::Clock;
use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::session::FocusSession;
use crate::stats::StatsEngine;
use crate::storage::FocusStore;
use crate::task::TaskRepository;

type SessionListener<'a> = Box<dyn FnMut(&FocusSession) + 'a>;

pub struct FocusScheduler<'a, S: ?Sized, T: ?Sized> {
    store: &'a S,
    tasks: &'a T,
    clock: &'a dyn Clock,
    state: Option<SchedulerState>,
    events: Vec<Event>,
    listeners: Vec<SessionListener<'a>>,
    auto_start_breaks: bool,
}

impl<'a, S, T> FocusScheduler<'a, S, T>
where
    S: FocusStore + ?Sized,
    T: TaskRepository + ?Sized,
{
    pub fn new(store: &'a S, tasks: &'a T, clock: &'a dyn Clock) -> Self {
        Self {
            store,
            tasks,
            clock,
            state: None,
            events: Vec::new(),
            listeners: Vec::new(),
            auto_start_breaks: false,
        }
    }

    /// Run each break as soon as it becomes pending.
    pub fn with_auto_start_breaks(mut self, enabled: bool) -> Self {
        self.auto_start_breaks = enabled;
        self
    }

    /// Register a callback for every recorded session.
    pub fn on_session_ended(&mut self, callback: impl FnMut(&FocusSession) + 'a) {
        self.listeners.push(Box::new(callback));
    }

    pub fn state(&self) -> Option<&SchedulerState> {
        self.state.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.state.is_some()
    }

    /// Full state snapshot event, if a session is active.
    pub fn snapshot(&self) -> Option<Event> {
        self.state.as_ref().map(SchedulerState::snapshot)
    }

    /// Drain the events emitted since the last call.
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Begin a session for `task_id`, resuming the stored snapshot when it
    /// belongs to the same task.
    ///
    /// Calling this again for the task already running is a no-op. Any
    /// other task's snapshot is replaced.
    pub fn start_or_resume(
        &mut self,
        task_id: Option<&str>,
        plan: BlockPlan,
    ) -> Result<&SchedulerState> {
        if let Some(current) = self.state.take() {
            if current.belongs_to(task_id) {
                return Ok(&*self.state.insert(current));
            }
            tracing::info!(
                previous = ?current.task_id(),
                task_id = ?task_id,
                "switching focus session to another task"
            );
        }

        let saved = self.store.active()?;
        if let Some(saved) = &saved {
            if !saved.belongs_to(task_id) {
                tracing::debug!(previous = ?saved.task_id(), "snapshot belongs to another task");
            } else if !saved.is_restorable() {
                tracing::warn!(task_id = ?task_id, "discarding stale scheduler snapshot");
            }
        }

        let (state, events) = SchedulerState::start(plan, task_id.map(str::to_owned), saved);
        let restored = matches!(
            events.first(),
            Some(Event::SessionStarted { restored: true, .. })
        );
        tracing::info!(
            task_id = ?task_id,
            restored,
            blocks = state.plan().total_blocks,
            remaining = %state.remaining_display(),
            "focus session started"
        );

        self.store.save(&state)?;
        self.events.extend(events);
        let pending_break = state.awaiting_break_decision();
        self.state = Some(state);
        if self.auto_start_breaks && pending_break {
            self.apply(TimerInput::StartBreak)?;
        }
        self.state
            .as_ref()
            .ok_or_else(|| CoreError::Custom("session ended while starting".into()))
    }

    /// Pick up the stored snapshot exactly as saved, without starting it.
    ///
    /// Used by hosts that drive one input per process, where the running
    /// flag must survive between invocations.
    pub fn attach(&mut self) -> Result<Option<&SchedulerState>> {
        if self.state.is_none() {
            self.state = self.store.active()?.filter(SchedulerState::is_restorable);
        }
        Ok(self.state.as_ref())
    }

    pub fn tick(&mut self, elapsed_ms: u64) -> Result<()> {
        self.apply(TimerInput::Tick(elapsed_ms))
    }

    pub fn pause(&mut self) -> Result<()> {
        self.apply(TimerInput::Pause)
    }

    pub fn resume(&mut self) -> Result<()> {
        self.apply(TimerInput::Resume)
    }

    pub fn start_break(&mut self) -> Result<()> {
        self.apply(TimerInput::StartBreak)
    }

    pub fn skip_break(&mut self) -> Result<()> {
        self.apply(TimerInput::SkipBreak)
    }

    /// Stop the session early. Returns the unconsumed seconds written back
    /// to the task, or `None` when no session is active.
    pub fn cancel(&mut self) -> Result<Option<i64>> {
        let Some(remaining_secs) = self.state.as_ref().map(SchedulerState::unconsumed_secs) else {
            return Ok(None);
        };
        self.apply(TimerInput::Cancel)?;
        Ok(Some(remaining_secs))
    }

    fn apply(&mut self, input: TimerInput) -> Result<()> {
        let Some(state) = self.state.take() else {
            tracing::debug!(?input, "no active session");
            return Ok(());
        };
        let before = state.clone();
        let task_id = state.task_id().map(str::to_owned);

        let Transition { outcome, events } = state.advance(input);
        self.events.extend(events);

        match outcome {
            Outcome::Active(next) => {
                let next = if self.auto_start_breaks && next.awaiting_break_decision() {
                    let Transition { outcome, events } = next.advance(TimerInput::StartBreak);
                    self.events.extend(events);
                    match outcome {
                        Outcome::Active(running) => running,
                        _ => return Ok(()),
                    }
                } else {
                    next
                };

                if next == before {
                    tracing::debug!(?input, "state unchanged, snapshot kept");
                    self.state = Some(next);
                    return Ok(());
                }
                let next = self.state.insert(next);
                self.store.save(next)?;
            }
            Outcome::Completed { duration_ms } => {
                self.finish(task_id, duration_ms, None)?;
            }
            Outcome::Cancelled {
                duration_ms,
                remaining_secs,
            } => {
                self.finish(task_id, duration_ms, Some(remaining_secs))?;
            }
        }
        Ok(())
    }

    /// `remaining_secs` is `None` for a completed session.
    fn finish(
        &mut self,
        task_id: Option<String>,
        duration_ms: u64,
        remaining_secs: Option<i64>,
    ) -> Result<()> {
        let completed = remaining_secs.is_none();
        self.store.clear(task_id.as_deref())?;

        let session =
            FocusSession::ended_at(self.clock.now_ms(), duration_ms, completed, task_id.clone());
        let stats = StatsEngine::new(self.store, self.tasks, self.clock);
        stats.record_session(&session)?;

        if let Some(id) = task_id.as_deref() {
            self.write_back(id, remaining_secs)?;
        }
        if completed {
            stats.refresh_completed_tasks()?;
        }

        tracing::info!(
            task_id = ?task_id,
            completed,
            duration_ms,
            remaining_secs = remaining_secs.unwrap_or(0),
            "focus session ended"
        );

        for listener in &mut self.listeners {
            listener(&session);
        }
        Ok(())
    }

    fn write_back(&self, task_id: &str, remaining_secs: Option<i64>) -> Result<()> {
        let Some(mut task) = self.tasks.get_task(task_id)? else {
            tracing::warn!(task_id, "task not found, skipping task update");
            return Ok(());
        };
        match remaining_secs {
            Some(secs) => task.time = format_hms(secs),
            None => {
                task.time = format_hms(0);
                task.is_completed = true;
            }
        }
        self.tasks.update_task(&task)
    }
}
