use std::future::Future;
use std::io::{IsTerminal, Write};
use std::time::Duration;

use clap::Subcommand;
use focusroom_core::clock::SystemClock;
use focusroom_core::storage::{Database, SnapshotStore};
use focusroom_core::task::{display_label, TaskRepository};
use focusroom_core::timer::{plan_blocks, BlockPlan, FocusScheduler};
use focusroom_core::Config;
use tokio::time::{Instant, MissedTickBehavior};

use super::print_events;

type Scheduler<'a> = FocusScheduler<'a, Database, Database>;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a focus session, or resume the stored one
    Start {
        /// Task ID to focus on (default: the task of the stored session)
        #[arg(long)]
        task: Option<String>,
        /// Planned duration (default: the task's remaining time, then timer.default_duration)
        #[arg(long)]
        duration: Option<String>,
    },
    /// Start or resume a session and count it down in the foreground
    Run {
        #[arg(long)]
        task: Option<String>,
        #[arg(long)]
        duration: Option<String>,
    },
    /// Advance the stored session
    Tick {
        /// Elapsed milliseconds
        #[arg(default_value_t = 1000)]
        ms: u64,
    },
    /// Pause the countdown
    Pause,
    /// Resume a paused countdown
    Resume,
    /// Run the pending break
    StartBreak,
    /// Skip the pending or running break
    SkipBreak,
    /// Stop the session and write the remaining time back to the task
    Cancel,
    /// Print the current session state as JSON
    Status,
}

pub fn run(action: TimerAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let clock = SystemClock;
    let mut scheduler =
        FocusScheduler::new(&db, &db, &clock).with_auto_start_breaks(config.timer.auto_start_breaks);

    match action {
        TimerAction::Start { task, duration } => {
            start(&db, &mut scheduler, task, duration, config)?;
            print_events(&scheduler.take_events())?;
            print_status(&scheduler)?;
        }
        TimerAction::Run { task, duration } => {
            start(&db, &mut scheduler, task, duration, config)?;
            print_events(&scheduler.take_events())?;
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(drive(
                &db,
                &mut scheduler,
                config.timer.tick_interval_ms,
                tokio::signal::ctrl_c(),
            ))?;
        }
        TimerAction::Status => {
            scheduler.attach()?;
            print_status(&scheduler)?;
        }
        action => {
            if scheduler.attach()?.is_none() {
                println!("{{\"type\": \"idle\"}}");
                return Ok(());
            }
            match action {
                TimerAction::Tick { ms } => scheduler.tick(ms)?,
                TimerAction::Pause => scheduler.pause()?,
                TimerAction::Resume => scheduler.resume()?,
                TimerAction::StartBreak => scheduler.start_break()?,
                TimerAction::SkipBreak => scheduler.skip_break()?,
                TimerAction::Cancel => {
                    scheduler.cancel()?;
                }
                TimerAction::Start { .. } | TimerAction::Run { .. } | TimerAction::Status => {}
            }
            print_events(&scheduler.take_events())?;
            if scheduler.is_active() {
                print_status(&scheduler)?;
            }
        }
    }
    Ok(())
}

fn start(
    db: &Database,
    scheduler: &mut Scheduler<'_>,
    task: Option<String>,
    duration: Option<String>,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let task_id = match task {
        Some(id) => Some(id),
        None => db.active()?.and_then(|s| s.task_id().map(str::to_owned)),
    };
    let plan = plan_for(db, task_id.as_deref(), duration, config)?;
    scheduler.start_or_resume(task_id.as_deref(), plan)?;
    Ok(())
}

/// Explicit duration, else the task's remaining time, else the default.
fn plan_for(
    db: &Database,
    task_id: Option<&str>,
    duration: Option<String>,
    config: &Config,
) -> Result<BlockPlan, Box<dyn std::error::Error>> {
    if let Some(duration) = duration {
        return Ok(plan_blocks(&duration));
    }
    let task = match task_id {
        Some(id) => db.get_task(id)?,
        None => None,
    };
    let remaining = task
        .map(|t| t.time)
        .filter(|t| !t.is_empty() && t != "00:00:00");
    Ok(plan_blocks(
        remaining.as_deref().unwrap_or(&config.timer.default_duration),
    ))
}

fn print_status(scheduler: &Scheduler<'_>) -> Result<(), Box<dyn std::error::Error>> {
    match scheduler.snapshot() {
        Some(snapshot) => println!("{}", serde_json::to_string_pretty(&snapshot)?),
        None => println!("{{\"type\": \"idle\"}}"),
    }
    Ok(())
}

/// Count the session down until it ends, a break is pending, or `shutdown`
/// resolves. Shutdown pauses and persists the session.
async fn drive(
    db: &Database,
    scheduler: &mut Scheduler<'_>,
    tick_interval_ms: u64,
    shutdown: impl Future<Output = std::io::Result<()>>,
) -> Result<(), Box<dyn std::error::Error>> {
    let label = {
        let task = match scheduler.state().and_then(|s| s.task_id()) {
            Some(id) => db.get_task(id)?,
            None => None,
        };
        display_label(task.as_ref()).to_string()
    };
    let show_countdown = std::io::stderr().is_terminal();

    let mut interval = tokio::time::interval(Duration::from_millis(tick_interval_ms.max(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await;
    let mut last = Instant::now();
    tokio::pin!(shutdown);

    loop {
        let Some(state) = scheduler.state() else {
            return Ok(());
        };
        if state.awaiting_break_decision() {
            tracing::info!("break pending, use `timer start-break` or `timer skip-break`");
            print_status(scheduler)?;
            return Ok(());
        }

        tokio::select! {
            _ = interval.tick() => {
                let now = Instant::now();
                let elapsed = u64::try_from(now.duration_since(last).as_millis()).unwrap_or(u64::MAX);
                last = now;

                scheduler.tick(elapsed)?;
                let events = scheduler.take_events();
                if show_countdown && !events.is_empty() {
                    eprintln!();
                }
                print_events(&events)?;

                if let (true, Some(state)) = (show_countdown, scheduler.state()) {
                    let marker = if state.is_last_minute() { "!" } else { " " };
                    let percent = state.block_progress() * 100.0;
                    eprint!("\r{label} {} {percent:>3.0}%{marker}", state.remaining_display());
                    std::io::stderr().flush()?;
                }
            }
            _ = &mut shutdown => {
                if show_countdown {
                    eprintln!();
                }
                scheduler.pause()?;
                print_events(&scheduler.take_events())?;
                tracing::info!("paused, run `timer run` to continue");
                return Ok(());
            }
        }
    }
}
