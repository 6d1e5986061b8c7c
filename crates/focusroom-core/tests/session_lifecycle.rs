//! End-to-end tests for a focus session against an on-disk database.
//!
//! Each test opens its own SQLite file in a temp directory, drives the
//! scheduler with a fixed clock, and checks what ends up in storage.

use chrono::NaiveDate;
use focusroom_core::clock::{local_noon_ms, FixedClock};
use focusroom_core::events::Event;
use focusroom_core::storage::{Database, EventStore, SnapshotStore};
use focusroom_core::task::{Task, TaskRepository};
use focusroom_core::timer::{plan_blocks, FocusScheduler, Phase};
use focusroom_core::StatsEngine;

// ============================================================================
// Test Helpers
// ============================================================================

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
}

fn open(dir: &tempfile::TempDir) -> Database {
    Database::open_at(&dir.path().join("focusroom.db")).unwrap()
}

fn add_task(db: &Database, title: &str) -> Task {
    let task = Task::new(title).with_deadline(today()).with_time("00:36:00");
    db.insert_task(&task).unwrap();
    task
}

// ============================================================================
// Restore
// ============================================================================

#[test]
fn session_resumes_after_reopening_database() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FixedClock::on(today());
    let task_id = {
        let db = open(&dir);
        let task = add_task(&db, "Draft");
        let mut scheduler = FocusScheduler::new(&db, &db, &clock);
        scheduler.start_or_resume(Some(&task.id), plan_blocks("00:36:00")).unwrap();
        scheduler.tick(600_000).unwrap();
        scheduler.start_break().unwrap();
        scheduler.tick(30_000).unwrap();
        task.id
    };

    let db = open(&dir);
    let mut scheduler = FocusScheduler::new(&db, &db, &clock);
    let state = scheduler
        .start_or_resume(Some(&task_id), plan_blocks("00:50:00"))
        .unwrap();
    assert_eq!(state.phase(), Phase::OnBreak);
    assert_eq!(state.current_block_index(), 1);
    assert_eq!(state.remaining_display(), "00:02:30");
    // The saved plan wins over the one passed in.
    assert_eq!(state.plan().work_block_duration, 10);

    let events = scheduler.take_events();
    assert!(matches!(events[0], Event::SessionStarted { restored: true, .. }));
}

#[test]
fn pending_break_is_offered_again_after_restore() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FixedClock::on(today());
    let db = open(&dir);
    let task = add_task(&db, "Read");
    {
        let mut scheduler = FocusScheduler::new(&db, &db, &clock);
        scheduler.start_or_resume(Some(&task.id), plan_blocks("00:36:00")).unwrap();
        scheduler.tick(600_000).unwrap();
    }

    let mut scheduler = FocusScheduler::new(&db, &db, &clock);
    let state = scheduler.start_or_resume(Some(&task.id), plan_blocks("00:36:00")).unwrap();
    assert!(state.awaiting_break_decision());
    assert!(!state.is_running());
    let events = scheduler.take_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::BreakPending { next_block_index: 1, .. })));

    scheduler.skip_break().unwrap();
    let state = scheduler.state().unwrap();
    assert_eq!((state.phase(), state.current_block_index()), (Phase::Working, 1));
}

#[test]
fn corrupt_snapshot_starts_fresh() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FixedClock::on(today());
    let db = open(&dir);
    let task = add_task(&db, "Fix");
    db.kv_set("scheduler_snapshot", "{\"task_id\": 12").unwrap();

    let mut scheduler = FocusScheduler::new(&db, &db, &clock);
    let state = scheduler.start_or_resume(Some(&task.id), plan_blocks("00:36:00")).unwrap();
    assert_eq!(state.remaining_time_ms(), 600_000);
    assert!(db.load(Some(&task.id)).unwrap().is_some());
}

// ============================================================================
// Completion and cancellation
// ============================================================================

#[test]
fn completed_session_feeds_statistics() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FixedClock::on(today());
    let db = open(&dir);
    let task = add_task(&db, "Ship");

    let mut recorded = Vec::new();
    {
        let mut scheduler =
            FocusScheduler::new(&db, &db, &clock).with_auto_start_breaks(true);
        scheduler.on_session_ended(|s| recorded.push(s.clone()));
        scheduler.start_or_resume(Some(&task.id), plan_blocks("00:36:00")).unwrap();
        for _ in 0..(36 * 60) {
            clock.advance_ms(1_000);
            scheduler.tick(1_000).unwrap();
            if !scheduler.is_active() {
                break;
            }
        }
        assert!(!scheduler.is_active());
    }

    assert_eq!(recorded.len(), 1);
    assert!(recorded[0].completed);
    assert_eq!(recorded[0].duration, 36 * 60_000);
    assert!(db.active().unwrap().is_none());

    let stored = db.get_task(&task.id).unwrap().unwrap();
    assert!(stored.is_completed);
    assert_eq!(stored.time, "00:00:00");

    let stats = StatsEngine::new(&db, &db, &clock);
    let daily = stats.daily_stats(today()).unwrap();
    assert_eq!(daily.total_focus_time, 36 * 60_000);
    assert_eq!(daily.completed_sessions, 1);
    assert_eq!(daily.completed_tasks, 1);
    assert_eq!(stats.current_streak().unwrap(), 1);
    assert_eq!(stats.longest_streak().unwrap(), 1);

    let month = stats.month_stats("06.2024").unwrap();
    assert_eq!(month.completed_tasks, 1);
    assert_eq!(month.task_completion_rate, 100.0);
}

#[test]
fn cancelled_session_is_logged_but_not_counted() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FixedClock::at(local_noon_ms(today()));
    let db = open(&dir);
    let task = add_task(&db, "Plan");

    let mut scheduler = FocusScheduler::new(&db, &db, &clock);
    scheduler.start_or_resume(Some(&task.id), plan_blocks("00:36:00")).unwrap();
    scheduler.tick(600_000).unwrap();
    scheduler.start_break().unwrap();
    scheduler.tick(60_000).unwrap();

    // OnBreak(1) with 2 minutes left: 120 + 2*600 + 1*180.
    assert_eq!(scheduler.cancel().unwrap(), Some(1_500));
    assert_eq!(db.get_task(&task.id).unwrap().unwrap().time, "00:25:00");

    let sessions = db.all().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].duration, (36 * 60 - 1_500) * 1_000);

    let stats = StatsEngine::new(&db, &db, &clock);
    assert_eq!(stats.daily_stats(today()).unwrap().completed_sessions, 0);
    assert_eq!(stats.current_streak().unwrap(), 0);
}

#[test]
fn session_without_task_completes() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FixedClock::on(today());
    let db = open(&dir);

    let mut scheduler = FocusScheduler::new(&db, &db, &clock);
    scheduler.start_or_resume(None, plan_blocks("00:05:00")).unwrap();
    scheduler.tick(300_000).unwrap();

    let sessions = db.all().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].task_id, None);
    assert!(db.all_tasks().unwrap().is_empty());
}
