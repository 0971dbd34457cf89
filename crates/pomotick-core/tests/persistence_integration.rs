//! Integration tests for the SQLite-backed state store.

use pomotick_core::storage::{keys, Database, StateMap};
use pomotick_core::{Store, TaskLedger, TaskStatus, TimerEngine, TimerMode, TimerState};
use serde_json::json;
use tempfile::TempDir;

#[test]
fn test_state_written_by_one_handle_is_read_by_another() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state.db");

    {
        let store = Store::new(Database::open_at(&path).unwrap());
        let mut engine = TimerEngine::load(store.clone(), TimerState::default());
        engine.set_duration(50 * 60, 10 * 60);
        engine.switch_mode();

        let mut ledger = TaskLedger::load(store);
        ledger.set_current_task("plan sprint");
        ledger.update_current_status(TaskStatus::Completed);
    }

    let db = Database::open_at(&path).unwrap();
    assert_eq!(
        db.kv_keys().unwrap(),
        vec![
            keys::BREAK_DURATION,
            keys::COMPLETED_FOCUS_COUNT,
            keys::CURRENT_TASK,
            keys::FOCUS_DURATION,
            keys::MODE,
            keys::REMAINING_SECONDS,
            keys::TASK_HISTORY,
        ]
    );
    assert_eq!(db.kv_get(keys::MODE).unwrap().as_deref(), Some("\"break\""));

    let store = Store::new(db);
    let engine = TimerEngine::load(store.clone(), TimerState::default());
    assert_eq!(engine.mode(), TimerMode::Break);
    assert_eq!(engine.remaining_seconds(), 600);
    assert_eq!(engine.state().focus_duration, 3000);

    let ledger = TaskLedger::load(store);
    assert_eq!(ledger.current_task(), "plan sprint");
    assert_eq!(ledger.head().unwrap().status, TaskStatus::Completed);
}

#[test]
fn test_legacy_values_load() {
    let dir = TempDir::new().unwrap();
    let db = Database::open_at(&dir.path().join("state.db")).unwrap();
    db.kv_set(keys::MODE, "\"pomodoro\"").unwrap();
    db.kv_set(keys::REMAINING_SECONDS, "900").unwrap();
    db.kv_set(
        keys::TASK_HISTORY,
        &json!([
            {"time": "14:05", "task": "old style", "status": "ongoing"},
            {"time": "13:40", "task": "older", "status": "ongoing"}
        ])
        .to_string(),
    )
    .unwrap();

    let store = Store::new(db);
    let engine = TimerEngine::load(store.clone(), TimerState::default());
    assert_eq!(engine.mode(), TimerMode::Focus);
    assert_eq!(engine.remaining_seconds(), 900);

    let ledger = TaskLedger::load(store);
    let statuses: Vec<TaskStatus> = ledger.entries().iter().map(|e| e.status).collect();
    assert_eq!(statuses, vec![TaskStatus::Ongoing, TaskStatus::Interrupted]);
    assert_eq!(ledger.entries()[0].description, "old style");
}

#[test]
fn test_corrupt_value_falls_back_to_default() {
    let dir = TempDir::new().unwrap();
    let db = Database::open_at(&dir.path().join("state.db")).unwrap();
    db.kv_set(keys::COMPLETED_FOCUS_COUNT, "not json").unwrap();
    db.kv_set(keys::FOCUS_DURATION, "600").unwrap();

    let store = Store::new(db);
    let mut defaults = StateMap::new();
    defaults.insert(keys::COMPLETED_FOCUS_COUNT.into(), json!(0));
    defaults.insert(keys::FOCUS_DURATION.into(), json!(1500));

    let loaded = store.load(defaults);
    assert_eq!(loaded[keys::COMPLETED_FOCUS_COUNT], json!(0));
    assert_eq!(loaded[keys::FOCUS_DURATION], json!(600));
}

#[test]
fn test_bad_history_row_keeps_the_others() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state.db");
    let db = Database::open_at(&path).unwrap();
    db.kv_set(
        keys::TASK_HISTORY,
        r#"[{"time":"09:30","description":"review","status":"completed"},
            {"time":"09:00","description":"notes","status":"paused"},
            {"time":"08:30","description":"inbox","status":"interrupted"}]"#,
    )
    .unwrap();
    drop(db);

    let mut ledger = TaskLedger::load(Store::open_at(&path).unwrap());
    assert_eq!(ledger.entries().len(), 2);
    ledger.set_current_task("plan");

    let ledger = TaskLedger::load(Store::open_at(&path).unwrap());
    let descriptions: Vec<&str> = ledger
        .entries()
        .iter()
        .map(|e| e.description.as_str())
        .collect();
    assert_eq!(descriptions, vec!["plan", "review", "inbox"]);
    assert_eq!(ledger.entries()[0].status, TaskStatus::Ongoing);
}
