//! Ordered task history with a single mutable head.

use chrono::Local;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::entry::{StatusFilter, TaskEntry, TaskStatus};
use crate::storage::{keys, store, StateMap, Store};

/// Placeholder shown while no task has been set.
pub const NO_TASK: &str = "No task set";

/// Task history, newest first, plus the current task text.
///
/// Only the head entry ever changes status, and only while its text
/// still matches the current task. At most one entry is `Ongoing`, and
/// when there is one it is the head.
#[derive(Debug)]
pub struct TaskLedger {
    entries: Vec<TaskEntry>,
    current_task: String,
    store: Option<Store>,
}

impl Default for TaskLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskLedger {
    /// An empty ledger with no persistence.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            current_task: NO_TASK.to_string(),
            store: None,
        }
    }

    /// Load from `store` and persist every later mutation there.
    pub fn load(store: Store) -> Self {
        let mut defaults = StateMap::new();
        defaults.insert(keys::TASK_HISTORY.into(), json!([]));
        defaults.insert(keys::CURRENT_TASK.into(), json!(NO_TASK));
        let loaded = store.load(defaults);

        let rows: Vec<Value> = store::field(&loaded, keys::TASK_HISTORY, Vec::new());
        let mut entries = decode_rows(rows);
        normalize(&mut entries);
        let current_task = store::field(&loaded, keys::CURRENT_TASK, NO_TASK.to_string());
        info!("Loaded {} tasks from storage", entries.len());

        Self {
            entries,
            current_task,
            store: Some(store),
        }
    }

    pub fn current_task(&self) -> &str {
        &self.current_task
    }

    pub fn has_current_task(&self) -> bool {
        self.current_task != NO_TASK
    }

    /// All entries, newest first.
    pub fn entries(&self) -> &[TaskEntry] {
        &self.entries
    }

    pub fn head(&self) -> Option<&TaskEntry> {
        self.entries.first()
    }

    /// Entries whose status passes `filter`, newest first.
    pub fn filtered(&self, filter: StatusFilter) -> Vec<&TaskEntry> {
        self.entries
            .iter()
            .filter(|entry| filter.matches(entry.status))
            .collect()
    }

    /// Make `description` the current task and log it as a new `Ongoing`
    /// entry. Returns false (and changes nothing) for blank text.
    pub fn set_current_task(&mut self, description: &str) -> bool {
        let now = Local::now().format("%H:%M").to_string();
        self.set_current_task_at(description, now)
    }

    fn set_current_task_at(&mut self, description: &str, time: String) -> bool {
        let description = description.trim();
        if description.is_empty() {
            warn!("Attempted to set empty task");
            return false;
        }

        if let Some(head) = self.entries.first_mut() {
            if head.status == TaskStatus::Ongoing {
                debug!("Superseding ongoing task '{}'", head.description);
                head.status = TaskStatus::Interrupted;
            }
        }

        info!("Setting new task: '{description}'");
        self.current_task = description.to_string();
        self.entries.insert(
            0,
            TaskEntry {
                time,
                description: self.current_task.clone(),
                status: TaskStatus::Ongoing,
            },
        );
        self.persist();
        true
    }

    /// Set the head entry's status. No-op (returns false) when the ledger
    /// is empty or the head no longer belongs to the current task.
    pub fn update_current_status(&mut self, status: TaskStatus) -> bool {
        let current = &self.current_task;
        let Some(head) = self.entries.first_mut() else {
            warn!("Attempted to update task status to '{status}' but history is empty");
            return false;
        };
        if head.description != *current {
            warn!("Task '{current}' not found at top of history");
            return false;
        }

        info!("Updating task '{current}' status to '{status}'");
        head.status = status;
        self.persist();
        true
    }

    /// Mark the head `Interrupted` if it is the current, still `Ongoing`
    /// task.
    pub fn interrupt_current(&mut self) -> bool {
        let ongoing = self
            .head()
            .map_or(false, |head| head.status == TaskStatus::Ongoing);
        ongoing && self.update_current_status(TaskStatus::Interrupted)
    }

    /// Flush to the store.
    pub fn save(&self) -> bool {
        match &self.store {
            Some(store) => store.save(&self.to_map()),
            None => true,
        }
    }

    fn to_map(&self) -> StateMap {
        let mut map = StateMap::new();
        map.insert(keys::TASK_HISTORY.into(), json!(self.entries));
        map.insert(keys::CURRENT_TASK.into(), json!(self.current_task));
        map
    }

    fn persist(&self) {
        if self.store.is_some() {
            self.save();
        }
    }
}

/// Decode history rows one at a time; a malformed row is dropped without
/// taking its neighbours with it.
fn decode_rows(rows: Vec<Value>) -> Vec<TaskEntry> {
    rows.into_iter()
        .enumerate()
        .filter_map(|(index, row)| match serde_json::from_value(row) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable task history row {index}: {e}");
                None
            }
        })
        .collect()
}

/// Only the head may be `Ongoing`; older ongoing rows were abandoned.
fn normalize(entries: &mut [TaskEntry]) {
    for entry in entries.iter_mut().skip(1) {
        if entry.status == TaskStatus::Ongoing {
            warn!("Marking stale ongoing task '{}' as interrupted", entry.description);
            entry.status = TaskStatus::Interrupted;
        }
    }
}
