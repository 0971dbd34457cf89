//! A timer and a task ledger wired together.
//!
//! The timer and the ledger know nothing about each other. The session
//! applies the rules that connect them:
//!
//! - a focus interval that runs to zero completes the current task;
//! - a focus interval cut short after at least one second (pause, reset
//!   or mode switch while running) interrupts the current task;
//! - starting a focus interval may require a task to be set first.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{info, warn};

use crate::error::ValidationError;
use crate::events::Event;
use crate::notify;
use crate::storage::{Config, Store};
use crate::task::{TaskLedger, TaskStatus};
use crate::timer::{DurationSettings, Timer, TimerEngine, TimerMode, TimerState};

/// Result of [`Session::start`] / [`Session::toggle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Started,
    Paused,
    /// A focus interval was requested but no task is set.
    NeedsTask,
    /// The timer refused the transition (see the log).
    Unchanged,
}

pub struct Session {
    timer: Arc<Timer>,
    ledger: Arc<Mutex<TaskLedger>>,
    require_task: bool,
}

impl Session {
    pub fn new(timer: Timer, ledger: TaskLedger) -> Self {
        let ledger = Arc::new(Mutex::new(ledger));
        let on_complete = ledger.clone();
        timer.add_listener(move |event: &Event| {
            if let Event::FocusCompleted { .. } = event {
                lock(&on_complete).update_current_status(TaskStatus::Completed);
            }
        });

        Self {
            timer: Arc::new(timer),
            ledger,
            require_task: false,
        }
    }

    /// Load the timer and the ledger from `store`, with timer defaults and
    /// notification settings taken from `config`.
    pub fn open(store: Store, config: &Config) -> Self {
        let defaults = match config.duration_settings().to_seconds() {
            Ok((focus, brk)) => TimerState::new(focus, brk),
            Err(e) => {
                warn!("Ignoring configured durations: {e}");
                TimerState::default()
            }
        };
        let timer = Timer::new(TimerEngine::load(store.clone(), defaults)).with_notifier(
            notify::from_config(&config.notifications),
            config.notifications.timeout_secs,
        );
        Self::new(timer, TaskLedger::load(store)).require_task(config.timer.require_task)
    }

    /// Refuse to start a focus interval while no task is set.
    pub fn require_task(mut self, required: bool) -> Self {
        self.require_task = required;
        self
    }

    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    pub fn snapshot(&self) -> TimerState {
        self.timer.snapshot()
    }

    pub fn ledger(&self) -> MutexGuard<'_, TaskLedger> {
        lock(&self.ledger)
    }

    pub fn set_task(&self, description: &str) -> bool {
        self.ledger().set_current_task(description)
    }

    pub fn start(&self) -> Toggle {
        if self.require_task
            && self.timer.snapshot().mode == TimerMode::Focus
            && !self.ledger().has_current_task()
        {
            info!("No task set, asking for one before starting");
            return Toggle::NeedsTask;
        }
        if self.timer.start() {
            Toggle::Started
        } else {
            Toggle::Unchanged
        }
    }

    /// Pause, interrupting the current task if focus time was spent on it.
    pub fn pause(&self) -> bool {
        if !self.timer.pause() {
            return false;
        }
        let state = self.timer.snapshot();
        if state.focus_in_progress() {
            self.ledger().interrupt_current();
        }
        true
    }

    /// Start when stopped, pause when running.
    pub fn toggle(&self) -> Toggle {
        if self.timer.is_running() {
            if self.pause() {
                Toggle::Paused
            } else {
                Toggle::Unchanged
            }
        } else {
            self.start()
        }
    }

    pub async fn reset(&self) {
        self.interrupt_if_running();
        self.timer.reset().await;
    }

    pub async fn switch_mode(&self) {
        self.interrupt_if_running();
        self.timer.switch_mode().await;
    }

    /// Validate minute settings and apply them to the timer.
    pub fn apply_settings(&self, settings: DurationSettings) -> Result<(), ValidationError> {
        let (focus, brk) = settings.to_seconds()?;
        self.timer.set_duration(focus, brk);
        Ok(())
    }

    /// Stop the countdown and flush both aggregates.
    pub async fn shutdown(&self) {
        info!("Saving application state before exit");
        self.timer.shutdown().await;
        self.ledger().save();
    }

    fn interrupt_if_running(&self) {
        let state = self.timer.snapshot();
        if state.running && state.focus_in_progress() {
            self.ledger().interrupt_current();
        }
    }
}

fn lock(ledger: &Mutex<TaskLedger>) -> MutexGuard<'_, TaskLedger> {
    ledger.lock().unwrap_or_else(PoisonError::into_inner)
}
