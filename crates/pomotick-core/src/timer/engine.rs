//! Timer engine implementation.
//!
//! The engine is a synchronous state machine over [`TimerState`]. It does
//! not sleep or spawn; the countdown driver in `countdown.rs` calls
//! [`TimerEngine::begin_second`] and [`TimerEngine::end_second`] once per
//! second while a run is active.
//!
//! ## State Transitions
//!
//! ```text
//!            start                 pause / reset / switch
//! Stopped ─────────────> Running ─────────────────────────> Stopped
//!    ^                      │
//!    └──── completion ──────┘   (mode toggles, count += 1 after focus)
//! ```
//!
//! Every mutation is persisted through the attached [`Store`], except the
//! per-second decrement, which is persisted every ten seconds.

use chrono::Utc;
use tracing::{debug, info, warn};

use super::state::{TimerMode, TimerState};
use crate::events::Event;
use crate::storage::Store;

/// Decrements landing on a multiple of this are persisted.
const PERSIST_EVERY_SECS: u64 = 10;

/// What the countdown should do at the top of a second.
#[derive(Debug, Clone, PartialEq)]
pub enum Second {
    /// Still counting: emit this tick, then sleep.
    Tick(Event),
    /// The run was stopped or superseded. Exit without completing.
    Stopped,
    /// The interval reached zero and the engine has already switched modes.
    Completed(Completion),
}

/// Outcome of a naturally finished interval.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub event: Event,
    pub title: &'static str,
    pub message: &'static str,
}

/// Core timer engine.
#[derive(Debug)]
pub struct TimerEngine {
    state: TimerState,
    /// Incremented on every `start()`. A countdown only acts while its
    /// run id matches, so a stale loop can never touch a newer run.
    run: u64,
    store: Option<Store>,
}

impl TimerEngine {
    /// An engine with no persistence.
    pub fn new(state: TimerState) -> Self {
        Self {
            state: TimerState {
                running: false,
                ..state
            },
            run: 0,
            store: None,
        }
    }

    /// Load state from `store` (falling back to `defaults` per field) and
    /// persist every later mutation there.
    pub fn load(store: Store, defaults: TimerState) -> Self {
        let state = TimerState::load(&store, defaults);
        Self {
            state,
            run: 0,
            store: Some(store),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn mode(&self) -> TimerMode {
        self.state.mode
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.state.remaining_seconds
    }

    pub fn completed_focus_count(&self) -> u64 {
        self.state.completed_focus_count
    }

    /// Id of the current (or most recent) run.
    pub fn run(&self) -> u64 {
        self.run
    }

    pub fn tick_event(&self) -> Event {
        Event::Tick {
            remaining_secs: self.state.remaining_seconds,
            mode: self.state.mode,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Stopped -> Running. Returns false if already running.
    pub fn start(&mut self) -> bool {
        if self.state.running {
            warn!("Attempted to start timer that is already running");
            return false;
        }
        info!("Starting timer in {} mode", self.state.mode);
        self.state.running = true;
        self.run += 1;
        self.persist();
        true
    }

    /// Running -> Stopped. Returns false if already stopped.
    pub fn pause(&mut self) -> bool {
        if !self.state.running {
            warn!("Attempted to pause timer that is not running");
            return false;
        }
        info!(
            "Pausing timer with {} seconds left",
            self.state.remaining_seconds
        );
        self.state.running = false;
        self.persist();
        true
    }

    /// Restore the current mode's full duration. Always succeeds.
    ///
    /// Returns the tick carrying the restored value.
    pub fn reset(&mut self) -> Event {
        self.state.running = false;
        self.state.remaining_seconds = self.state.current_duration();
        info!(
            "Resetting {} timer to {} seconds",
            self.state.mode, self.state.remaining_seconds
        );
        self.persist();
        self.tick_event()
    }

    /// Replace both durations. A stopped timer is also rewound to the new
    /// duration of its mode; a running one keeps counting from where it is.
    pub fn set_duration(&mut self, focus_secs: u64, break_secs: u64) {
        info!("Setting durations: focus={focus_secs}s, break={break_secs}s");
        self.state.focus_duration = focus_secs;
        self.state.break_duration = break_secs;
        if !self.state.running {
            self.state.remaining_seconds = self.state.current_duration();
        }
        self.persist();
    }

    /// Stop, toggle the mode, and load the new mode's full duration.
    pub fn switch_mode(&mut self) -> Event {
        let from = self.state.mode;
        self.state.running = false;
        self.state.mode = from.toggled();
        self.state.remaining_seconds = self.state.current_duration();
        info!("Switched from {from} to {} mode", self.state.mode);
        self.persist();
        self.tick_event()
    }

    /// Top of a countdown second for run `run`.
    pub fn begin_second(&mut self, run: u64) -> Second {
        if !self.state.running || run != self.run {
            return Second::Stopped;
        }
        if self.state.remaining_seconds == 0 {
            return Second::Completed(self.complete());
        }
        Second::Tick(self.tick_event())
    }

    /// Bottom of a countdown second: decrement if run `run` is still
    /// active. Returns false when the countdown should exit.
    pub fn end_second(&mut self, run: u64) -> bool {
        if !self.state.running || run != self.run {
            return false;
        }
        self.state.remaining_seconds = self.state.remaining_seconds.saturating_sub(1);
        if self.state.remaining_seconds % PERSIST_EVERY_SECS == 0 {
            self.persist();
        }
        true
    }

    /// Flush the current state to the store.
    pub fn save(&self) -> bool {
        match &self.store {
            Some(store) => store.save(&self.state.to_map()),
            None => true,
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete(&mut self) -> Completion {
        let completion = match self.state.mode {
            TimerMode::Focus => {
                self.state.completed_focus_count += 1;
                info!("Focus interval #{} completed", self.state.completed_focus_count);
                self.state.mode = TimerMode::Break;
                self.state.remaining_seconds = self.state.break_duration;
                Completion {
                    event: Event::FocusCompleted {
                        count: self.state.completed_focus_count,
                        at: Utc::now(),
                    },
                    title: "Pomodoro Completed! 🎉",
                    message: "Time for a break!",
                }
            }
            TimerMode::Break => {
                info!("Break completed");
                self.state.mode = TimerMode::Focus;
                self.state.remaining_seconds = self.state.focus_duration;
                Completion {
                    event: Event::BreakCompleted { at: Utc::now() },
                    title: "Break Finished!",
                    message: "Ready to focus again?",
                }
            }
        };
        self.state.running = false;
        self.persist();
        completion
    }

    fn persist(&self) {
        if let Some(store) = &self.store {
            debug!("Persisting timer state");
            store.save(&self.state.to_map());
        }
    }
}
