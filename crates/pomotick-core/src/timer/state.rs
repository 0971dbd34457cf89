use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::storage::{keys, store, StateMap, Store};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    #[serde(alias = "pomodoro")]
    Focus,
    Break,
}

impl TimerMode {
    pub fn toggled(self) -> Self {
        match self {
            TimerMode::Focus => TimerMode::Break,
            TimerMode::Break => TimerMode::Focus,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimerMode::Focus => "Focus",
            TimerMode::Break => "Break",
        }
    }
}

impl fmt::Display for TimerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TimerMode::Focus => "focus",
            TimerMode::Break => "break",
        })
    }
}

/// Everything the timer knows about itself.
///
/// `running` is never persisted: a timer loaded from storage is always
/// stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub mode: TimerMode,
    /// Focus length in seconds.
    pub focus_duration: u64,
    /// Break length in seconds.
    pub break_duration: u64,
    pub remaining_seconds: u64,
    #[serde(skip)]
    pub running: bool,
    pub completed_focus_count: u64,
}

impl TimerState {
    /// A stopped focus interval with the full focus duration remaining.
    pub fn new(focus_duration: u64, break_duration: u64) -> Self {
        Self {
            mode: TimerMode::Focus,
            focus_duration,
            break_duration,
            remaining_seconds: focus_duration,
            running: false,
            completed_focus_count: 0,
        }
    }

    pub fn duration_of(&self, mode: TimerMode) -> u64 {
        match mode {
            TimerMode::Focus => self.focus_duration,
            TimerMode::Break => self.break_duration,
        }
    }

    pub fn current_duration(&self) -> u64 {
        self.duration_of(self.mode)
    }

    /// True once at least one second of a focus interval has elapsed.
    /// A task running in such an interval counts as interrupted when the
    /// interval is cut short.
    pub fn focus_in_progress(&self) -> bool {
        self.mode == TimerMode::Focus && self.remaining_seconds < self.focus_duration
    }

    /// `MM:SS` rendering of the remaining time.
    pub fn clock(&self) -> String {
        format!(
            "{:02}:{:02}",
            self.remaining_seconds / 60,
            self.remaining_seconds % 60
        )
    }

    pub fn to_map(&self) -> StateMap {
        let mut map = StateMap::new();
        map.insert(keys::FOCUS_DURATION.into(), json!(self.focus_duration));
        map.insert(keys::BREAK_DURATION.into(), json!(self.break_duration));
        map.insert(keys::REMAINING_SECONDS.into(), json!(self.remaining_seconds));
        map.insert(keys::MODE.into(), json!(self.mode));
        map.insert(
            keys::COMPLETED_FOCUS_COUNT.into(),
            json!(self.completed_focus_count),
        );
        map
    }

    /// Rebuild a stopped state from a loaded map, using `defaults` for
    /// anything missing or unusable.
    pub fn from_map(map: &StateMap, defaults: &TimerState) -> Self {
        let positive = |key: &str, default: u64| match store::field(map, key, default) {
            0 => {
                warn!("Stored {key} is zero, using {default}");
                default
            }
            v => v,
        };

        let focus_duration = positive(keys::FOCUS_DURATION, defaults.focus_duration);
        let break_duration = positive(keys::BREAK_DURATION, defaults.break_duration);
        let mode = store::field(map, keys::MODE, defaults.mode);
        let mut state = Self {
            mode,
            focus_duration,
            break_duration,
            remaining_seconds: 0,
            running: false,
            completed_focus_count: store::field(
                map,
                keys::COMPLETED_FOCUS_COUNT,
                defaults.completed_focus_count,
            ),
        };

        let duration = state.current_duration();
        let remaining = store::field(map, keys::REMAINING_SECONDS, duration);
        if remaining > duration {
            warn!("Stored remaining time {remaining}s exceeds {duration}s, clamping");
        }
        state.remaining_seconds = remaining.min(duration);
        state
    }

    /// Load from `store`, overlaying stored fields onto `defaults`.
    pub fn load(store: &Store, defaults: TimerState) -> Self {
        let loaded = store.load(defaults.to_map());
        let state = Self::from_map(&loaded, &defaults);
        info!(
            "Loaded timer state: mode={}, time_left={}",
            state.mode, state.remaining_seconds
        );
        state
    }
}

impl Default for TimerState {
    fn default() -> Self {
        Self::new(25 * 60, 5 * 60)
    }
}
