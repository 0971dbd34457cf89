use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::TimerMode;

/// Notifications the timer sends to its listeners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Emitted once per countdown second, and after reset or mode switch
    /// with the restored value.
    Tick {
        remaining_secs: u64,
        mode: TimerMode,
    },
    /// A focus interval ran to zero. `count` is the new completed total.
    FocusCompleted {
        count: u64,
        at: DateTime<Utc>,
    },
    /// A break interval ran to zero.
    BreakCompleted {
        at: DateTime<Utc>,
    },
}

/// Receives timer events.
///
/// Override `on_event` to see everything, or the per-event hooks for the
/// ones you care about. Any `Fn(&Event)` closure is a listener too.
///
/// Listeners run on the countdown task; they must not block.
pub trait TimerListener: Send + Sync {
    fn on_tick(&self, _remaining_secs: u64, _mode: TimerMode) {}

    fn on_focus_complete(&self, _count: u64) {}

    fn on_break_complete(&self) {}

    fn on_event(&self, event: &Event) {
        match *event {
            Event::Tick {
                remaining_secs,
                mode,
            } => self.on_tick(remaining_secs, mode),
            Event::FocusCompleted { count, .. } => self.on_focus_complete(count),
            Event::BreakCompleted { .. } => self.on_break_complete(),
        }
    }
}

impl<F> TimerListener for F
where
    F: Fn(&Event) + Send + Sync,
{
    fn on_event(&self, event: &Event) {
        self(event)
    }
}

/// Registered listeners, shared between a timer handle and its countdown.
#[derive(Default)]
pub(crate) struct Listeners {
    inner: RwLock<Vec<Arc<dyn TimerListener>>>,
}

impl Listeners {
    pub(crate) fn add(&self, listener: Arc<dyn TimerListener>) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    /// Deliver `event` to every listener. The registry lock is released
    /// before any listener runs.
    pub(crate) fn emit(&self, event: &Event) {
        let listeners = self
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in listeners {
            listener.on_event(event);
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}
