mod countdown;
mod engine;
mod settings;
mod state;

pub use countdown::Timer;
pub use engine::{Completion, Second, TimerEngine};
pub use settings::{DurationSettings, BREAK_MINUTES, FOCUS_MINUTES};
pub use state::{TimerMode, TimerState};
