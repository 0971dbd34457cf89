//! # Pomotick Core Library
//!
//! Core logic for the pomotick Pomodoro timer. Front ends (the `pomotick`
//! CLI today) are thin layers over this crate.
//!
//! ## Architecture
//!
//! - **Timer**: a synchronous state machine ([`TimerEngine`]) driven one
//!   second at a time by a cancellable tokio countdown ([`Timer`])
//! - **Tasks**: a newest-first history of what each interval was spent on
//!   ([`TaskLedger`])
//! - **Storage**: a SQLite key-value store for timer and task state, and
//!   TOML configuration
//! - **Notifications**: desktop popups on interval completion, best effort
//!
//! [`Session`] wires a timer and a ledger together so that finished focus
//! intervals complete the current task and interrupted ones mark it as
//! such.

pub mod error;
pub mod events;
pub mod logging;
pub mod notify;
pub mod session;
pub mod storage;
pub mod task;
pub mod timer;

pub use error::{ConfigError, CoreError, NotifyError, StorageError, ValidationError};
pub use events::{Event, TimerListener};
pub use notify::Notifier;
pub use session::{Session, Toggle};
pub use storage::{Config, Database, Store};
pub use task::{StatusFilter, TaskEntry, TaskLedger, TaskStatus};
pub use timer::{DurationSettings, Timer, TimerEngine, TimerMode, TimerState};
