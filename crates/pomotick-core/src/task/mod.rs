//! Task history: what the user was working on during each interval.

mod entry;
mod ledger;

pub use entry::{StatusFilter, TaskEntry, TaskStatus};
pub use ledger::{TaskLedger, NO_TASK};
