//! Task commands for CLI.

use clap::Subcommand;
use pomotick_core::error::ValidationError;
use pomotick_core::storage::Store;
use pomotick_core::task::{StatusFilter, TaskLedger, TaskStatus};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Set the current task (recorded as ongoing)
    Set {
        /// Task description
        #[arg(required = true, num_args = 1..)]
        description: Vec<String>,
    },
    /// Change the status of the current task
    Mark {
        /// ongoing, completed or interrupted
        status: TaskStatus,
    },
    /// List task history, newest first
    List {
        /// all, completed, ongoing or interrupted
        #[arg(long, default_value = "all")]
        filter: StatusFilter,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the current task
    Current,
}

pub fn run(action: TaskAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut ledger = TaskLedger::load(Store::open_default());

    match action {
        TaskAction::Set { description } => {
            let description = description.join(" ");
            if !ledger.set_current_task(&description) {
                return Err(ValidationError::Empty("Task description").into());
            }
            println!("Current task: {}", ledger.current_task());
        }
        TaskAction::Mark { status } => {
            if !ledger.update_current_status(status) {
                return Err(format!(
                    "cannot mark '{}': it is not the latest task in the history",
                    ledger.current_task()
                )
                .into());
            }
            println!("{} ({status})", ledger.current_task());
        }
        TaskAction::List { filter, json } => {
            let entries = ledger.filtered(filter);
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else if entries.is_empty() {
                println!("No tasks");
            } else {
                for entry in entries {
                    println!("{entry}");
                }
            }
        }
        TaskAction::Current => println!("{}", ledger.current_task()),
    }
    Ok(())
}
