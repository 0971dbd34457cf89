use clap::Subcommand;
use pomotick_core::storage::{Config, Store};
use pomotick_core::timer::{DurationSettings, TimerState};
use pomotick_core::Session;
use serde_json::json;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Print the saved timer state as JSON
    Status,
    /// Restore the full duration of the current mode
    Reset,
    /// Switch between focus and break
    Switch,
    /// Change interval lengths, in minutes
    Duration {
        /// Focus length (1-60)
        #[arg(long)]
        focus: u32,
        /// Break length (1-30)
        #[arg(long = "break")]
        brk: u32,
    },
}

fn status_json(state: &TimerState) -> serde_json::Value {
    json!({
        "mode": state.mode,
        "remaining_seconds": state.remaining_seconds,
        "clock": state.clock(),
        "focus_duration": state.focus_duration,
        "break_duration": state.break_duration,
        "completed_focus_count": state.completed_focus_count,
    })
}

pub async fn run(action: TimerAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::open(Store::open_default(), config);

    match action {
        TimerAction::Status => {}
        TimerAction::Reset => session.reset().await,
        TimerAction::Switch => session.switch_mode().await,
        TimerAction::Duration { focus, brk } => {
            session.apply_settings(DurationSettings::new(focus, brk))?;
        }
    }

    println!("{}", serde_json::to_string_pretty(&status_json(&session.snapshot()))?);
    session.shutdown().await;
    Ok(())
}
