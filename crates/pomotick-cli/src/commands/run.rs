//! Interactive foreground session.
//!
//! Reads one command per line from stdin while the countdown renders on
//! stdout.

use std::io::{BufRead, Write};

use clap::Args;
use pomotick_core::error::ValidationError;
use pomotick_core::events::Event;
use pomotick_core::storage::{Config, Store};
use pomotick_core::task::StatusFilter;
use pomotick_core::{Session, Toggle};
use tokio::sync::mpsc;
use tracing::{debug, info};

const HELP: &str = "commands: s start/pause, r reset, m switch mode, t <text> set task, l history, q quit";
const HISTORY_LINES: usize = 5;

#[derive(Args)]
pub struct RunArgs {
    /// Focus length in minutes (1-60)
    #[arg(long)]
    focus: Option<u32>,
    /// Break length in minutes (1-30)
    #[arg(long = "break")]
    brk: Option<u32>,
    /// Task to start with
    #[arg(long)]
    task: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Toggle,
    Reset,
    Switch,
    Task(&'a str),
    History,
    Quit,
    Help,
    Blank,
}

fn parse_input(line: &str) -> Input<'_> {
    let line = line.trim();
    let (cmd, rest) = line.split_once(' ').unwrap_or((line, ""));
    match cmd {
        "" => Input::Blank,
        "s" => Input::Toggle,
        "r" => Input::Reset,
        "m" => Input::Switch,
        "t" => Input::Task(rest.trim()),
        "l" => Input::History,
        "q" => Input::Quit,
        _ => Input::Help,
    }
}

fn render(event: &Event) {
    let mut out = std::io::stdout().lock();
    let _ = match event {
        Event::Tick {
            remaining_secs,
            mode,
        } => write!(
            out,
            "\r{:<5} {:02}:{:02} ",
            mode.label(),
            remaining_secs / 60,
            remaining_secs % 60
        ),
        Event::FocusCompleted { count, .. } => {
            writeln!(out, "\nFocus interval #{count} done. Time for a break!")
        }
        Event::BreakCompleted { .. } => writeln!(out, "\nBreak finished. Ready to focus again?"),
    };
    let _ = out.flush();
}

/// Lines from stdin, read on a plain thread. A blocking read cannot be
/// cancelled and must not hold up runtime shutdown.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

pub async fn run(args: RunArgs, mut config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let overridden = args.focus.is_some() || args.brk.is_some();
    if let Some(focus) = args.focus {
        config.timer.focus_minutes = focus;
    }
    if let Some(brk) = args.brk {
        config.timer.break_minutes = brk;
    }
    config.duration_settings().validate()?;

    let session = Session::open(Store::open_default(), &config);
    if overridden {
        session.apply_settings(config.duration_settings())?;
    }
    if let Some(task) = args.task.as_deref() {
        if !session.set_task(task) {
            session.shutdown().await;
            return Err(ValidationError::Empty("Task description").into());
        }
    }
    session.timer().add_listener(render);

    let state = session.snapshot();
    println!("Task: {}", session.ledger().current_task());
    println!("{} {} | completed: {}", state.mode.label(), state.clock(), state.completed_focus_count);
    println!("{HELP}");

    let mut lines = spawn_stdin_reader();
    loop {
        let line = tokio::select! {
            line = lines.recv() => line,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                None
            }
        };
        let Some(line) = line else { break };

        match parse_input(&line) {
            Input::Toggle => match session.toggle() {
                Toggle::Started => debug!("Started from prompt"),
                Toggle::Paused => println!("\nPaused at {}", session.snapshot().clock()),
                Toggle::NeedsTask => println!("Set a task first: t <description>"),
                Toggle::Unchanged => {}
            },
            Input::Reset => session.reset().await,
            Input::Switch => session.switch_mode().await,
            Input::Task(text) => {
                if session.set_task(text) {
                    println!("Current task: {}", session.ledger().current_task());
                } else {
                    println!("Task cannot be empty");
                }
            }
            Input::History => {
                let ledger = session.ledger();
                let entries = ledger.filtered(StatusFilter::All);
                if entries.is_empty() {
                    println!("No tasks");
                }
                for entry in entries.into_iter().take(HISTORY_LINES) {
                    println!("{entry}");
                }
            }
            Input::Quit => break,
            Input::Help => println!("{HELP}"),
            Input::Blank => {}
        }
    }

    session.shutdown().await;
    println!();
    Ok(())
}
