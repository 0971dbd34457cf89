//! Tracing subscriber setup shared by every front end.
//!
//! Logs go to stderr and, optionally, to a daily-rotated file. `RUST_LOG`
//! overrides the configured level.

use std::path::{Path, PathBuf};

use tracing::Level;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const LOG_FILE_PREFIX: &str = "pomotick.log";

#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// Force `debug` regardless of `level`.
    pub debug: bool,
    pub level: String,
    /// Directory for the rolling log file. `None` disables file output.
    pub log_dir: Option<PathBuf>,
}

/// Keeps the file writer alive. Dropping it flushes buffered lines.
#[must_use = "dropping the guard stops file logging"]
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

/// Install the global subscriber. A second call keeps the first
/// subscriber and only returns a guard for the new file writer, if any.
pub fn init(options: &LogOptions) -> LogGuard {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(options.debug, &options.level)));

    let (file, guard, file_error) = match options.log_dir.as_deref().map(file_writer) {
        Some(Ok((writer, guard))) => (
            Some(fmt::layer().with_writer(writer).with_ansi(false)),
            Some(guard),
            None,
        ),
        Some(Err(e)) => (None, None, Some(e)),
        None => (None, None, None),
    };

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file)
        .try_init();

    if let Err(e) = installed {
        tracing::debug!("Logging already initialized: {e}");
    }
    if let Some(e) = file_error {
        tracing::warn!("File logging disabled: {e}");
    }

    LogGuard { _file: guard }
}

fn file_writer(dir: &Path) -> std::io::Result<(NonBlocking, WorkerGuard)> {
    std::fs::create_dir_all(dir)?;
    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    Ok(tracing_appender::non_blocking(appender))
}

/// Default filter for our own crates. Unknown level names fall back to
/// `info`.
fn filter_directive(debug: bool, level: &str) -> String {
    let level = if debug {
        Level::DEBUG
    } else {
        level.trim().parse::<Level>().unwrap_or(Level::INFO)
    };
    let level = level.as_str().to_ascii_lowercase();
    format!("pomotick={level},pomotick_core={level}")
}
