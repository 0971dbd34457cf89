mod config;
pub mod database;
pub mod store;

pub use config::{Config, LoggingConfig, NotificationsConfig, TimerConfig};
pub use database::Database;
pub use store::{keys, KvBackend, MemoryBackend, StateMap, Store};

use std::path::PathBuf;

use crate::error::StorageError;

/// Returns the per-user data directory, creating it if needed.
///
/// Resolution order:
/// 1. `POMOTICK_DATA_DIR` if set
/// 2. `~/.config/pomotick-dev/` when `POMOTICK_ENV=dev`
/// 3. `~/.config/pomotick/`
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dir = match std::env::var_os("POMOTICK_DATA_DIR") {
        Some(custom) => PathBuf::from(custom),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("POMOTICK_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("pomotick-dev")
            } else {
                base_dir.join("pomotick")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
