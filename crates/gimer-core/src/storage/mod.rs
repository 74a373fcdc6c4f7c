mod config;
pub mod provider;
pub mod store;

pub use config::{AlarmConfig, Config, CountdownConfig, StorageConfig};
pub use provider::{JsonFileProvider, MemoryProvider, PersistenceProvider};
pub use store::{ActiveStore, SavedStore, TimerIndex, TimerStore};

use std::path::PathBuf;

use crate::error::StoreError;

pub const ACTIVE_TIMERS_FILE: &str = "active_timers.json";
pub const SAVED_TIMERS_FILE: &str = "saved_timers.json";

/// Returns `~/.config/gimer[-dev]/` based on GIMER_ENV.
///
/// Set GIMER_ENV=dev to use development data directory. GIMER_DATA_DIR
/// overrides the location entirely.
///
/// # Errors
/// Returns an error if the home directory cannot be determined or if
/// creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StoreError> {
    let dir = match std::env::var_os("GIMER_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .ok_or_else(|| StoreError::DataDir {
                    path: PathBuf::from("~"),
                    message: "cannot resolve home directory".into(),
                })?
                .join(".config");

            let env = std::env::var("GIMER_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("gimer-dev")
            } else {
                base_dir.join("gimer")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| StoreError::DataDir {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}

/// Open the active-timer collection in the data directory.
pub fn open_active(config: &Config) -> Result<ActiveStore<JsonFileProvider>, StoreError> {
    let provider = JsonFileProvider::new(data_dir()?.join(ACTIVE_TIMERS_FILE));
    TimerStore::open(provider, config.storage.repair_corrupt_state)
}

/// Open the saved-timer collection in the data directory.
pub fn open_saved(config: &Config) -> Result<SavedStore<JsonFileProvider>, StoreError> {
    let provider = JsonFileProvider::new(data_dir()?.join(SAVED_TIMERS_FILE));
    TimerStore::open(provider, config.storage.repair_corrupt_state)
}
