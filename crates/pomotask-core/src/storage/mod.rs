mod config;
mod project_file;

pub use config::{Config, CycleConfig, DurationsConfig};
pub use project_file::{from_json, to_json, ProjectStore};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the pomotask data directory, creating it if needed.
///
/// `POMOTASK_HOME` overrides the location outright. Otherwise it is
/// `~/.config/pomotask[-dev]/`, with the `-dev` suffix when
/// `POMOTASK_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("POMOTASK_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("POMOTASK_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("pomotask-dev")
            } else {
                base_dir.join("pomotask")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
