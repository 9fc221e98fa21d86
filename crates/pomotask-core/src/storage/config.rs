//! TOML-based application configuration.
//!
//! Stores:
//! - Default phase durations for new tasks
//! - Cycle settings (work phases before a long break)
//! - Project file location and default project name
//! - Log level
//!
//! Configuration is stored at `~/.config/pomotask/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::task::{
    Durations, DEFAULT_LONG_BREAK_MINUTES, DEFAULT_SHORT_BREAK_MINUTES, DEFAULT_WORK_MINUTES,
};
use crate::timer::DEFAULT_LONG_BREAK_AFTER;

/// Durations given to newly created tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationsConfig {
    #[serde(default = "default_work")]
    pub work: u32,
    #[serde(default = "default_short_break")]
    pub short_break: u32,
    #[serde(default = "default_long_break")]
    pub long_break: u32,
}

/// Work/break cycle settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleConfig {
    #[serde(default = "default_long_break_after")]
    pub long_break_after: u32,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/pomotask/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub durations: DurationsConfig,
    #[serde(default)]
    pub cycle: CycleConfig,
    /// Project file override. Defaults to `project.json` in the data directory.
    #[serde(default)]
    pub project_file: Option<PathBuf>,
    #[serde(default = "default_project_name")]
    pub default_project_name: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// Default functions
fn default_work() -> u32 {
    DEFAULT_WORK_MINUTES
}
fn default_short_break() -> u32 {
    DEFAULT_SHORT_BREAK_MINUTES
}
fn default_long_break() -> u32 {
    DEFAULT_LONG_BREAK_MINUTES
}
fn default_long_break_after() -> u32 {
    DEFAULT_LONG_BREAK_AFTER
}
fn default_project_name() -> String {
    "My Project".into()
}
fn default_log_level() -> String {
    "info".into()
}

impl Default for DurationsConfig {
    fn default() -> Self {
        Self {
            work: default_work(),
            short_break: default_short_break(),
            long_break: default_long_break(),
        }
    }
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            long_break_after: default_long_break_after(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            durations: DurationsConfig::default(),
            cycle: CycleConfig::default(),
            project_file: None,
            default_project_name: default_project_name(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(ConfigError::UnknownKey(key.to_string()));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as a whole number")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        return Err(invalid("cannot set a whole section".into()));
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        }

        Err(ConfigError::UnknownKey(key.to_string()))
    }

    /// Default location of the config file.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults there if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            let cfg = Self::default();
            cfg.save_to(&path)?;
            Ok(cfg)
        }
    }

    /// Load from `path`, returning defaults if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or holds
    /// invalid values.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let load_failed = |message: String| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(load_failed(e.to_string())),
        };
        let cfg: Config = toml::from_str(&content).map_err(|e| load_failed(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Check every value is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.default_durations()?;
        if self.cycle.long_break_after == 0 {
            return Err(ConfigError::InvalidValue {
                key: "cycle.long_break_after".into(),
                message: "must be at least 1".into(),
            });
        }
        if self.default_project_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "default_project_name".into(),
                message: "must not be empty".into(),
            });
        }
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => Some(String::new()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key. The change is validated but not saved.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value is invalid. The
    /// config is unchanged on error.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Durations for new tasks.
    pub fn default_durations(&self) -> Result<Durations, ConfigError> {
        Durations::new(
            self.durations.work,
            self.durations.short_break,
            self.durations.long_break,
        )
        .map_err(|e| ConfigError::InvalidValue {
            key: "durations".into(),
            message: e.to_string(),
        })
    }

    /// Where the project file lives.
    pub fn project_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.project_file {
            Some(path) => Ok(path.clone()),
            None => Ok(data_dir()?.join("project.json")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn config_default_values() {
        let cfg = Config::default();
        assert_eq!(cfg.durations.work, 25);
        assert_eq!(cfg.durations.short_break, 5);
        assert_eq!(cfg.durations.long_break, 15);
        assert_eq!(cfg.cycle.long_break_after, 3);
        assert_eq!(cfg.log_level, "info");
        assert!(cfg.project_file.is_none());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let cfg: Config = toml::from_str("[durations]\nwork = 50\n").unwrap();
        assert_eq!(cfg.durations.work, 50);
        assert_eq!(cfg.durations.short_break, 5);
        assert_eq!(cfg.cycle.long_break_after, 3);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("durations.work").as_deref(), Some("25"));
        assert_eq!(cfg.get("log_level").as_deref(), Some("info"));
        assert!(cfg.get("durations.missing_key").is_none());
    }

    #[test]
    fn set_updates_number() {
        let mut cfg = Config::default();
        cfg.set("cycle.long_break_after", "4").unwrap();
        assert_eq!(cfg.cycle.long_break_after, 4);
    }

    #[test]
    fn set_updates_optional_path() {
        let mut cfg = Config::default();
        cfg.set("project_file", "/tmp/p.json").unwrap();
        assert_eq!(cfg.project_file, Some(PathBuf::from("/tmp/p.json")));
        assert_eq!(cfg.project_path().unwrap(), PathBuf::from("/tmp/p.json"));
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("durations.nonexistent", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn set_rejects_invalid_values_without_change() {
        let mut cfg = Config::default();
        assert!(cfg.set("durations.work", "-5").is_err());
        assert!(cfg.set("durations.work", "0").is_err());
        assert!(cfg.set("cycle.long_break_after", "0").is_err());
        assert!(cfg.set("durations", "1").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn save_and_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut cfg = Config::default();
        cfg.set("durations.long_break", "20").unwrap();
        cfg.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), cfg);
    }

    #[test]
    fn load_from_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn load_from_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "durations = [").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }
}
