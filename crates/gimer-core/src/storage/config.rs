//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Default timer description
//! - Countdown tick interval
//! - Alarm ceiling, poll interval and output selection
//! - Corrupt-state repair policy
//!
//! Configuration is stored at `~/.config/gimer/config.toml`.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;
use crate::timer::DEFAULT_DESCRIPTION;

/// Countdown configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountdownConfig {
    #[serde(default = "default_interval_ms")]
    pub tick_interval_ms: u64,
}

/// Alarm configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmConfig {
    /// Ceiling after which an unattended alarm disengages itself.
    #[serde(default = "default_max_alarm_secs")]
    pub max_duration_secs: u64,
    #[serde(default = "default_interval_ms")]
    pub poll_interval_ms: u64,
    /// Ring the terminal bell while alarming.
    #[serde(default = "default_true")]
    pub bell: bool,
    /// External player command, replayed while alarming
    /// (e.g. `paplay /usr/share/sounds/freedesktop/stereo/alarm-clock-elapsed.oga`).
    #[serde(default)]
    pub command: Option<String>,
}

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_true")]
    pub repair_corrupt_state: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/gimer/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_description")]
    pub default_description: String,
    #[serde(default)]
    pub countdown: CountdownConfig,
    #[serde(default)]
    pub alarm: AlarmConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

fn default_description() -> String {
    DEFAULT_DESCRIPTION.into()
}
fn default_interval_ms() -> u64 {
    1000
}
fn default_max_alarm_secs() -> u64 {
    5 * 60
}
fn default_true() -> bool {
    true
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_interval_ms(),
        }
    }
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            max_duration_secs: default_max_alarm_secs(),
            poll_interval_ms: default_interval_ms(),
            bell: true,
            command: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            repair_corrupt_state: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_description: default_description(),
            countdown: CountdownConfig::default(),
            alarm: AlarmConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl CountdownConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

impl AlarmConfig {
    pub fn max_duration(&self) -> Duration {
        Duration::from_secs(self.max_duration_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
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
        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current
                    .get_mut(part)
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
                continue;
            }

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
                serde_json::Value::Number(_) => serde_json::Value::Number(
                    value
                        .parse::<u64>()
                        .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?
                        .into(),
                ),
                // Optional fields serialize as null when unset; an empty value
                // unsets them.
                serde_json::Value::Null | serde_json::Value::String(_) if value.is_empty() => {
                    serde_json::Value::Null
                }
                serde_json::Value::Null | serde_json::Value::String(_) => {
                    serde_json::Value::String(value.into())
                }
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    return Err(invalid("cannot set a whole section".into()));
                }
            };

            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(ConfigError::UnknownKey(key.to_string()))
    }

    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("config.toml"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk or write and return the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.clone(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(&path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Every leaf setting as `(dot.path, value)`, sorted by path.
    pub fn entries(&self) -> Vec<(String, String)> {
        fn walk(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
            match value {
                serde_json::Value::Object(map) => {
                    for (key, child) in map {
                        let path = if prefix.is_empty() {
                            key.clone()
                        } else {
                            format!("{prefix}.{key}")
                        };
                        walk(&path, child, out);
                    }
                }
                serde_json::Value::String(s) => out.push((prefix.to_string(), s.clone())),
                other => out.push((prefix.to_string(), other.to_string())),
            }
        }

        let mut out = Vec::new();
        if let Ok(json) = serde_json::to_value(self) {
            walk("", &json, &mut out);
        }
        out
    }

    /// Set a config value by key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        Ok(())
    }

    /// Set a config value by key and save.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
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
    fn missing_sections_take_defaults() {
        let parsed: Config = toml::from_str("[alarm]\nmax_duration_secs = 10\n").unwrap();
        assert_eq!(parsed.alarm.max_duration_secs, 10);
        assert_eq!(parsed.alarm.poll_interval_ms, 1000);
        assert!(parsed.alarm.bell);
        assert_eq!(parsed.default_description, "Timer");
        assert_eq!(parsed.countdown.tick_interval_ms, 1000);
    }

    #[test]
    fn config_default_values() {
        let cfg = Config::default();
        assert_eq!(cfg.alarm.max_duration(), Duration::from_secs(300));
        assert_eq!(cfg.alarm.poll_interval(), Duration::from_secs(1));
        assert_eq!(cfg.countdown.tick_interval(), Duration::from_secs(1));
        assert!(cfg.alarm.command.is_none());
        assert!(cfg.storage.repair_corrupt_state);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("alarm.bell").as_deref(), Some("true"));
        assert_eq!(cfg.get("alarm.max_duration_secs").as_deref(), Some("300"));
        assert_eq!(cfg.get("default_description").as_deref(), Some("Timer"));
        assert!(cfg.get("alarm.missing_key").is_none());
    }

    #[test]
    fn apply_updates_nested_values() {
        let mut cfg = Config::default();
        cfg.apply("alarm.bell", "false").unwrap();
        cfg.apply("alarm.max_duration_secs", "42").unwrap();
        cfg.apply("alarm.command", "paplay bell.oga").unwrap();
        assert!(!cfg.alarm.bell);
        assert_eq!(cfg.alarm.max_duration_secs, 42);
        assert_eq!(cfg.alarm.command.as_deref(), Some("paplay bell.oga"));
    }

    #[test]
    fn apply_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.apply("alarm.nonexistent", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn apply_rejects_invalid_type() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.apply("alarm.bell", "loud"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            cfg.apply("alarm", "x"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn empty_value_unsets_optional_field() {
        let mut cfg = Config::default();
        cfg.apply("alarm.command", "paplay bell.oga").unwrap();
        cfg.apply("alarm.command", "").unwrap();
        assert!(cfg.alarm.command.is_none());
        assert_eq!(cfg.get("alarm.command").as_deref(), Some("null"));
    }

    #[test]
    fn empty_value_rejected_for_required_field() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.apply("default_description", ""),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert_eq!(cfg.default_description, "Timer");
    }

    #[test]
    fn entries_flatten_to_dot_paths() {
        let entries = Config::default().entries();
        assert!(entries.contains(&("alarm.bell".to_string(), "true".to_string())));
        assert!(entries.contains(&("alarm.command".to_string(), "null".to_string())));
        assert!(entries.contains(&("default_description".to_string(), "Timer".to_string())));
        assert!(entries.contains(&("storage.repair_corrupt_state".to_string(), "true".to_string())));
        for (key, value) in &entries {
            assert_eq!(Config::default().get(key).as_ref(), Some(value));
        }
    }

    #[test]
    fn zero_intervals_are_clamped() {
        let mut cfg = Config::default();
        cfg.countdown.tick_interval_ms = 0;
        assert_eq!(cfg.countdown.tick_interval(), Duration::from_millis(1));
    }
}
