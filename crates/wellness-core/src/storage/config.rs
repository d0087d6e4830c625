//! TOML-based application configuration.
//!
//! Holds the tunables of the tracker:
//! - Streak lookback window and future-date policy
//! - Leaderboard scoring window
//! - Habit log listing limits
//! - Join code retry budget
//! - Identity token signing secret and lifetime
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use super::data_dir;
use crate::error::ConfigError;
use crate::habit::MAX_WINDOW_DAYS;
use crate::streak::FutureDates;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreakConfig {
    /// Days of history fed into streak computation.
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,
    #[serde(default)]
    pub future_dates: FutureDates,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardConfig {
    /// Trailing window counted toward the consistency score.
    #[serde(default = "default_window_days")]
    pub window_days: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsConfig {
    #[serde(default = "default_log_days")]
    pub default_days: u32,
    #[serde(default = "default_max_days")]
    pub max_days: u32,
    #[serde(default = "default_summary_max_days")]
    pub summary_max_days: u32,
    /// Recent entries shown per habit in the summary.
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupsConfig {
    #[serde(default = "default_join_code_attempts")]
    pub join_code_attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Hex secret for signing identity tokens. Generated on first load.
    #[serde(default)]
    pub signing_secret: String,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: u32,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub streak: StreakConfig,
    #[serde(default)]
    pub leaderboard: LeaderboardConfig,
    #[serde(default)]
    pub logs: LogsConfig,
    #[serde(default)]
    pub groups: GroupsConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

fn default_lookback_days() -> u32 {
    60
}
fn default_window_days() -> u32 {
    7
}
fn default_log_days() -> u32 {
    7
}
fn default_max_days() -> u32 {
    365
}
fn default_summary_max_days() -> u32 {
    30
}
fn default_recent_limit() -> usize {
    5
}
fn default_join_code_attempts() -> u32 {
    5
}
fn default_token_ttl_hours() -> u32 {
    24
}

impl Default for StreakConfig {
    fn default() -> Self {
        Self {
            lookback_days: default_lookback_days(),
            future_dates: FutureDates::default(),
        }
    }
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
        }
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            default_days: default_log_days(),
            max_days: default_max_days(),
            summary_max_days: default_summary_max_days(),
            recent_limit: default_recent_limit(),
        }
    }
}

impl Default for GroupsConfig {
    fn default() -> Self {
        Self {
            join_code_attempts: default_join_code_attempts(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            signing_secret: String::new(),
            token_ttl_hours: default_token_ttl_hours(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            streak: StreakConfig::default(),
            leaderboard: LeaderboardConfig::default(),
            logs: LogsConfig::default(),
            groups: GroupsConfig::default(),
            auth: AuthConfig::default(),
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
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let (parent_path, leaf) = match key.rsplit_once('.') {
            Some((parent, leaf)) => (Some(parent), leaf),
            None => (None, key),
        };
        if leaf.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        if let Some(parent) = parent_path {
            for part in parent.split('.') {
                current = current.get_mut(part).ok_or_else(unknown)?;
            }
        }

        let obj = current.as_object_mut().ok_or_else(unknown)?;
        let existing = obj.get(leaf).ok_or_else(unknown)?;

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
            serde_json::Value::Object(_) => return Err(invalid("cannot set a whole section".into())),
            _ => serde_json::Value::String(value.into()),
        };

        obj.insert(leaf.to_string(), new_value);
        Ok(())
    }

    /// `<data_dir>/config.toml`
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the data directory, creating the file with defaults.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be parsed, or if the
    /// default config cannot be written.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`. A missing file is created with defaults; a missing
    /// signing secret is generated and persisted.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed or written.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut cfg = match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str::<Config>(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "writing default configuration");
                Self::default()
            }
            Err(e) => {
                return Err(ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })
            }
        };

        cfg.validate()?;

        if cfg.ensure_signing_secret() || !path.exists() {
            cfg.save_to(path)?;
        }
        Ok(cfg)
    }

    /// Persist to the data directory.
    ///
    /// # Errors
    /// Returns an error if the config cannot be serialized or written.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// # Errors
    /// Returns an error if the config cannot be serialized or written.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Generate a signing secret if none is set. Returns whether it did.
    pub fn ensure_signing_secret(&mut self) -> bool {
        if !self.auth.signing_secret.trim().is_empty() {
            return false;
        }
        let bytes: [u8; 32] = rand::random();
        self.auth.signing_secret = hex::encode(bytes);
        true
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

    /// Set a config value by dot-separated key, in memory only.
    ///
    /// # Errors
    /// Returns an error if the key is unknown or the value does not fit.
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

    /// Check that every day window lies in `1..=MAX_WINDOW_DAYS` and that the
    /// listing defaults fit under their maximums.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] naming the first bad key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let windows = [
            ("streak.lookback_days", self.streak.lookback_days, MAX_WINDOW_DAYS),
            ("leaderboard.window_days", self.leaderboard.window_days, MAX_WINDOW_DAYS),
            ("logs.max_days", self.logs.max_days, MAX_WINDOW_DAYS),
            ("logs.default_days", self.logs.default_days, self.logs.max_days),
            ("logs.summary_max_days", self.logs.summary_max_days, self.logs.max_days),
        ];
        for (key, days, max) in windows {
            if days == 0 || days > max {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("must be between 1 and {max}, got {days}"),
                });
            }
        }
        Ok(())
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
        assert_eq!(parsed.streak.lookback_days, 60);
        assert_eq!(parsed.leaderboard.window_days, 7);
        assert_eq!(parsed.streak.future_dates, FutureDates::Ignore);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[logs]\nmax_days = 90\n").unwrap();
        assert_eq!(parsed.logs.max_days, 90);
        assert_eq!(parsed.logs.default_days, 7);
        assert_eq!(parsed.groups.join_code_attempts, 5);
        assert_eq!(parsed.auth.token_ttl_hours, 24);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("streak.lookback_days").as_deref(), Some("60"));
        assert_eq!(cfg.get("streak.future_dates").as_deref(), Some("ignore"));
        assert!(cfg.get("streak.missing").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn set_updates_nested_number() {
        let mut cfg = Config::default();
        cfg.set("logs.recent_limit", "10").unwrap();
        assert_eq!(cfg.logs.recent_limit, 10);
    }

    #[test]
    fn set_updates_enum_string() {
        let mut cfg = Config::default();
        cfg.set("streak.future_dates", "include").unwrap();
        assert_eq!(cfg.streak.future_dates, FutureDates::Include);
        assert!(cfg.set("streak.future_dates", "sometimes").is_err());
    }

    #[test]
    fn set_rejects_unknown_key_and_bad_number() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("streak.nonexistent", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            cfg.set("logs.max_days", "lots"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(cfg.set("logs", "1").is_err());
    }

    #[test]
    fn set_rejects_out_of_range_windows() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("streak.lookback_days", "4000000000"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(cfg.set("leaderboard.window_days", "0").is_err());
        assert!(cfg.set("logs.default_days", "400").is_err());
        assert_eq!(cfg.streak.lookback_days, 60);
        assert_eq!(cfg.leaderboard.window_days, 7);

        cfg.set("streak.lookback_days", "3650").unwrap();
        assert_eq!(cfg.streak.lookback_days, 3650);
    }

    #[test]
    fn load_from_rejects_out_of_range_windows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[streak]\nlookback_days = 4000000000\n").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn load_from_creates_file_with_secret() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let first = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(first.auth.signing_secret.len(), 64);

        let second = Config::load_from(&path).unwrap();
        assert_eq!(first.auth.signing_secret, second.auth.signing_secret);
    }

    #[test]
    fn load_from_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "streak = [").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }
}
