//! Runtime configuration.
//!
//! Sources, lowest to highest precedence: built-in defaults, an optional
//! JSON file, then `FLOWBOARD_*` environment variables.

use crate::logging::default_log_level;
use crate::sync::engine::{SyncSettings, DEFAULT_REQUEST_TIMEOUT};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DB_FILE_NAME: &str = "flowboard.sqlite3";
const MIN_REQUEST_TIMEOUT_MS: u64 = 100;
const MAX_REQUEST_TIMEOUT_MS: u64 = 60_000;

pub const ENV_DB_PATH: &str = "FLOWBOARD_DB_PATH";
pub const ENV_SYNC_URL: &str = "FLOWBOARD_SYNC_URL";
pub const ENV_SYNC_TIMEOUT_MS: &str = "FLOWBOARD_SYNC_TIMEOUT_MS";
pub const ENV_PURGE_TOMBSTONES: &str = "FLOWBOARD_PURGE_TOMBSTONES";
pub const ENV_LOG_LEVEL: &str = "FLOWBOARD_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "FLOWBOARD_LOG_DIR";

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: serde_json::Error },
    InvalidValue { key: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "invalid config `{}`: {source}", path.display())
            }
            Self::InvalidValue { key, value } => write!(f, "invalid value `{value}` for {key}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::InvalidValue { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BoardConfig {
    pub db_path: PathBuf,
    /// Base URL of the remote task service. `None` keeps the board local.
    pub sync_url: Option<String>,
    pub request_timeout_ms: u64,
    pub purge_acknowledged_tombstones: bool,
    pub log_level: String,
    /// File logging is enabled only when set.
    pub log_dir: Option<PathBuf>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DB_FILE_NAME),
            sync_url: None,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT.as_millis() as u64,
            purge_acknowledged_tombstones: true,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl BoardConfig {
    /// Loads defaults, then `file` when given, then process environment.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match file {
            Some(path) => Self::from_json_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overrides fields from `lookup`. Blank values are ignored.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(value) = read(ENV_DB_PATH) {
            self.db_path = PathBuf::from(value);
        }
        if let Some(value) = read(ENV_SYNC_URL) {
            self.sync_url = Some(value);
        }
        if let Some(value) = read(ENV_SYNC_TIMEOUT_MS) {
            self.request_timeout_ms =
                value.parse().map_err(|_| ConfigError::InvalidValue {
                    key: ENV_SYNC_TIMEOUT_MS,
                    value: value.clone(),
                })?;
        }
        if let Some(value) = read(ENV_PURGE_TOMBSTONES) {
            self.purge_acknowledged_tombstones = parse_flag(&value).ok_or_else(|| {
                ConfigError::InvalidValue {
                    key: ENV_PURGE_TOMBSTONES,
                    value: value.clone(),
                }
            })?;
        }
        if let Some(value) = read(ENV_LOG_LEVEL) {
            self.log_level = value;
        }
        if let Some(value) = read(ENV_LOG_DIR) {
            self.log_dir = Some(PathBuf::from(value));
        }
        Ok(())
    }

    /// Per-request timeout, clamped to 100ms..=60s.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(
            self.request_timeout_ms
                .clamp(MIN_REQUEST_TIMEOUT_MS, MAX_REQUEST_TIMEOUT_MS),
        )
    }

    pub fn sync_settings(&self) -> SyncSettings {
        SyncSettings {
            request_timeout: self.request_timeout(),
            purge_acknowledged_tombstones: self.purge_acknowledged_tombstones,
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{BoardConfig, ConfigError, ENV_PURGE_TOMBSTONES, ENV_SYNC_TIMEOUT_MS, ENV_SYNC_URL};
    use std::collections::HashMap;
    use std::time::Duration;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_keep_board_local_with_three_second_timeout() {
        let config = BoardConfig::default();
        assert!(config.sync_url.is_none());
        assert_eq!(config.request_timeout(), Duration::from_secs(3));
        assert!(config.purge_acknowledged_tombstones);
    }

    #[test]
    fn env_overrides_and_ignores_blank_values() {
        let mut config = BoardConfig::default();
        config
            .apply_env(lookup(&[
                (ENV_SYNC_URL, " http://localhost:9000 "),
                (ENV_SYNC_TIMEOUT_MS, "250"),
                (ENV_PURGE_TOMBSTONES, "off"),
                ("FLOWBOARD_DB_PATH", "   "),
            ]))
            .unwrap();

        assert_eq!(config.sync_url.as_deref(), Some("http://localhost:9000"));
        assert_eq!(config.request_timeout(), Duration::from_millis(250));
        assert!(!config.purge_acknowledged_tombstones);
        assert_eq!(config.db_path, BoardConfig::default().db_path);
    }

    #[test]
    fn invalid_env_value_is_rejected() {
        let mut config = BoardConfig::default();
        let err = config
            .apply_env(lookup(&[(ENV_SYNC_TIMEOUT_MS, "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == ENV_SYNC_TIMEOUT_MS));
    }

    #[test]
    fn timeout_is_clamped() {
        let config = BoardConfig {
            request_timeout_ms: 5,
            ..BoardConfig::default()
        };
        assert_eq!(config.request_timeout(), Duration::from_millis(100));
    }

    #[test]
    fn json_file_fills_missing_fields_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flowboard.json");
        std::fs::write(&path, r#"{ "sync_url": "https://board.example.com" }"#).unwrap();

        let config = BoardConfig::from_json_file(&path).unwrap();
        assert_eq!(config.sync_url.as_deref(), Some("https://board.example.com"));
        assert_eq!(config.request_timeout_ms, 3000);

        std::fs::write(&path, r#"{ "sync_endpoint": "x" }"#).unwrap();
        assert!(matches!(
            BoardConfig::from_json_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
