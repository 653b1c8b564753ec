//! File-backed client configuration.
//!
//! Stores `server_url` and `token` as a JSON file in the platform data
//! directory (e.g. `~/.local/share/screen-capture/config.json`).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const APP_DIR_NAME: &str = "screen-capture";
const CONFIG_FILE: &str = "config.json";
const PENDING_DIR: &str = "pending";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine app data directory")]
    NoDataDir,

    #[error("failed to {action} config: {message}")]
    Io { action: &'static str, message: String },

    #[error("failed to parse config: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub server_url: String,
    pub token: String,
}

impl AppConfig {
    /// Both the server and the credential are set.
    pub fn is_complete(&self) -> bool {
        !self.server_url.is_empty() && !self.token.is_empty()
    }
}

fn app_dir() -> Result<PathBuf, ConfigError> {
    let data_dir = dirs::data_dir().ok_or(ConfigError::NoDataDir)?;
    Ok(data_dir.join(APP_DIR_NAME))
}

pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(app_dir()?.join(CONFIG_FILE))
}

/// Directory of the pending-recording store.
pub fn pending_dir() -> Result<PathBuf, ConfigError> {
    Ok(app_dir()?.join(PENDING_DIR))
}

pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&config_path()?)
}

pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    save_config_to(config, &config_path()?)
}

pub fn has_config() -> bool {
    load_config().map(|c| c.is_complete()).unwrap_or(false)
}

pub fn clear_config() -> Result<(), ConfigError> {
    clear_config_at(&config_path()?)
}

/// Returns the default (empty) config if the file does not exist.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
        action: "read",
        message: e.to_string(),
    })?;
    serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
}

/// Creates the parent directory if needed.
pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
            action: "create directory for",
            message: e.to_string(),
        })?;
    }
    let content = serde_json::to_string_pretty(config).map_err(|e| ConfigError::Parse(e.to_string()))?;
    fs::write(path, content).map_err(|e| ConfigError::Io {
        action: "write",
        message: e.to_string(),
    })?;
    log::debug!("Saved config to {}", path.display());
    Ok(())
}

pub fn clear_config_at(path: &Path) -> Result<(), ConfigError> {
    if path.exists() {
        fs::remove_file(path).map_err(|e| ConfigError::Io {
            action: "delete",
            message: e.to_string(),
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join(CONFIG_FILE);

        let config = load_config_from(&path).unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(!config.is_complete());

        let saved = AppConfig {
            server_url: "https://recorder.example.com".into(),
            token: "tok_abc123".into(),
        };
        save_config_to(&saved, &path).unwrap();
        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded, saved);
        assert!(loaded.is_complete());

        clear_config_at(&path).unwrap();
        assert_eq!(load_config_from(&path).unwrap(), AppConfig::default());
        clear_config_at(&path).unwrap();
    }

    #[test]
    fn malformed_config_is_parse_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(CONFIG_FILE);
        fs::write(&path, "server_url=").unwrap();

        assert!(matches!(load_config_from(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn serializes_snake_case_fields() {
        let config = AppConfig {
            server_url: "https://recorder.example.com".into(),
            token: "tok".into(),
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("server_url"));
        assert!(json.contains("token"));
    }
}
