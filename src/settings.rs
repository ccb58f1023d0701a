use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::api::DEFAULT_API_BASE;
use crate::error::SettingsError;
use crate::query::SearchQuery;

pub const API_KEY_ENV: &str = "WALLHAVEN_API_KEY";

const APP_DIR: &str = "wallhaven-client";
const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub api_base: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_dir: Option<PathBuf>,
    pub default_query: SearchQuery,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            save_dir: None,
            default_query: SearchQuery::default(),
        }
    }
}

impl AppSettings {
    /// The key to send: a non-empty `WALLHAVEN_API_KEY` wins over the stored one.
    pub fn effective_api_key(&self) -> Option<String> {
        Self::pick_api_key(std::env::var(API_KEY_ENV).ok(), self.api_key.clone())
    }

    fn pick_api_key(from_env: Option<String>, stored: Option<String>) -> Option<String> {
        from_env
            .filter(|k| !k.is_empty())
            .or_else(|| stored.filter(|k| !k.is_empty()))
    }

    /// Where downloads go when no directory is given explicitly.
    pub fn resolved_save_dir(&self) -> PathBuf {
        self.save_dir
            .clone()
            .or_else(|| dirs::picture_dir().map(|d| d.join("Wallhaven")))
            .or_else(|| dirs::home_dir().map(|d| d.join("Wallhaven")))
            .unwrap_or_else(|| PathBuf::from("wallhaven"))
    }
}

pub fn default_settings_path() -> Result<PathBuf, SettingsError> {
    dirs::config_dir()
        .map(|d| d.join(APP_DIR).join(SETTINGS_FILE))
        .ok_or(SettingsError::NoConfigDir)
}

/// Read settings from `path`. A missing file yields the defaults; an
/// unreadable or malformed one is an error so it is not silently overwritten.
pub fn load_settings(path: &Path) -> Result<AppSettings, SettingsError> {
    if !path.exists() {
        log::debug!("no settings at {}, using defaults", path.display());
        return Ok(AppSettings::default());
    }

    let content = fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}

pub fn save_settings(path: &Path, settings: &AppSettings) -> Result<(), SettingsError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| SettingsError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let json = serde_json::to_string_pretty(settings)?;
    fs::write(path, json).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("settings saved to {}", path.display());
    Ok(())
}
