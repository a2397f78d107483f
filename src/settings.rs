// src/settings.rs
//!
//! Persisted application settings
//!
//! Settings live in `settings.json` in the app config dir and are owned
//! by the backend; the frontend reads and writes them through commands
//! only. Loading is forgiving: a missing or damaged file never blocks
//! startup, each field falls back to its default on its own so one bad
//! value does not reset the rest.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tauri::{AppHandle, Manager, State};
use ts_rs::TS;

use crate::error::CompanionError;
use crate::gateway::key::is_valid_key_format;
use crate::AppState;

const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    /// Member API key, `XXXX-XXXX-XXXX-XXXX` or empty when unset
    pub api_key: String,
    pub theme: String,
    /// OS notifications for dispatch errors
    pub notifications: bool,
    pub auto_update: bool,
    /// Last update check, ms since epoch. Written by the update checker;
    /// carried here so a settings save never loses it.
    pub last_check_ms: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            theme: "dark".to_string(),
            notifications: true,
            auto_update: true,
            last_check_ms: 0,
        }
    }
}

impl AppSettings {
    /// Field-by-field extraction with defaults. A field that is absent
    /// or of the wrong type falls back alone.
    pub fn from_value(value: &Value) -> Self {
        let defaults = Self::default();
        Self {
            api_key: value
                .get("apiKey")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or(defaults.api_key),
            theme: value
                .get("theme")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or(defaults.theme),
            notifications: value
                .get("notifications")
                .and_then(Value::as_bool)
                .unwrap_or(defaults.notifications),
            auto_update: value
                .get("autoUpdate")
                .and_then(Value::as_bool)
                .unwrap_or(defaults.auto_update),
            last_check_ms: value
                .get("lastCheckMs")
                .and_then(Value::as_u64)
                .unwrap_or(defaults.last_check_ms),
        }
    }

    pub fn from_json_str(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => Self::from_value(&value),
            Err(e) => {
                eprintln!("[Settings] Unreadable settings file, using defaults: {}", e);
                Self::default()
            }
        }
    }
}

pub fn settings_path(app_handle: &AppHandle) -> Result<PathBuf, CompanionError> {
    let dir = app_handle
        .path()
        .app_config_dir()
        .map_err(|e| CompanionError::settings(format!("config dir unavailable: {e}")))?;
    Ok(dir.join(SETTINGS_FILE))
}

/// Load settings from disk. Never fails; a missing or damaged file
/// yields defaults.
pub fn load(app_handle: &AppHandle) -> AppSettings {
    let path = match settings_path(app_handle) {
        Ok(path) => path,
        Err(e) => {
            eprintln!("[Settings] {}", e);
            return AppSettings::default();
        }
    };

    match fs::read_to_string(&path) {
        Ok(raw) => AppSettings::from_json_str(&raw),
        Err(_) => {
            // First run
            AppSettings::default()
        }
    }
}

pub fn persist(app_handle: &AppHandle, settings: &AppSettings) -> Result<(), CompanionError> {
    let path = settings_path(app_handle)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| CompanionError::filesystem(parent.display().to_string(), e))?;
    }

    let json = serde_json::to_string_pretty(settings)?;
    fs::write(&path, json)
        .map_err(|e| CompanionError::filesystem(path.display().to_string(), e))?;
    Ok(())
}

// ============================================================================
// Commands
// ============================================================================

#[tauri::command]
pub fn get_settings(state: State<'_, AppState>) -> Result<AppSettings, CompanionError> {
    let settings = state
        .settings
        .lock()
        .map_err(|e| CompanionError::StatePoisoned {
            reason: e.to_string(),
        })?;
    Ok(settings.clone())
}

/// Replace the settings wholesale and persist them. Returns the stored
/// copy so the UI can re-render from what actually landed on disk.
#[tauri::command]
pub fn update_settings(
    app_handle: AppHandle,
    state: State<'_, AppState>,
    settings: AppSettings,
) -> Result<AppSettings, CompanionError> {
    persist(&app_handle, &settings)?;

    let mut current = state
        .settings
        .lock()
        .map_err(|e| CompanionError::StatePoisoned {
            reason: e.to_string(),
        })?;
    *current = settings.clone();

    println!("[Settings] Updated");
    Ok(settings)
}

/// Store a new API key after validating its shape. The key never goes
/// to disk unvalidated.
#[tauri::command]
pub fn save_api_key(
    app_handle: AppHandle,
    state: State<'_, AppState>,
    key: String,
) -> Result<(), CompanionError> {
    let key = key.trim().to_string();
    if !is_valid_key_format(&key) {
        return Err(CompanionError::settings(
            "API key must look like XXXX-XXXX-XXXX-XXXX",
        ));
    }

    let updated = {
        let mut current = state
            .settings
            .lock()
            .map_err(|e| CompanionError::StatePoisoned {
                reason: e.to_string(),
            })?;
        current.api_key = key;
        current.clone()
    };

    persist(&app_handle, &updated)?;
    println!("[Settings] API key stored");
    Ok(())
}
