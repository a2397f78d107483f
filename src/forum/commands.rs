// src/forum/commands.rs
//!
//! Tauri commands for the forum window and its session bridge

use serde::Serialize;
use tauri::{AppHandle, Manager, State};
use ts_rs::TS;

use crate::error::CompanionError;
use crate::AppState;

use super::cookie_bridge::CookieRecord;
use super::window::{close_forum_window, open_forum_window};
use super::FORUM_WINDOW_LABEL;

/// Forum window and bridge state for the UI
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ForumStatus {
    pub open: bool,
    pub bridge_running: bool,
    pub last_capture_ms: Option<u64>,
}

/// Open the forum window, or focus it when already open.
#[tauri::command]
pub fn forum_open(app_handle: AppHandle) -> Result<(), CompanionError> {
    open_forum_window(&app_handle)
}

#[tauri::command]
pub fn forum_close(app_handle: AppHandle) -> Result<(), CompanionError> {
    close_forum_window(&app_handle)
}

#[tauri::command]
pub fn forum_status(
    app_handle: AppHandle,
    state: State<'_, AppState>,
) -> Result<ForumStatus, CompanionError> {
    let record = state.forum.current();
    Ok(ForumStatus {
        open: app_handle.get_webview_window(FORUM_WINDOW_LABEL).is_some(),
        bridge_running: state.forum.is_running(),
        last_capture_ms: record.map(|r| r.captured_at_ms),
    })
}

/// Latest captured session cookies, `None` until the first capture.
#[tauri::command]
pub fn forum_cookie_state(
    state: State<'_, AppState>,
) -> Result<Option<CookieRecord>, CompanionError> {
    Ok(state.forum.current())
}

/// Open a URL the user confirmed in the external-link modal in the
/// system browser. The scheme is restricted to http/https no matter
/// what the page handed us.
#[tauri::command]
pub fn open_external_confirmed(url: String) -> Result<(), CompanionError> {
    let parsed = url::Url::parse(&url)
        .map_err(|e| CompanionError::external(format!("Invalid URL: {}", e)))?;

    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(CompanionError::external(format!(
            "Unsupported URL scheme: {}. Only http and https are allowed.",
            scheme
        )));
    }

    tauri_plugin_opener::open_url(&url, None::<&str>)
        .map_err(|e| CompanionError::external(format!("Failed to open URL in browser: {}", e)))?;

    println!("[Forum] Opened externally: {}", url);
    Ok(())
}
