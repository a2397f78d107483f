// src/gateway/commands.rs
//!
//! Tauri commands for the API gateway
//!

use tauri::{AppHandle, State};

use crate::error::CompanionError;
use crate::AppState;

use super::key::is_valid_key_format;
use super::types::{ApiErrorKind, ApiRequest, ApiResult};

/// Dispatch one API call with the stored license key. Dispatch failures
/// are part of the result, not command errors; the command itself only
/// fails when app state is unusable.
#[tauri::command]
pub async fn gateway_dispatch(
    app_handle: AppHandle,
    state: State<'_, AppState>,
    request: ApiRequest,
) -> Result<ApiResult, CompanionError> {
    let (key, notify) = {
        let settings = state
            .settings
            .lock()
            .map_err(|e| CompanionError::StatePoisoned {
                reason: e.to_string(),
            })?;
        (settings.api_key.clone(), settings.notifications)
    };

    let result = state.gateway.dispatch(&key, &request).await;

    if let ApiResult::Error { kind, message, .. } = &result {
        eprintln!(
            "[Gateway] {} failed ({:?}): {}",
            request.command, kind, message
        );
        if notify {
            notify_dispatch_error(&app_handle, &request.command, *kind);
        }
    }

    Ok(result)
}

/// Shape-check a license key without touching the network or the stored
/// settings. Used by the key form while the user types.
#[tauri::command]
pub fn validate_api_key(key: String) -> bool {
    is_valid_key_format(key.trim())
}

/// Transient OS notification for a failed dispatch. Rate-limit and key
/// shape rejections notify too; a refused call must never look like a
/// call that silently happened.
fn notify_dispatch_error(app_handle: &AppHandle, command: &str, kind: ApiErrorKind) {
    use tauri_plugin_notification::NotificationExt;

    let body = match kind {
        ApiErrorKind::InvalidKeyFormat => {
            "The saved license key is not in the expected format.".to_string()
        }
        ApiErrorKind::RateLimited => {
            "Too many API calls at once. Wait a moment and try again.".to_string()
        }
        ApiErrorKind::Network => format!("{command}: no connection to constelia.ai."),
        ApiErrorKind::Auth => "The API rejected the license key.".to_string(),
        ApiErrorKind::Download => format!("{command}: download failed."),
        ApiErrorKind::ApiLevel | ApiErrorKind::Parse => {
            format!("{command} returned an error.")
        }
    };

    if let Err(e) = app_handle
        .notification()
        .builder()
        .title("Constelia Companion")
        .body(&body)
        .show()
    {
        eprintln!("[Gateway] Failed to show notification: {}", e);
    }
}
