// src/gateway/classify.rs
//!
//! Response classification for vendor API replies
//!
//! The vendor speaks three body shapes through one endpoint: JSON
//! envelopes, pre-formatted text and raw binary artifacts. Which one a
//! reply uses is decided by the command alone, so classification is a
//! closed table plus a pure function over (command, status, body).

use base64::{engine::general_purpose::STANDARD, Engine as _};

use super::types::{ApiErrorKind, ApiResult};

/// Commands whose replies are pre-formatted text, never JSON.
const TEXT_COMMANDS: &[&str] = &["sendCommand", "getConfiguration"];

/// Commands whose replies are downloadable artifacts.
const BINARY_COMMANDS: &[&str] = &["getSolution"];

/// Vendor phrases that mark a rejected session in a text-mode reply.
const AUTH_ERROR_MARKERS: &[&str] = &["invalid license key", "authorization denied"];

/// How the body of a reply must be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    Json,
    Text,
    Binary,
}

pub fn response_mode(command: &str) -> ResponseMode {
    if TEXT_COMMANDS.contains(&command) {
        ResponseMode::Text
    } else if BINARY_COMMANDS.contains(&command) {
        ResponseMode::Binary
    } else {
        ResponseMode::Json
    }
}

/// Classify a completed transfer into exactly one `ApiResult` variant.
///
/// Transport failures never reach this function; the dispatcher maps
/// them to `Network` errors before classification.
pub fn classify(command: &str, status: u16, body: &[u8]) -> ApiResult {
    match response_mode(command) {
        ResponseMode::Text => classify_text(status, body),
        ResponseMode::Binary => classify_binary(status, body),
        ResponseMode::Json => classify_json(status, body),
    }
}

fn classify_text(status: u16, body: &[u8]) -> ApiResult {
    let text = String::from_utf8_lossy(body).into_owned();
    let lowered = text.to_lowercase();

    for marker in AUTH_ERROR_MARKERS {
        if lowered.contains(marker) {
            return ApiResult::error(ApiErrorKind::Auth, text.trim(), Some(status as i64));
        }
    }

    ApiResult::Text(text)
}

fn classify_binary(status: u16, body: &[u8]) -> ApiResult {
    if !(200..300).contains(&status) {
        let message = match std::str::from_utf8(body) {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            _ => format!("download failed with status {status}"),
        };
        return ApiResult::error(ApiErrorKind::Download, message, Some(status as i64));
    }

    ApiResult::Binary(STANDARD.encode(body))
}

fn classify_json(status: u16, body: &[u8]) -> ApiResult {
    let value: serde_json::Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) => {
            return ApiResult::error(
                ApiErrorKind::Parse,
                format!("reply is not valid JSON: {e}"),
                Some(status as i64),
            )
        }
    };

    // An envelope with a numeric `code` other than 200 is a vendor error;
    // `code` absent (the common case) means success.
    if let Some(code) = value.get("code").and_then(|c| c.as_i64()) {
        if code != 200 {
            let message = value
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("API returned an error")
                .to_string();
            return ApiResult::error(ApiErrorKind::ApiLevel, message, Some(code));
        }
    }

    ApiResult::Json(value)
}
