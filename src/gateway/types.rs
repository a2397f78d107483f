// src/gateway/types.rs
//!
//! Types for the constelia.ai API gateway
//!

use serde::{Deserialize, Serialize};

/// HTTP method of an API call. The vendor API only distinguishes reads
/// (query string only) from mutations (form-encoded body).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum ApiMethod {
    #[default]
    #[serde(rename = "GET")]
    Get,
    #[serde(rename = "POST")]
    Post,
}

/// One API call, assembled by the frontend and consumed by exactly one
/// dispatch. `command` also selects how the reply is classified.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiRequest {
    /// Vendor command name, e.g. `getMember` or `sendCommand`
    pub command: String,
    /// Query parameters as ordered pairs; `key` and `cmd` are reserved
    /// and silently dropped if a caller supplies them
    #[serde(default)]
    pub parameters: Vec<(String, String)>,
    #[serde(default)]
    pub method: ApiMethod,
    /// Form fields for POST mutations
    #[serde(default)]
    pub body: Option<Vec<(String, String)>>,
}

impl ApiRequest {
    /// Plain GET call without extra parameters.
    pub fn get(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            parameters: Vec::new(),
            method: ApiMethod::Get,
            body: None,
        }
    }
}

/// What went wrong with a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiErrorKind {
    /// Key failed the XXXX-XXXX-XXXX-XXXX shape check; nothing was sent
    InvalidKeyFormat,
    /// Sliding window was full; nothing was sent
    RateLimited,
    /// Transport-level failure (DNS, TLS, connect, read)
    Network,
    /// Vendor returned a JSON envelope with a non-200 `code`
    ApiLevel,
    /// Vendor rejected the session in a text-mode reply
    Auth,
    /// Binary transfer came back with a non-success status
    Download,
    /// JSON-mode body that does not parse as JSON
    Parse,
}

/// Uniform outcome of one dispatch. Exactly one variant per call; vendor
/// and transport failures come back as `Error`, never as a panic or a
/// rejected command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "camelCase")]
pub enum ApiResult {
    Json(serde_json::Value),
    Text(String),
    /// Raw bytes, base64 encoded for the IPC boundary
    Binary(String),
    Error {
        kind: ApiErrorKind,
        message: String,
        /// Vendor `code` field or HTTP status, where one applies
        code: Option<i64>,
    },
}

impl ApiResult {
    pub fn is_error(&self) -> bool {
        matches!(self, ApiResult::Error { .. })
    }

    pub fn error(kind: ApiErrorKind, message: impl Into<String>, code: Option<i64>) -> Self {
        ApiResult::Error {
            kind,
            message: message.into(),
            code,
        }
    }
}
