// src/error.rs
use thiserror::Error;
use ts_rs::TS;

/// Error codes for frontend handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, TS)]
#[ts(export)]
pub enum CompanionErrorCode {
    StatePoisoned = 1000,
    Settings = 2000,
    Filesystem = 2001,
    Window = 3000,
    External = 3100,
}

/// Serialized representation of CompanionError for TypeScript
#[derive(Debug, Clone, serde::Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SerializedCompanionError {
    pub code: u16,
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
}

impl serde::Serialize for CompanionErrorCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u16(*self as u16)
    }
}

/// Failures at the command boundary. Dispatch outcomes (vendor errors,
/// throttling, bad keys) are not errors in this sense; they come back to
/// the UI inside `ApiResult`.
#[derive(Error, Debug)]
pub enum CompanionError {
    #[error("A mutex was poisoned: {reason}")]
    StatePoisoned { reason: String },

    #[error("Settings error: {reason}")]
    Settings { reason: String },

    #[error("Filesystem operation failed at '{path}': {source}")]
    Filesystem {
        path: String,
        source: std::io::Error,
    },

    #[error("Window operation failed: {reason}")]
    Window { reason: String },

    #[error("Failed to open external URL: {reason}")]
    External { reason: String },
}

impl CompanionError {
    /// Get error code for this error
    pub fn code(&self) -> CompanionErrorCode {
        match self {
            CompanionError::StatePoisoned { .. } => CompanionErrorCode::StatePoisoned,
            CompanionError::Settings { .. } => CompanionErrorCode::Settings,
            CompanionError::Filesystem { .. } => CompanionErrorCode::Filesystem,
            CompanionError::Window { .. } => CompanionErrorCode::Window,
            CompanionError::External { .. } => CompanionErrorCode::External,
        }
    }

    pub fn settings(reason: impl Into<String>) -> Self {
        Self::Settings {
            reason: reason.into(),
        }
    }

    pub fn window(reason: impl Into<String>) -> Self {
        Self::Window {
            reason: reason.into(),
        }
    }

    pub fn external(reason: impl Into<String>) -> Self {
        Self::External {
            reason: reason.into(),
        }
    }

    /// Helper to create a filesystem error with path context
    pub fn filesystem<P: Into<String>>(path: P, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }
}

impl serde::Serialize for CompanionError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("CompanionError", 3)?;
        state.serialize_field("code", &self.code())?;
        state.serialize_field("type", &format!("{self:?}"))?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

impl From<CompanionError> for String {
    fn from(error: CompanionError) -> Self {
        serde_json::to_string(&error).unwrap_or_else(|_| error.to_string())
    }
}

impl From<serde_json::Error> for CompanionError {
    fn from(err: serde_json::Error) -> Self {
        CompanionError::Settings {
            reason: err.to_string(),
        }
    }
}
