// src/forum/cookie_bridge.rs
//!
//! Host-side session cookie bridge for the embedded forum window
//!
//! The forum webview owns the live vendor session. The bridge mirrors
//! its cookie jar into host state on a fixed interval plus on every
//! finished page load, persists the snapshot next to the settings file
//! and republishes it as an event, so the companion UI can observe
//! session state without ever navigating to the vendor itself.
//!
//! Capture is last-write-wins: each cycle overwrites the whole record,
//! nothing is merged. A stale overwrite inside one cycle is acceptable;
//! the record converges within one interval.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tauri::{AppHandle, Emitter, Manager, Url};
use tokio::sync::oneshot;
use ts_rs::TS;

use crate::error::CompanionError;

use super::csp::VENDOR_HOST;
use super::{FORUM_URL, FORUM_WINDOW_LABEL};

/// How often the forum cookie jar is mirrored into host state (in seconds)
const CAPTURE_INTERVAL_SECS: u64 = 5;

/// Snapshot file next to settings.json; external helpers read it
const COOKIE_FILE: &str = "forum-cookies.txt";

/// Event name for cookie updates
pub const EVENT_COOKIES_UPDATED: &str = "forum-cookies-updated";

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// One capture of the forum session, last write wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CookieRecord {
    pub domain: String,
    /// `name=value; name=value` as a browser would send them
    pub cookies: String,
    pub captured_at_ms: u64,
}

type SharedRecord = Arc<Mutex<Option<CookieRecord>>>;

/// Bridge handle stored in `AppState`. The capture task is owned by the
/// forum window's lifecycle: started on open, stopped on destroy.
pub struct ForumBridgeHandle {
    record: SharedRecord,
    shutdown: Mutex<Option<oneshot::Sender<()>>>,
}

impl ForumBridgeHandle {
    pub fn new() -> Self {
        Self {
            record: Arc::new(Mutex::new(None)),
            shutdown: Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.shutdown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Start the capture loop. A second start while one is running is a
    /// no-op.
    pub fn start(&self, app_handle: AppHandle) {
        let mut slot = self
            .shutdown
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return;
        }

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        *slot = Some(shutdown_tx);

        let record = self.record.clone();
        tauri::async_runtime::spawn(async move {
            run_capture_loop(app_handle, record, shutdown_rx).await;
        });
    }

    /// Stop the capture loop and drop the session snapshot, both the
    /// in-memory record and the on-disk handoff file.
    pub fn stop_and_clear(&self, app_handle: &AppHandle) {
        if let Some(tx) = self
            .shutdown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            let _ = tx.send(());
        }

        *self.record.lock().unwrap_or_else(PoisonError::into_inner) = None;

        match cookie_file_path(app_handle) {
            Ok(path) => {
                if path.exists() {
                    if let Err(e) = std::fs::remove_file(&path) {
                        eprintln!(
                            "[Forum Bridge] Failed to remove {}: {}",
                            path.display(),
                            e
                        );
                    }
                }
            }
            Err(e) => eprintln!("[Forum Bridge] {}", e),
        }
    }

    /// Latest snapshot, if any.
    pub fn current(&self) -> Option<CookieRecord> {
        self.record
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// One out-of-band capture, used by the forum window's page-load
    /// hook so a fresh login lands in host state before the next tick.
    pub fn trigger_capture(&self, app_handle: AppHandle) {
        let record = self.record.clone();
        tauri::async_runtime::spawn(async move {
            if let Err(e) = capture_once(&app_handle, &record) {
                eprintln!("[Forum Bridge] Capture failed: {}", e);
            }
        });
    }
}

/// Run the capture loop until the shutdown signal arrives.
async fn run_capture_loop(
    app_handle: AppHandle,
    record: SharedRecord,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    let mut capture_interval =
        tokio::time::interval(Duration::from_secs(CAPTURE_INTERVAL_SECS));

    println!(
        "[Forum Bridge] Cookie capture started ({}s interval)",
        CAPTURE_INTERVAL_SECS
    );

    loop {
        tokio::select! {
            _ = &mut shutdown_rx => {
                println!("[Forum Bridge] Shutting down");
                break;
            }

            _ = capture_interval.tick() => {
                if let Err(e) = capture_once(&app_handle, &record) {
                    eprintln!("[Forum Bridge] Capture failed: {}", e);
                }
            }
        }
    }
}

/// One capture cycle: read the forum window's cookie jar, overwrite the
/// record, persist and republish when the session actually changed.
fn capture_once(app_handle: &AppHandle, record: &SharedRecord) -> Result<(), CompanionError> {
    let window = match app_handle.get_webview_window(FORUM_WINDOW_LABEL) {
        Some(window) => window,
        // Window already gone; the destroy hook stops the loop
        None => return Ok(()),
    };

    let forum_url = Url::parse(FORUM_URL)
        .map_err(|e| CompanionError::window(format!("invalid forum url: {e}")))?;
    let cookies = window
        .cookies_for_url(forum_url)
        .map_err(|e| CompanionError::window(format!("cookie query failed: {e}")))?;

    if cookies.is_empty() {
        return Ok(());
    }

    let joined = cookies
        .iter()
        .map(|cookie| format!("{}={}", cookie.name(), cookie.value()))
        .collect::<Vec<_>>()
        .join("; ");

    let snapshot = CookieRecord {
        domain: VENDOR_HOST.to_string(),
        cookies: joined,
        captured_at_ms: now_millis(),
    };

    let changed = {
        let mut slot = record.lock().unwrap_or_else(PoisonError::into_inner);
        let changed = slot
            .as_ref()
            .map(|current| current.cookies != snapshot.cookies)
            .unwrap_or(true);
        *slot = Some(snapshot.clone());
        changed
    };

    if changed {
        persist_record(app_handle, &snapshot)?;
        let _ = app_handle.emit(EVENT_COOKIES_UPDATED, &snapshot);
        println!(
            "[Forum Bridge] Session cookies updated ({} bytes)",
            snapshot.cookies.len()
        );
    }

    Ok(())
}

pub fn cookie_file_path(app_handle: &AppHandle) -> Result<PathBuf, CompanionError> {
    let dir = app_handle
        .path()
        .app_config_dir()
        .map_err(|e| CompanionError::settings(format!("config dir unavailable: {e}")))?;
    Ok(dir.join(COOKIE_FILE))
}

fn persist_record(app_handle: &AppHandle, record: &CookieRecord) -> Result<(), CompanionError> {
    let path = cookie_file_path(app_handle)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| CompanionError::filesystem(parent.display().to_string(), e))?;
    }
    std::fs::write(&path, &record.cookies)
        .map_err(|e| CompanionError::filesystem(path.display().to_string(), e))?;
    Ok(())
}

impl Default for ForumBridgeHandle {
    fn default() -> Self {
        Self::new()
    }
}
