// src/window.rs
//!
//! Window management module
//!
//! Commands backing the undecorated main window's custom titlebar, plus
//! focus utilities shared with the forum window. Includes
//! platform-specific handling for Linux/GTK.

use serde::Deserialize;
use tauri::WebviewWindow;
use ts_rs::TS;

use crate::error::CompanionError;

// Linux-specific GTK imports for window.present() workaround
#[cfg(target_os = "linux")]
use gtk::prelude::GtkWindowExt;

/// Titlebar actions for the undecorated main window. `Maximize`
/// toggles, matching what a native titlebar button does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub enum WindowAction {
    Minimize,
    Maximize,
    Close,
}

/// Focus a window by bringing it to the foreground.
/// Uses GTK present() on Linux for proper window focusing (Tauri's set_focus()
/// doesn't work reliably on modern GNOME/GTK - known issue #5974).
///
/// This is a utility function that can be used by other modules.
pub fn focus_window(window: &WebviewWindow) -> Result<(), String> {
    #[cfg(target_os = "linux")]
    {
        if let Ok(gtk_window) = window.gtk_window() {
            gtk_window.present();
            println!("[window::focus_window] GTK present() called successfully");
        } else {
            println!("[window::focus_window] Failed to get GTK window, falling back to set_focus");
            window.set_focus().map_err(|e| e.to_string())?;
        }
    }

    #[cfg(not(target_os = "linux"))]
    {
        let is_minimized = window.is_minimized().unwrap_or(false);
        if is_minimized {
            window.unminimize().ok();
        }
        window.set_focus().map_err(|e| e.to_string())?;
        // Bring to front using always_on_top trick
        window.set_always_on_top(true).ok();
        window.set_always_on_top(false).ok();
    }

    Ok(())
}

/// Titlebar control for the calling window.
#[tauri::command]
pub fn window_control(window: WebviewWindow, action: WindowAction) -> Result<(), CompanionError> {
    let result = match action {
        WindowAction::Minimize => window.minimize(),
        WindowAction::Maximize => {
            if window.is_maximized().unwrap_or(false) {
                window.unmaximize()
            } else {
                window.maximize()
            }
        }
        WindowAction::Close => window.close(),
    };

    result.map_err(|e| CompanionError::window(format!("{:?} failed: {}", action, e)))
}
