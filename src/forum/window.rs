// src/forum/window.rs
//!
//! Forum window lifecycle
//!
//! The forum is a second webview window pointed straight at the vendor's
//! XenForo instance. The host keeps it on a short leash:
//!
//! - navigation is confined to the vendor plus the known embed players;
//!   anything else is blocked and handed to the UI as an
//!   `open-external-modal` event so the user can confirm opening it in
//!   the system browser
//! - a content security policy is injected before any page script runs
//! - webview permission prompts (camera, mic, notifications, ...) are
//!   answered host-side by origin, never shown to the user
//! - the cookie bridge follows the window: started on open, stopped and
//!   cleared on destroy

use tauri::webview::PageLoadEvent;
use tauri::{AppHandle, Emitter, Manager, Url, WebviewUrl, WebviewWindow, WebviewWindowBuilder};

use crate::error::CompanionError;
use crate::AppState;

use super::csp::{self, CspPolicy};
use super::{cache, inject, FORUM_URL, FORUM_WINDOW_LABEL};

/// Event asking the UI to show the external-link confirmation modal.
/// Payload is the blocked URL as a string.
pub const EVENT_OPEN_EXTERNAL_MODAL: &str = "open-external-modal";

/// Open the forum window, or focus it when it already exists. Pruning
/// the webview's disk footprint and starting the cookie bridge are part
/// of the open path.
pub fn open_forum_window(app_handle: &AppHandle) -> Result<(), CompanionError> {
    if let Some(window) = app_handle.get_webview_window(FORUM_WINDOW_LABEL) {
        crate::window::focus_window(&window).map_err(CompanionError::window)?;
        return Ok(());
    }

    // Prune failures must not keep the forum from opening
    if let Err(e) = cache::prune_to_budget(app_handle) {
        eprintln!("[Forum Window] Cache prune failed: {}", e);
    }

    let window = build_forum_window(app_handle)?;

    #[cfg(target_os = "linux")]
    wire_permission_requests(&window);

    register_lifecycle(&window, app_handle.clone());

    let state = app_handle.state::<AppState>();
    state.forum.start(app_handle.clone());

    println!("[Forum Window] Opened {}", FORUM_URL);
    Ok(())
}

/// Close the forum window. A missing window is not an error; the
/// destroy hook takes care of bridge shutdown and session cleanup.
pub fn close_forum_window(app_handle: &AppHandle) -> Result<(), CompanionError> {
    match app_handle.get_webview_window(FORUM_WINDOW_LABEL) {
        Some(window) => window
            .close()
            .map_err(|e| CompanionError::window(format!("failed to close forum window: {e}"))),
        None => Ok(()),
    }
}

/// True when the forum window may navigate to `url` in place. Blocked
/// URLs are routed through the external-link confirmation instead.
pub fn allow_navigation(url: &Url) -> bool {
    // Webview-internal blank pages, e.g. while a popup is intercepted
    if url.scheme() == "about" {
        return true;
    }
    let url_str = url.as_str();
    csp::is_vendor_url(url_str) || csp::is_embed_url(url_str)
}

fn build_forum_window(app_handle: &AppHandle) -> Result<WebviewWindow, CompanionError> {
    let forum_url: Url = FORUM_URL
        .parse()
        .map_err(|e| CompanionError::window(format!("invalid forum url: {e}")))?;

    let policy = CspPolicy::forum_default();
    let nav_app = app_handle.clone();

    #[allow(unused_mut)]
    let mut builder = WebviewWindowBuilder::new(
        app_handle,
        FORUM_WINDOW_LABEL,
        WebviewUrl::External(forum_url),
    )
    .title("Constelia Forum")
    .inner_size(1200.0, 850.0)
    .min_inner_size(900.0, 600.0)
    .center()
    .initialization_script(&inject::csp_bootstrap_script(&policy))
    .initialization_script(&inject::attachment_refresh_script())
    .on_navigation(move |url| {
        if allow_navigation(url) {
            return true;
        }
        println!("[Forum Window] Blocked navigation to {}", url);
        let _ = nav_app.emit(EVENT_OPEN_EXTERNAL_MODAL, url.to_string());
        false
    })
    .on_page_load(|window, payload| {
        if matches!(payload.event(), PageLoadEvent::Finished) {
            let app_handle = window.app_handle().clone();
            let state = window.state::<AppState>();
            state.forum.trigger_capture(app_handle);
        }
    });

    // Dedicated profile dir so the forum session never shares storage
    // with the companion UI, and so the cache pruner has a known root
    #[cfg(any(windows, target_os = "linux"))]
    {
        builder = builder.data_directory(cache::forum_data_dir(app_handle)?);
    }

    builder
        .build()
        .map_err(|e| CompanionError::window(format!("failed to create forum window: {e}")))
}

fn register_lifecycle(window: &WebviewWindow, app_handle: AppHandle) {
    window.on_window_event(move |event| {
        if let tauri::WindowEvent::Destroyed = event {
            println!("[Forum Window] Destroyed, dropping session state");
            let state = app_handle.state::<AppState>();
            state.forum.stop_and_clear(&app_handle);
        }
    });
}

/// Answer WebKit permission prompts host-side. GTK only; other desktop
/// backends fall back to their platform defaults.
#[cfg(target_os = "linux")]
fn wire_permission_requests(window: &WebviewWindow) {
    use webkit2gtk::{PermissionRequestExt, WebViewExt};

    let result = window.with_webview(|webview| {
        let wv = webview.inner();
        wv.connect_permission_request(|wv, request| {
            let origin = wv.uri().map(|u| u.to_string()).unwrap_or_default();
            let kind = classify_permission_request(request);
            if csp::decide_permission(&origin, kind) {
                println!("[Forum Window] Granted {:?} to {}", kind, origin);
                request.allow();
            } else {
                println!("[Forum Window] Denied {:?} to {}", kind, origin);
                request.deny();
            }
            true
        });
    });

    if let Err(e) = result {
        eprintln!("[Forum Window] Could not attach permission handler: {}", e);
    }
}

#[cfg(target_os = "linux")]
fn classify_permission_request(request: &webkit2gtk::PermissionRequest) -> csp::PermissionKind {
    use gtk::glib::Cast;
    use webkit2gtk::UserMediaPermissionRequestExt;

    if let Some(media) = request.dynamic_cast_ref::<webkit2gtk::UserMediaPermissionRequest>() {
        if media.is_for_video_device() {
            csp::PermissionKind::Camera
        } else if media.is_for_audio_device() {
            csp::PermissionKind::Microphone
        } else {
            csp::PermissionKind::MediaPlayback
        }
    } else if request
        .dynamic_cast_ref::<webkit2gtk::NotificationPermissionRequest>()
        .is_some()
    {
        csp::PermissionKind::Notifications
    } else if request
        .dynamic_cast_ref::<webkit2gtk::GeolocationPermissionRequest>()
        .is_some()
    {
        csp::PermissionKind::Geolocation
    } else {
        csp::PermissionKind::Other
    }
}
