mod error;
#[cfg(not(any(target_os = "android", target_os = "ios")))]
mod forum;
mod gateway;
mod settings;
#[cfg(not(any(target_os = "android", target_os = "ios")))]
mod window;

use std::sync::Mutex;

use tauri::Manager;

#[cfg(not(any(target_os = "android", target_os = "ios")))]
use crate::forum::ForumBridgeHandle;
use crate::gateway::ApiGateway;

pub struct AppState {
    pub settings: Mutex<settings::AppSettings>,
    pub gateway: ApiGateway,
    /// Forum window session bridge (desktop only)
    #[cfg(not(any(target_os = "android", target_os = "ios")))]
    pub forum: ForumBridgeHandle,
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // RUST_LOG surfaces reqwest/hyper connection internals when a network
    // failure needs more than our own logs. Quiet by default.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    tauri::Builder::default()
        .manage(AppState {
            settings: Mutex::new(settings::AppSettings::default()),
            gateway: ApiGateway::new(),
            #[cfg(not(any(target_os = "android", target_os = "ios")))]
            forum: ForumBridgeHandle::new(),
        })
        .plugin(tauri_plugin_http::init())
        .plugin(tauri_plugin_notification::init())
        .plugin(tauri_plugin_opener::init())
        // Load persisted settings before the frontend asks for them
        .setup(|app| {
            let app_handle = app.handle().clone();

            let loaded = settings::load(&app_handle);
            let state = app_handle.state::<AppState>();
            match state.settings.lock() {
                Ok(mut slot) => *slot = loaded,
                Err(e) => eprintln!("[Setup] Settings state poisoned at startup: {}", e),
            }
            println!("[Setup] Settings loaded");

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            // API gateway
            gateway::commands::gateway_dispatch,
            gateway::commands::validate_api_key,
            // Settings
            settings::get_settings,
            settings::update_settings,
            settings::save_api_key,
            // Forum window and session bridge (desktop only)
            #[cfg(not(any(target_os = "android", target_os = "ios")))]
            forum::commands::forum_open,
            #[cfg(not(any(target_os = "android", target_os = "ios")))]
            forum::commands::forum_close,
            #[cfg(not(any(target_os = "android", target_os = "ios")))]
            forum::commands::forum_status,
            #[cfg(not(any(target_os = "android", target_os = "ios")))]
            forum::commands::forum_cookie_state,
            #[cfg(not(any(target_os = "android", target_os = "ios")))]
            forum::commands::open_external_confirmed,
            // Window management (desktop only)
            #[cfg(not(any(target_os = "android", target_os = "ios")))]
            window::window_control,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
