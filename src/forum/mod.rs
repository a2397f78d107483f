// src/forum/mod.rs
//!
//! Embedded vendor forum
//!
//! A second webview window rendering the vendor's XenForo forum, with the
//! host in charge of everything the page must not decide for itself:
//! navigation confinement with external-link confirmation, an injected
//! content security policy, host-side permission answers, attachment
//! cache-busting and a cookie bridge that mirrors the live session into
//! app state.
//!
//! Module layout:
//! - `window`: window lifecycle, navigation gate, permission wiring
//! - `csp`: origin allowlists, policy construction, permission decisions
//! - `inject`: scripts injected into the forum page
//! - `cookie_bridge`: periodic session cookie capture
//! - `cache`: disk budget for the webview profile
//! - `commands`: the Tauri command surface

pub mod cache;
pub mod commands;
pub mod cookie_bridge;
pub mod csp;
pub mod inject;
pub mod window;


pub use cookie_bridge::ForumBridgeHandle;

/// Label of the forum webview window
pub const FORUM_WINDOW_LABEL: &str = "forum";

/// Address the forum window opens on
pub const FORUM_URL: &str = "https://constelia.ai/forums/";
