// src/forum/csp.rs
//!
//! Content-Security-Policy assembly and permission decisions for the
//! embedded forum window
//!
//! The forum surface renders remote vendor markup inside the companion,
//! so it gets a fixed, deterministic CSP and an origin allow-list for
//! webview permission requests. The policy is data, not configuration:
//! it is assembled in the same directive order on every call.

use url::Url;

/// The vendor's apex domain; all first-party forum content lives here.
pub const VENDOR_HOST: &str = "constelia.ai";

/// Origins granted to every fetch class of the forum surface.
const VENDOR_ORIGINS: &[&str] = &["https://constelia.ai", "https://*.constelia.ai"];

/// Embedded-player origins the forum markup is allowed to frame.
const EMBED_ORIGINS: &[&str] = &[
    "https://www.youtube.com",
    "https://www.youtube-nocookie.com",
    "https://player.vimeo.com",
];

/// Script CDNs and analytics the vendor pages pull in.
const SCRIPT_ORIGINS: &[&str] = &[
    "https://cdn.jsdelivr.net",
    "https://www.googletagmanager.com",
    "https://www.google-analytics.com",
];

const STYLE_ORIGINS: &[&str] = &["https://fonts.googleapis.com", "https://cdn.jsdelivr.net"];

const FONT_ORIGINS: &[&str] = &["https://fonts.gstatic.com"];

/// Thumbnail hosts for the embedded players.
const IMAGE_ORIGINS: &[&str] = &["https://i.ytimg.com", "https://i.vimeocdn.com"];

/// Webview permission kinds the forum surface can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionKind {
    Camera,
    Microphone,
    MediaPlayback,
    Geolocation,
    Notifications,
    Other,
}

/// Ordered CSP directive list. Order is part of the contract: the
/// header value reads the same on every assembly.
pub struct CspPolicy {
    directives: Vec<(&'static str, Vec<String>)>,
}

impl CspPolicy {
    /// The fixed policy for the forum surface.
    pub fn forum_default() -> Self {
        let vendor: Vec<String> = VENDOR_ORIGINS.iter().map(|s| s.to_string()).collect();

        let mut directives: Vec<(&'static str, Vec<String>)> = Vec::new();

        let mut default_src = vec!["'self'".to_string()];
        default_src.extend(vendor.iter().cloned());
        directives.push(("default-src", default_src));

        // XenForo inlines both scripts and styles, so 'unsafe-inline'
        // stays; dropping it blanks the forum.
        let mut script_src = vec![
            "'self'".to_string(),
            "'unsafe-inline'".to_string(),
            "'unsafe-eval'".to_string(),
        ];
        script_src.extend(vendor.iter().cloned());
        script_src.extend(SCRIPT_ORIGINS.iter().map(|s| s.to_string()));
        directives.push(("script-src", script_src));

        let mut style_src = vec!["'self'".to_string(), "'unsafe-inline'".to_string()];
        style_src.extend(vendor.iter().cloned());
        style_src.extend(STYLE_ORIGINS.iter().map(|s| s.to_string()));
        directives.push(("style-src", style_src));

        let mut img_src = vec!["'self'".to_string(), "data:".to_string(), "blob:".to_string()];
        img_src.extend(vendor.iter().cloned());
        img_src.extend(IMAGE_ORIGINS.iter().map(|s| s.to_string()));
        directives.push(("img-src", img_src));

        let mut media_src = vec!["'self'".to_string(), "blob:".to_string()];
        media_src.extend(vendor.iter().cloned());
        media_src.extend(EMBED_ORIGINS.iter().map(|s| s.to_string()));
        directives.push(("media-src", media_src));

        let mut font_src = vec!["'self'".to_string(), "data:".to_string()];
        font_src.extend(vendor.iter().cloned());
        font_src.extend(FONT_ORIGINS.iter().map(|s| s.to_string()));
        directives.push(("font-src", font_src));

        let mut frame_src = vendor.clone();
        frame_src.extend(EMBED_ORIGINS.iter().map(|s| s.to_string()));
        directives.push(("frame-src", frame_src));

        let mut connect_src = vec!["'self'".to_string()];
        connect_src.extend(vendor.iter().cloned());
        connect_src.extend(
            SCRIPT_ORIGINS
                .iter()
                .filter(|origin| origin.contains("google"))
                .map(|s| s.to_string()),
        );
        directives.push(("connect-src", connect_src));

        Self { directives }
    }

    /// The assembled header value, directives joined in declaration order.
    pub fn header_value(&self) -> String {
        self.directives
            .iter()
            .map(|(directive, sources)| format!("{} {}", directive, sources.join(" ")))
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn directives(&self) -> &[(&'static str, Vec<String>)] {
        &self.directives
    }
}

/// True when `url` points at the vendor's domain (any subdomain), https
/// only. This is the navigation gate for the forum window.
pub fn is_vendor_url(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => {
            if parsed.scheme() != "https" {
                return false;
            }
            match parsed.host_str() {
                Some(host) => host == VENDOR_HOST || host.ends_with(".constelia.ai"),
                None => false,
            }
        }
        Err(_) => false,
    }
}

/// True when `url` belongs to one of the whitelisted embed players.
pub fn is_embed_url(url: &str) -> bool {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(_) => return false,
    };
    if parsed.scheme() != "https" {
        return false;
    }
    let host = match parsed.host_str() {
        Some(host) => host,
        None => return false,
    };

    EMBED_ORIGINS.iter().any(|origin| {
        origin
            .strip_prefix("https://")
            .map(|embed_host| embed_host == host)
            .unwrap_or(false)
    })
}

/// Decide a webview permission request by requesting origin. Media
/// capture is for vendor pages only, playback also for the known embed
/// players, everything else is denied outright.
pub fn decide_permission(origin: &str, kind: PermissionKind) -> bool {
    match kind {
        PermissionKind::Camera | PermissionKind::Microphone => is_vendor_url(origin),
        PermissionKind::MediaPlayback => is_vendor_url(origin) || is_embed_url(origin),
        PermissionKind::Geolocation | PermissionKind::Notifications | PermissionKind::Other => {
            false
        }
    }
}
