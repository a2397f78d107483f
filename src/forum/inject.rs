// src/forum/inject.rs
//!
//! Scripts injected into the forum webview at document start
//!
//! Two injections: a CSP bootstrap that pins the policy before any forum
//! markup runs (wry exposes no response-header hook for remote content,
//! so the policy rides in as a meta tag), and an attachment refresher
//! that works around the vendor CDN intermittently serving stale 404s
//! for freshly uploaded attachment images.
//!
//! The URL rules live here as plain functions so the host and the
//! injected script can never disagree about them.

use super::csp::CspPolicy;

/// Attachment URLs live under this path on the vendor forum.
pub const ATTACHMENT_PATH_MARKER: &str = "constelia.ai/forums/index.php?attachments/";

/// Query marker that makes the CDN skip its cache.
pub const CACHE_BUST_PARAM: &str = "bypassCache=1";

/// How often the injected refresher re-sweeps the page for new images.
const REFRESH_INTERVAL_MS: u64 = 5000;

/// True for forum attachment URLs, the only ones that get the marker.
pub fn is_attachment_url(url: &str) -> bool {
    url.contains(ATTACHMENT_PATH_MARKER)
}

/// Append the cache-bust marker to an attachment URL, exactly once.
/// Non-attachment URLs and already-marked URLs pass through unchanged.
pub fn apply_cache_bust(url: &str) -> String {
    if !is_attachment_url(url) || url.contains(CACHE_BUST_PARAM) {
        return url.to_string();
    }
    format!("{url}&{CACHE_BUST_PARAM}")
}

const CSP_BOOTSTRAP_TEMPLATE: &str = r#"(function () {
  const POLICY = __CSP_POLICY__;

  const install = () => {
    if (!document.head) {
      return false;
    }
    if (document.head.querySelector('meta[http-equiv="Content-Security-Policy"]')) {
      return true;
    }
    const meta = document.createElement("meta");
    meta.setAttribute("http-equiv", "Content-Security-Policy");
    meta.setAttribute("content", POLICY);
    document.head.prepend(meta);
    return true;
  };

  if (!install()) {
    new MutationObserver((_, observer) => {
      if (install()) {
        observer.disconnect();
      }
    }).observe(document.documentElement, { childList: true, subtree: true });
  }
})();"#;

/// Document-start CSP bootstrap generated from the live policy.
pub fn csp_bootstrap_script(policy: &CspPolicy) -> String {
    let policy_literal =
        serde_json::to_string(&policy.header_value()).unwrap_or_else(|_| "\"\"".to_string());
    CSP_BOOTSTRAP_TEMPLATE.replace("__CSP_POLICY__", &policy_literal)
}

const ATTACHMENT_REFRESH_TEMPLATE: &str = r#"(function () {
  const MARKER = "__MARKER__";
  const PARAM = "__PARAM__";

  const bust = (url) => {
    if (!url || url.indexOf(MARKER) === -1 || url.indexOf(PARAM) !== -1) {
      return null;
    }
    return url + "&" + PARAM;
  };

  const process = (img) => {
    if (img.dataset.ccBusted) {
      return;
    }
    const busted = bust(img.src);
    if (busted === null) {
      return;
    }
    img.dataset.ccBusted = "1";
    img.addEventListener(
      "error",
      () => {
        if (!img.dataset.ccRetried) {
          img.dataset.ccRetried = "1";
          img.src = busted + "&r=" + Date.now();
        }
      },
      { once: true }
    );
    img.src = busted;
  };

  const sweep = () => {
    document.querySelectorAll("img[src*='attachments/']").forEach(process);
  };

  if (document.readyState === "loading") {
    document.addEventListener("DOMContentLoaded", sweep);
  } else {
    sweep();
  }
  new MutationObserver(sweep).observe(document.documentElement, {
    childList: true,
    subtree: true
  });
  setInterval(sweep, __INTERVAL_MS__);
})();"#;

/// The attachment-refresh script, generated from the same constants the
/// host-side URL rules use.
pub fn attachment_refresh_script() -> String {
    ATTACHMENT_REFRESH_TEMPLATE
        .replace("__MARKER__", ATTACHMENT_PATH_MARKER)
        .replace("__PARAM__", CACHE_BUST_PARAM)
        .replace("__INTERVAL_MS__", &REFRESH_INTERVAL_MS.to_string())
}
