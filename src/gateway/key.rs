// src/gateway/key.rs
//!
//! License key shape validation
//!

use regex::Regex;

lazy_static::lazy_static! {
    /// Four groups of four alphanumerics joined by hyphens,
    /// e.g. `AB12-CD34-EF56-GH78`
    static ref KEY_PATTERN: Regex =
        Regex::new(r"^[A-Za-z0-9]{4}-[A-Za-z0-9]{4}-[A-Za-z0-9]{4}-[A-Za-z0-9]{4}$")
            .expect("key pattern compiles");
}

/// Shape check only; whether the key is actually live is the vendor's
/// call and surfaces as an `Auth` or `ApiLevel` error instead.
pub fn is_valid_key_format(key: &str) -> bool {
    KEY_PATTERN.is_match(key)
}
