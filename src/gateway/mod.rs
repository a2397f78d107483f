// src/gateway/mod.rs
//!
//! API gateway for the constelia.ai member API
//!
//! Shape-checks the license key, throttles outbound calls, performs the
//! transfer against the fixed endpoint and classifies every reply into
//! one uniform result the UI can pattern-match on.
//!

pub mod classify;
pub mod commands;
pub mod dispatcher;
pub mod key;
pub mod rate_limit;
#[cfg(test)]
mod tests;
pub mod types;

pub use dispatcher::ApiGateway;
pub use types::{ApiRequest, ApiResult};
