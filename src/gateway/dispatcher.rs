// src/gateway/dispatcher.rs
//!
//! Request dispatch against the vendor API
//!
//! One fixed endpoint, one ordering guarantee: key shape first, rate
//! admission second, transfer third, classification last. A request that
//! fails an early stage produces an `ApiResult::Error` without touching
//! the later ones; in particular nothing goes on the wire for a
//! malformed key or a full window.

use std::future::Future;

use tauri_plugin_http::reqwest;

use super::classify::classify;
use super::key::is_valid_key_format;
use super::rate_limit::RateLimiter;
use super::types::{ApiErrorKind, ApiMethod, ApiRequest, ApiResult};

/// Fixed vendor endpoint; every command goes through it.
pub const API_ENDPOINT: &str = "https://constelia.ai/api.php";

/// Parameters the dispatcher owns. Caller-supplied pairs with these
/// names are dropped during assembly.
const RESERVED_PARAMS: &[&str] = &["key", "cmd"];

/// A fully assembled wire transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct Transfer {
    /// Query pairs in send order: `cmd` first, caller parameters, `key` last
    pub query: Vec<(String, String)>,
    pub method: ApiMethod,
    /// Form-encoded body, POST only
    pub form: Option<Vec<(String, String)>>,
}

/// Raw outcome of one transfer, before classification.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Transport seam: the production impl speaks HTTP, tests count calls.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        transfer: Transfer,
    ) -> impl Future<Output = Result<RawResponse, String>> + Send;
}

/// Production transport over the shared reqwest client. No explicit
/// timeout: long downloads are expected and callers treat a hung call
/// like any other network failure once the transport gives up.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Transport for HttpTransport {
    fn send(
        &self,
        transfer: Transfer,
    ) -> impl Future<Output = Result<RawResponse, String>> + Send {
        let client = self.client.clone();
        async move {
            let mut builder = match transfer.method {
                ApiMethod::Get => client.get(API_ENDPOINT),
                ApiMethod::Post => client.post(API_ENDPOINT),
            };

            builder = builder.query(&transfer.query);
            if let Some(form) = &transfer.form {
                builder = builder.form(form);
            }

            let response = builder
                .send()
                .await
                .map_err(|e| format!("request failed: {e}"))?;

            let status = response.status().as_u16();
            let body = response
                .bytes()
                .await
                .map_err(|e| format!("failed to read response body: {e}"))?
                .to_vec();

            Ok(RawResponse { status, body })
        }
    }
}

/// Build the wire transfer for a request: `cmd` first, caller parameters
/// next with reserved names dropped, credential last. GET requests never
/// carry a form body.
pub fn assemble_transfer(key: &str, request: &ApiRequest) -> Transfer {
    let mut query = Vec::with_capacity(request.parameters.len() + 2);
    query.push(("cmd".to_string(), request.command.clone()));

    for (name, value) in &request.parameters {
        if RESERVED_PARAMS.contains(&name.as_str()) {
            println!(
                "[Gateway] Dropping reserved parameter '{}' supplied by caller",
                name
            );
            continue;
        }
        query.push((name.clone(), value.clone()));
    }

    query.push(("key".to_string(), key.to_string()));

    let form = match request.method {
        ApiMethod::Post => request.body.clone(),
        ApiMethod::Get => None,
    };

    Transfer {
        query,
        method: request.method,
        form,
    }
}

/// The gateway: shared rate limiter plus a transport.
pub struct ApiGateway<T: Transport = HttpTransport> {
    transport: T,
    limiter: RateLimiter,
}

impl ApiGateway<HttpTransport> {
    pub fn new() -> Self {
        Self::with_transport(HttpTransport::new())
    }
}

impl<T: Transport> ApiGateway<T> {
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            limiter: RateLimiter::for_api(),
        }
    }

    /// Dispatch one call. Every failure comes back as `ApiResult::Error`;
    /// the caller never sees a panic or a rejected future for a vendor or
    /// transport problem.
    pub async fn dispatch(&self, key: &str, request: &ApiRequest) -> ApiResult {
        if !is_valid_key_format(key) {
            return ApiResult::error(
                ApiErrorKind::InvalidKeyFormat,
                "license key must match XXXX-XXXX-XXXX-XXXX",
                None,
            );
        }

        if !self.limiter.try_admit() {
            return ApiResult::error(
                ApiErrorKind::RateLimited,
                format!(
                    "rate limit reached: {} calls per {} ms",
                    self.limiter.max_calls(),
                    self.limiter.window().as_millis()
                ),
                None,
            );
        }

        let transfer = assemble_transfer(key, request);
        match self.transport.send(transfer).await {
            Ok(raw) => classify(&request.command, raw.status, &raw.body),
            Err(reason) => {
                eprintln!("[Gateway] {} transfer failed: {}", request.command, reason);
                ApiResult::error(ApiErrorKind::Network, "network request failed", None)
            }
        }
    }
}
