//! Shared HTTP plumbing for every vendor client.
//!
//! Maps transport failures, non-2xx statuses, and unparsable bodies onto the
//! `Network`, `Upstream`, and `MalformedResponse` error kinds so each wire
//! client only deals with its own request and response shapes.

use std::time::Duration;

use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, warn};

use sidechat_core::{Result, SidechatError};

use crate::registry::ProviderSpec;

/// Build the connection-pooled client shared by all providers.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| SidechatError::Network {
            provider: "http client".to_string(),
            message: e.to_string(),
        })
}

/// Send a request and turn any non-2xx status into `Upstream`.
pub async fn execute(spec: &ProviderSpec, request: RequestBuilder) -> Result<Response> {
    let response = request.send().await.map_err(|e| network_error(spec, e))?;

    let status = response.status();
    if status.is_success() {
        debug!(provider = spec.name, status = status.as_u16(), "upstream call succeeded");
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = extract_error_message(&body)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());

    warn!(
        provider = spec.name,
        status = status.as_u16(),
        message = %message,
        "upstream API error"
    );
    Err(SidechatError::Upstream {
        provider: spec.display_name.to_string(),
        status: status.as_u16(),
        message,
    })
}

/// Read a 2xx body as JSON into `T`.
pub async fn parse_json<T: DeserializeOwned>(spec: &ProviderSpec, response: Response) -> Result<T> {
    let bytes = response.bytes().await.map_err(|e| network_error(spec, e))?;
    serde_json::from_slice(&bytes).map_err(|e| {
        error!(provider = spec.name, error = %e, "failed to parse response body");
        malformed(spec, format!("invalid JSON body: {}", e))
    })
}

pub fn malformed(spec: &ProviderSpec, detail: impl Into<String>) -> SidechatError {
    SidechatError::MalformedResponse {
        provider: spec.display_name.to_string(),
        detail: detail.into(),
    }
}

fn network_error(spec: &ProviderSpec, err: reqwest::Error) -> SidechatError {
    let message = if err.is_timeout() {
        "request timed out".to_string()
    } else {
        err.to_string()
    };
    error!(provider = spec.name, error = %message, "HTTP request failed");
    SidechatError::Network {
        provider: spec.display_name.to_string(),
        message,
    }
}

/// Pull the vendor's human-readable message out of an error body.
///
/// Vendors disagree on the shape; checked in order: `error.message`,
/// `error` (string), `message`, `detail.message`.
fn extract_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let candidates = [
        value.pointer("/error/message"),
        value.get("error"),
        value.get("message"),
        value.pointer("/detail/message"),
    ];
    let message = candidates
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(String::from);
    message
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
