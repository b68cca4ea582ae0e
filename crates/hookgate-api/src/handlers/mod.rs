//! HTTP request handlers.

pub mod config;
pub mod health;
pub mod metrics;
pub mod webhook;

use std::net::SocketAddr;

use axum::{
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use hookgate_core::{Clock, GateError};
use hookgate_pipeline::dispatch::UNKNOWN;
use hookgate_security::headers::EVENT_HEADER;
use serde::Serialize;

use crate::middleware::RequestId;

pub use config::config_echo;
pub use health::{health_check, liveness_check, readiness_check};
pub use metrics::metrics_export;
pub use webhook::receive_webhook;

/// Header consulted for the caller address when forwarding is trusted.
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Error body returned for every rejection.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable code, e.g. `INVALID_SIGNATURE`.
    pub error: &'static str,
    /// Human-readable summary.
    pub message: &'static str,
    /// Extra detail that is safe to echo.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// When the rejection was produced.
    pub timestamp: DateTime<Utc>,
    /// Request id, also sent as `X-Request-Id`.
    pub request_id: String,
}

impl ErrorResponse {
    /// Builds the body for `error`.
    pub fn new(error: &GateError, request_id: &RequestId, timestamp: DateTime<Utc>) -> Self {
        Self {
            error: error.code(),
            message: error.message(),
            details: error.details(),
            timestamp,
            request_id: request_id.as_str().to_string(),
        }
    }
}

/// Renders `error` with its status code.
pub fn error_response(error: &GateError, request_id: &RequestId, clock: &dyn Clock) -> Response {
    let body = ErrorResponse::new(error, request_id, clock.now_utc());
    (error.status(), Json(body)).into_response()
}

/// Caller address for origin checks and per-origin limits.
///
/// With forwarding trusted, the first `X-Forwarded-For` entry wins and the
/// peer address is used only when the header is absent. The value is not
/// validated here; an unparseable entry is rejected by the origin check.
pub fn client_origin(headers: &HeaderMap, peer: SocketAddr, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        if let Some(value) = headers.get(FORWARDED_FOR_HEADER) {
            return value
                .to_str()
                .ok()
                .and_then(|list| list.split(',').next())
                .map(|first| first.trim().to_string())
                .unwrap_or_default();
        }
    }
    peer.ip().to_string()
}

/// Event type header value for metric labels, or `unknown`.
pub fn event_type_label(headers: &HeaderMap) -> &str {
    headers
        .get(EVENT_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .unwrap_or(UNKNOWN)
}
