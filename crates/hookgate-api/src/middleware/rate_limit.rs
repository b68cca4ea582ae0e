//! Rate limiting ahead of the webhook pipeline.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use hookgate_core::GateError;
use tracing::warn;

use crate::{
    handlers::{client_origin, error_response, event_type_label},
    middleware::RequestId,
    rate_limit::RateScope,
    AppState,
};

/// Axum middleware that rejects requests over the global or per-origin
/// budget with `429 RATE_LIMITED`.
///
/// Runs before the handler reads the body, so throttled callers never
/// reach signature verification.
pub async fn enforce_rate_limit(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Response {
    let origin = client_origin(req.headers(), peer, state.config.trust_forwarded_for);

    let denied = if !state.rate_limiter.allow(RateScope::Global) {
        Some(RateScope::Global)
    } else if !state.rate_limiter.allow(RateScope::PerOrigin(&origin)) {
        Some(RateScope::PerOrigin(&origin))
    } else {
        None
    };

    let Some(scope) = denied else {
        return next.run(req).await;
    };

    warn!(scope = scope.as_str(), origin = %origin, "rate limit exceeded");
    let error = GateError::RateLimited { scope: scope.as_str() };
    let event_type = event_type_label(req.headers());
    state.metrics.record_request(event_type, "rate_limited", "unknown");
    state.metrics.record_error(error.code(), event_type);

    let request_id = req.extensions().get::<RequestId>().cloned().unwrap_or_default();
    error_response(&error, &request_id, state.clock.as_ref())
}
