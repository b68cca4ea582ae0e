//! Webhook intake handler.
//!
//! Reads the body up to the configured limit, hands the request to the
//! validation pipeline, and maps the outcome to a response.

use std::{net::SocketAddr, time::Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use hookgate_core::{GateError, InboundBody, InboundRequest};
use hookgate_pipeline::{EventSummary, PipelineOutcome, Verdict};
use hookgate_security::PatternId;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use serde::Serialize;
use tracing::{info, instrument, warn, Span};

use crate::{
    handlers::{client_origin, error_response, event_type_label},
    middleware::RequestId,
    AppState,
};

/// Response for an admitted delivery.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    /// Always `success`.
    pub status: &'static str,
    /// Delivery identifier header value.
    pub delivery_id: String,
    /// Event type header value.
    pub event_type: String,
    /// Time spent in the gate.
    pub processing_time_ms: u64,
    /// When the response was produced.
    pub timestamp: DateTime<Utc>,
    /// What the gate learned about the delivery.
    pub metadata: DeliveryMetadata,
}

/// Observability fields attached to a successful response.
#[derive(Debug, Serialize)]
pub struct DeliveryMetadata {
    /// Every security check passed.
    pub security_checks_passed: bool,
    /// The scanner or the push handler flagged sensitive content.
    pub sensitive_data_detected: bool,
    /// Scanner pattern ids that matched the raw body.
    pub sensitive_patterns: Vec<PatternId>,
    /// Fields extracted by the event handler.
    #[serde(flatten)]
    pub event: EventSummary,
}

/// Handles `POST /webhook/github`.
///
/// Returns:
/// - 200 with a [`WebhookResponse`] when admitted and dispatched
/// - 4xx with the rejection code when any check fails
/// - 500 `PROCESSING_ERROR` when admitted but the event handler failed
#[instrument(name = "receive_webhook", skip_all)]
pub async fn receive_webhook(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let started = state.clock.now();
    let event_type = event_type_label(&headers).to_string();
    let origin = client_origin(&headers, peer, state.config.trust_forwarded_for);

    let body = match read_body(body, state.config.max_payload_bytes()).await {
        Ok(body) => body,
        Err(error) => return reject(&state, &request_id, &event_type, started, &error),
    };

    let request = InboundRequest::new(headers, body, origin).received_at(state.clock.now_utc());
    match run_pipeline(&state, request).await {
        Ok(outcome) => respond(&state, &request_id, &event_type, started, outcome),
        Err(error) => reject(&state, &request_id, &event_type, started, &error),
    }
}

/// Runs the CPU-bound checks on the blocking pool so a large body never
/// stalls an async worker.
async fn run_pipeline(
    state: &AppState,
    request: InboundRequest,
) -> Result<PipelineOutcome, GateError> {
    let pipeline = state.pipeline.clone();
    let span = Span::current();
    tokio::task::spawn_blocking(move || span.in_scope(|| pipeline.run(&request))).await.map_err(
        |error| {
            warn!(error = %error, "validation pipeline task failed");
            GateError::Processing("validation did not complete".to_string())
        },
    )
}

/// Reads at most `limit` bytes; a longer body becomes `Exceeded` so the
/// pipeline can still report missing headers first.
async fn read_body(body: Body, limit: usize) -> Result<InboundBody, GateError> {
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(InboundBody::Complete(collected.to_bytes())),
        Err(error) if error.downcast_ref::<LengthLimitError>().is_some() => {
            Ok(InboundBody::Exceeded { limit_bytes: limit })
        },
        Err(error) => {
            warn!(error = %error, "failed to read request body");
            Err(GateError::InvalidPayload("request body could not be read".to_string()))
        },
    }
}

fn respond(
    state: &AppState,
    request_id: &RequestId,
    event_type: &str,
    started: Instant,
    outcome: PipelineOutcome,
) -> Response {
    let sensitive_data_detected = outcome.sensitive_data_detected();
    let PipelineOutcome { verdict, dispatch, .. } = outcome;

    let admission = match verdict {
        Verdict::Admitted(admission) => admission,
        Verdict::Rejected(error) => return reject(state, request_id, event_type, started, &error),
    };

    let summary = match dispatch {
        Some(Ok(summary)) => summary,
        Some(Err(error)) => {
            let error = GateError::Processing(error.to_string());
            return reject(state, request_id, event_type, started, &error);
        },
        None => {
            let error = GateError::Processing("event was not dispatched".to_string());
            return reject(state, request_id, event_type, started, &error);
        },
    };

    let elapsed = state.clock.now().saturating_duration_since(started);
    state.metrics.record_request(event_type, "success", &summary.repository);
    state.metrics.observe_duration(event_type, "success", elapsed);

    info!(
        request_id = request_id.as_str(),
        delivery_id = %admission.delivery_id,
        repository = %summary.repository,
        sensitive_data_detected,
        "webhook accepted"
    );

    let response = WebhookResponse {
        status: "success",
        delivery_id: admission.delivery_id,
        event_type: admission.event_type,
        processing_time_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        timestamp: state.clock.now_utc(),
        metadata: DeliveryMetadata {
            security_checks_passed: true,
            sensitive_data_detected,
            sensitive_patterns: admission.sensitive_patterns,
            event: summary,
        },
    };

    (StatusCode::OK, Json(response)).into_response()
}

fn reject(
    state: &AppState,
    request_id: &RequestId,
    event_type: &str,
    started: Instant,
    error: &GateError,
) -> Response {
    let status = if error.status().is_server_error() { "error" } else { "rejected" };
    let elapsed = state.clock.now().saturating_duration_since(started);

    state.metrics.record_request(event_type, status, "unknown");
    state.metrics.record_error(error.code(), event_type);
    state.metrics.observe_duration(event_type, status, elapsed);

    if error.is_security_failure() {
        warn!(request_id = request_id.as_str(), code = error.code(), "webhook rejected");
    } else {
        info!(request_id = request_id.as_str(), code = error.code(), "webhook rejected");
    }

    error_response(error, request_id, state.clock.as_ref())
}
