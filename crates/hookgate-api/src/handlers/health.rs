//! Health check handlers for service monitoring.
//!
//! Provides liveness, readiness, and health endpoints for orchestration
//! systems. The gate keeps no external connections, so health reflects the
//! state of the loaded security policy and the event dispatcher.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use hookgate_core::Clock;
use hookgate_pipeline::ValidationPipeline;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::AppState;

/// Health check response structure.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall service health status
    pub status: HealthStatus,
    /// Timestamp when health check was performed
    pub timestamp: DateTime<Utc>,
    /// Seconds since the service state was built
    pub uptime_seconds: u64,
    /// Individual component health checks
    pub checks: HealthChecks,
    /// Service version information
    pub version: String,
}

/// Overall health status enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// All systems operational
    Healthy,
    /// Some non-critical issues detected
    Degraded,
    /// Critical systems failing
    Unhealthy,
}

/// Individual component health check results.
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    /// Origin allow-list and verification settings
    pub security_policy: ComponentHealth,
    /// Event handler registry
    pub event_dispatcher: ComponentHealth,
}

/// Health status for individual components.
#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    /// Component status
    pub status: ComponentStatus,
    /// Optional message when the component is not fully up
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ComponentHealth {
    const fn up() -> Self {
        Self { status: ComponentStatus::Up, message: None }
    }

    fn with(status: ComponentStatus, message: &str) -> Self {
        Self { status, message: Some(message.to_string()) }
    }
}

/// Component-level health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    /// Component is healthy
    Up,
    /// Component works with reduced protection
    Degraded,
    /// Component cannot serve requests
    Down,
}

/// Health service that encapsulates clock dependency for testable health
/// checks.
pub struct HealthService {
    clock: Arc<dyn Clock>,
}

impl HealthService {
    /// Creates a new health service with the given clock.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Inspects the pipeline and reports component health.
    pub fn health_check(
        &self,
        pipeline: &ValidationPipeline,
        uptime_seconds: u64,
    ) -> HealthResponse {
        debug!("Performing health check");

        let security_policy = Self::check_policy(pipeline);
        let event_dispatcher = Self::check_dispatcher(pipeline);

        let statuses = [security_policy.status, event_dispatcher.status];
        let status = if statuses.contains(&ComponentStatus::Down) {
            HealthStatus::Unhealthy
        } else if statuses.contains(&ComponentStatus::Degraded) {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };

        HealthResponse {
            status,
            timestamp: self.clock.now_utc(),
            uptime_seconds,
            checks: HealthChecks { security_policy, event_dispatcher },
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    fn check_policy(pipeline: &ValidationPipeline) -> ComponentHealth {
        let policy = pipeline.policy();
        if policy.allow_list().is_empty() {
            ComponentHealth::with(ComponentStatus::Down, "origin allow-list has no ranges")
        } else if !policy.verify_signatures() {
            ComponentHealth::with(ComponentStatus::Degraded, "signature verification disabled")
        } else {
            ComponentHealth::up()
        }
    }

    fn check_dispatcher(pipeline: &ValidationPipeline) -> ComponentHealth {
        if pipeline.dispatcher().event_types().is_empty() {
            ComponentHealth::with(ComponentStatus::Degraded, "no event handlers registered")
        } else {
            ComponentHealth::up()
        }
    }
}

fn uptime_seconds(app_state: &AppState) -> u64 {
    app_state.clock.now().saturating_duration_since(app_state.started_at).as_secs()
}

/// Health check endpoint handler, served on `/health` and `/healthz`.
#[instrument(name = "health_check", skip(app_state))]
pub async fn health_check(State(app_state): State<AppState>) -> Response {
    let health_service = HealthService::new(app_state.clock.clone());
    let response = health_service.health_check(&app_state.pipeline, uptime_seconds(&app_state));

    let status_code = match response.status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    debug!(status = ?response.status, "Health check completed");

    (status_code, Json(response)).into_response()
}

/// Readiness endpoint for Kubernetes.
///
/// Ready once the policy and dispatcher pass the health check.
#[instrument(name = "readiness_check", skip(app_state))]
pub async fn readiness_check(State(app_state): State<AppState>) -> Response {
    health_check(State(app_state)).await
}

/// Liveness endpoint for Kubernetes.
///
/// Returns a simple response indicating the service process is alive.
#[instrument(name = "liveness_check", skip(app_state))]
pub async fn liveness_check(State(app_state): State<AppState>) -> Response {
    debug!("Performing liveness check");

    let response = serde_json::json!({
        "status": "alive",
        "timestamp": app_state.clock.now_utc(),
        "service": "hookgate"
    });

    (StatusCode::OK, Json(response)).into_response()
}
