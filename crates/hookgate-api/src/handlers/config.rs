//! Non-secret configuration echo.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::{config::LogFormat, AppState};

/// Effective settings, without the signing secret.
#[derive(Debug, Serialize)]
pub struct ConfigEcho {
    /// Deployment environment name.
    pub environment: String,
    /// Service version.
    pub version: &'static str,
    /// Whether signatures are verified.
    pub signature_verification: bool,
    /// Whether loopback callers are refused.
    pub ip_validation_strict: bool,
    /// Whether `X-Forwarded-For` decides the caller address.
    pub trust_forwarded_for: bool,
    /// Number of ranges in the effective allow-list.
    pub allowed_ranges: usize,
    /// Body size limit in megabytes.
    pub max_payload_size_mb: usize,
    /// JSON nesting limit.
    pub max_payload_depth: usize,
    /// Rate limit budgets.
    pub rate_limits: RateLimitEcho,
    /// Whether `/metrics` is mounted.
    pub metrics_enabled: bool,
    /// Whether the health routes are mounted.
    pub health_check_enabled: bool,
    /// Log output format.
    pub log_format: LogFormat,
}

/// Rate limit budgets as configured.
#[derive(Debug, Serialize)]
pub struct RateLimitEcho {
    /// Requests per window across all callers.
    pub global: u32,
    /// Requests per window from one caller.
    pub per_ip: u32,
    /// Window length in seconds.
    pub window_seconds: u64,
}

/// Handles `GET /config`.
pub async fn config_echo(State(state): State<AppState>) -> Json<ConfigEcho> {
    let config = &state.config;
    let limits = config.to_rate_limits();

    Json(ConfigEcho {
        environment: config.environment.clone(),
        version: env!("CARGO_PKG_VERSION"),
        signature_verification: state.pipeline.policy().verify_signatures(),
        ip_validation_strict: config.ip_validation_strict,
        trust_forwarded_for: config.trust_forwarded_for,
        allowed_ranges: state.pipeline.policy().allow_list().len(),
        max_payload_size_mb: config.max_payload_size_mb,
        max_payload_depth: config.max_payload_depth,
        rate_limits: RateLimitEcho {
            global: limits.global,
            per_ip: limits.per_origin,
            window_seconds: limits.window.as_secs(),
        },
        metrics_enabled: config.enable_metrics,
        health_check_enabled: config.enable_health_check,
        log_format: config.log_format,
    })
}
