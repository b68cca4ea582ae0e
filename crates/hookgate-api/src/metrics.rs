//! Prometheus metrics for webhook traffic and security events.
//!
//! `GateMetrics` owns its own registry so tests can build independent
//! instances. It also implements [`SecurityEventSink`], which lets the
//! pipeline count security events without knowing about Prometheus.

use std::{fmt, time::Duration};

use hookgate_core::{SecurityEvent, SecurityEventSink};
use prometheus::{
    exponential_buckets, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};
use thiserror::Error;

/// Maximum length for label values.
pub const MAX_LABEL_VALUE_LEN: usize = 64;

/// Errors from metric registration or export.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// A metric could not be created or registered.
    #[error("failed to register metric: {0}")]
    Registration(#[from] prometheus::Error),

    /// The registry could not be rendered.
    #[error("failed to encode metrics: {0}")]
    Encoding(String),
}

/// Webhook gate metrics.
#[derive(Clone)]
pub struct GateMetrics {
    registry: Registry,
    requests_total: IntCounterVec,
    errors_total: IntCounterVec,
    processing_duration: HistogramVec,
    security_events_total: IntCounterVec,
    active_connections: IntGauge,
}

impl fmt::Debug for GateMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GateMetrics").finish_non_exhaustive()
    }
}

impl GateMetrics {
    /// Creates and registers every metric in a fresh registry.
    ///
    /// # Errors
    ///
    /// Returns an error if a metric fails to register.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            Opts::new("hookgate_webhook_requests_total", "Webhook requests by outcome"),
            &["event_type", "status", "repository"],
        )?;
        registry.register(Box::new(requests_total.clone()))?;

        let errors_total = IntCounterVec::new(
            Opts::new("hookgate_webhook_errors_total", "Webhook rejections and failures by code"),
            &["error_type", "event_type"],
        )?;
        registry.register(Box::new(errors_total.clone()))?;

        let processing_duration = HistogramVec::new(
            HistogramOpts::new(
                "hookgate_webhook_processing_duration_seconds",
                "Time from body read to response",
            )
            .buckets(exponential_buckets(0.01, 2.0, 10)?),
            &["event_type", "status"],
        )?;
        registry.register(Box::new(processing_duration.clone()))?;

        let security_events_total = IntCounterVec::new(
            Opts::new("hookgate_webhook_security_events_total", "Security events by category"),
            &["category", "severity"],
        )?;
        registry.register(Box::new(security_events_total.clone()))?;

        let active_connections =
            IntGauge::new("hookgate_active_connections", "Requests currently being served")?;
        registry.register(Box::new(active_connections.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            errors_total,
            processing_duration,
            security_events_total,
            active_connections,
        })
    }

    /// Counts one finished request.
    pub fn record_request(&self, event_type: &str, status: &str, repository: &str) {
        self.requests_total
            .with_label_values(&[
                truncate_label(event_type),
                truncate_label(status),
                truncate_label(repository),
            ])
            .inc();
    }

    /// Counts one rejection or processing failure.
    pub fn record_error(&self, error_type: &str, event_type: &str) {
        self.errors_total
            .with_label_values(&[truncate_label(error_type), truncate_label(event_type)])
            .inc();
    }

    /// Observes request processing time.
    pub fn observe_duration(&self, event_type: &str, status: &str, duration: Duration) {
        self.processing_duration
            .with_label_values(&[truncate_label(event_type), truncate_label(status)])
            .observe(duration.as_secs_f64());
    }

    /// Current request count for a label set.
    pub fn request_count(&self, event_type: &str, status: &str, repository: &str) -> u64 {
        self.requests_total
            .with_label_values(&[
                truncate_label(event_type),
                truncate_label(status),
                truncate_label(repository),
            ])
            .get()
    }

    /// Current error count for a label set.
    pub fn error_count(&self, error_type: &str, event_type: &str) -> u64 {
        self.errors_total
            .with_label_values(&[truncate_label(error_type), truncate_label(event_type)])
            .get()
    }

    /// Current security event count for a label set.
    pub fn security_event_count(&self, category: &str, severity: &str) -> u64 {
        self.security_events_total.with_label_values(&[category, severity]).get()
    }

    /// Marks a request as in flight until the returned guard is dropped.
    #[must_use]
    pub fn track_connection(&self) -> ConnectionGuard {
        self.active_connections.inc();
        ConnectionGuard { gauge: self.active_connections.clone() }
    }

    /// Requests currently in flight.
    pub fn active_connections(&self) -> i64 {
        self.active_connections.get()
    }

    /// Renders every metric in the Prometheus text format.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn encode_text(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| MetricsError::Encoding(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| MetricsError::Encoding(e.to_string()))
    }
}

impl SecurityEventSink for GateMetrics {
    fn record(&self, event: &SecurityEvent) {
        self.security_events_total
            .with_label_values(&[event.category.as_str(), event.severity.as_str()])
            .inc();
    }
}

/// Decrements the active connections gauge on drop, including when the
/// request future is cancelled by a timeout.
#[derive(Debug)]
pub struct ConnectionGuard {
    gauge: IntGauge,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.gauge.dec();
    }
}

/// Truncates a label value on a character boundary.
fn truncate_label(value: &str) -> &str {
    if value.len() <= MAX_LABEL_VALUE_LEN {
        return value;
    }
    let mut end = MAX_LABEL_VALUE_LEN;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}
