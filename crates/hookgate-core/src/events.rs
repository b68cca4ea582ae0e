//! Security events and the sinks that receive them.
//!
//! Pipeline stages and event handlers report notable findings as
//! `SecurityEvent`s. Sinks decide what to do with them: log, count, or
//! record for assertions. Events never carry the sensitive text that
//! triggered them.
//!
//! ```text
//! ┌──────────────────┐   SecurityEvent   ┌────────────────┐
//! │ Pipeline stages  │ ─────────────────▶│ MulticastSink  │
//! │ Event handlers   │                   └────────────────┘
//! └──────────────────┘                      │    │    │
//!                                           ▼    ▼    ▼
//!                                    tracing  metrics  test recorder
//! ```

use std::{fmt, sync::Arc};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Kind of security-relevant occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityCategory {
    /// Signature did not verify.
    SignatureFailure,
    /// Caller address was outside the allow-list.
    ForbiddenOrigin,
    /// Caller address could not be parsed.
    InvalidOrigin,
    /// Scanner or a handler found sensitive content.
    SensitiveDataDetected,
}

impl SecurityCategory {
    /// Stable snake_case label.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SignatureFailure => "signature_failure",
            Self::ForbiddenOrigin => "forbidden_origin",
            Self::InvalidOrigin => "invalid_origin",
            Self::SensitiveDataDetected => "sensitive_data_detected",
        }
    }
}

impl fmt::Display for SecurityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity assigned to a security event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational.
    Low,
    /// Worth a look.
    Medium,
    /// Likely attack or leak.
    High,
    /// Confirmed policy breach.
    Critical,
}

impl Severity {
    /// Stable lowercase label.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A security-relevant occurrence observed while processing a delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityEvent {
    /// What happened.
    pub category: SecurityCategory,
    /// How bad it is.
    pub severity: Severity,
    /// Event type header of the delivery, or "unknown" when not yet known.
    pub event_type: String,
    /// When the event was observed.
    pub timestamp: DateTime<Utc>,
}

impl SecurityEvent {
    /// Creates an event observed at `timestamp`.
    pub fn new(
        category: SecurityCategory,
        severity: Severity,
        event_type: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self { category, severity, event_type: event_type.into(), timestamp }
    }
}

/// Receiver of security events.
///
/// Recording must not fail or block the request path; sinks swallow their
/// own errors.
pub trait SecurityEventSink: Send + Sync + fmt::Debug {
    /// Records one event.
    fn record(&self, event: &SecurityEvent);
}

/// Sink that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpSink;

impl SecurityEventSink for NoOpSink {
    fn record(&self, _event: &SecurityEvent) {}
}

/// Sink that writes events to the structured log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl SecurityEventSink for TracingSink {
    fn record(&self, event: &SecurityEvent) {
        match event.severity {
            Severity::Critical | Severity::High => tracing::warn!(
                category = %event.category,
                severity = %event.severity,
                event_type = %event.event_type,
                "security event"
            ),
            Severity::Medium | Severity::Low => tracing::info!(
                category = %event.category,
                severity = %event.severity,
                event_type = %event.event_type,
                "security event"
            ),
        }
    }
}

/// Sink that forwards each event to every subscriber.
#[derive(Debug, Clone, Default)]
pub struct MulticastSink {
    sinks: Vec<Arc<dyn SecurityEventSink>>,
}

impl MulticastSink {
    /// Creates a multicast sink with no subscribers.
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    /// Adds a subscriber.
    pub fn add_subscriber(&mut self, sink: Arc<dyn SecurityEventSink>) {
        self.sinks.push(sink);
    }

    /// Builder form of `add_subscriber`.
    #[must_use]
    pub fn with_subscriber(mut self, sink: Arc<dyn SecurityEventSink>) -> Self {
        self.add_subscriber(sink);
        self
    }

    /// Returns the number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sinks.len()
    }
}

impl SecurityEventSink for MulticastSink {
    fn record(&self, event: &SecurityEvent) {
        for sink in &self.sinks {
            sink.record(event);
        }
    }
}
