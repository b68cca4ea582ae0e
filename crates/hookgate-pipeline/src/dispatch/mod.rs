//! Event-type routing for admitted deliveries.
//!
//! Handlers are looked up by the event type header. Each one extracts a
//! small summary for observability and may run type-specific secondary
//! checks. Unknown event types get a default summary and are only logged;
//! dispatch never rejects on event type.

mod alerts;
mod pull_request;
mod push;

use std::{collections::HashMap, fmt, sync::Arc};

use chrono::{DateTime, Utc};
use hookgate_core::{PayloadNode, SecurityEventSink};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

pub use alerts::{CodeScanningAlertHandler, DependabotAlertHandler, SecretScanningAlertHandler};
pub use pull_request::PullRequestHandler;
pub use push::{CommitFinding, PushHandler, SENSITIVE_FILE_FRAGMENTS, SENSITIVE_KEYWORDS};

/// Placeholder for absent repository and sender fields.
pub const UNKNOWN: &str = "unknown";

/// Handler failures after admission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// A field had an unexpected node kind.
    #[error("field `{field}` must be {expected}, found {found}")]
    MalformedField {
        /// Dot path of the offending field.
        field: String,
        /// Kind the handler needs.
        expected: &'static str,
        /// Kind actually present.
        found: &'static str,
    },
}

/// Fields extracted from an admitted event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EventSummary {
    /// Repository full name, or `unknown`.
    pub repository: String,
    /// Actor login, or `unknown`.
    pub sender: String,
    /// Event action, when the event carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Pull request number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull_request_number: Option<i64>,
    /// Alert number for scanning and dependency alerts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_number: Option<i64>,
    /// Rule or advisory severity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    /// Code scanning rule identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    /// Secret type reported by secret scanning.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_type: Option<String>,
    /// Advisory identifier for dependency alerts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advisory_id: Option<String>,
    /// Commits flagged by the push handler.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub commit_findings: Vec<CommitFinding>,
}

impl EventSummary {
    /// Summary with only repository and sender filled in.
    pub fn basic(payload: &PayloadNode) -> Self {
        Self {
            repository: text_or_unknown(payload, "repository.full_name"),
            sender: text_or_unknown(payload, "sender.login"),
            ..Self::default()
        }
    }
}

/// Inputs handed to an event handler.
pub struct DispatchContext<'a> {
    /// Event type header value.
    pub event_type: &'a str,
    /// Delivery identifier.
    pub delivery_id: &'a str,
    /// Sanitized payload.
    pub payload: &'a PayloadNode,
    /// Destination for secondary security findings.
    pub events: &'a dyn SecurityEventSink,
    /// When the delivery reached the gate; stamps emitted events.
    pub received_at: DateTime<Utc>,
}

impl fmt::Debug for DispatchContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchContext")
            .field("event_type", &self.event_type)
            .field("delivery_id", &self.delivery_id)
            .finish_non_exhaustive()
    }
}

/// Processor for one event type.
pub trait EventHandler: Send + Sync + fmt::Debug {
    /// Extracts a summary and runs any type-specific checks.
    ///
    /// # Errors
    ///
    /// `DispatchError` when the payload does not have the shape the handler
    /// needs.
    fn handle(&self, ctx: &DispatchContext<'_>) -> Result<EventSummary, DispatchError>;
}

/// Registry mapping event type names to handlers.
#[derive(Debug, Clone, Default)]
pub struct EventDispatcher {
    handlers: HashMap<&'static str, Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    /// Dispatcher with no handlers; every event takes the default branch.
    pub fn empty() -> Self {
        Self { handlers: HashMap::new() }
    }

    /// Dispatcher with the built-in handlers registered.
    pub fn with_default_handlers() -> Self {
        Self::empty()
            .with_handler("push", Arc::new(PushHandler))
            .with_handler("pull_request", Arc::new(PullRequestHandler))
            .with_handler("secret_scanning_alert", Arc::new(SecretScanningAlertHandler))
            .with_handler("code_scanning_alert", Arc::new(CodeScanningAlertHandler))
            .with_handler("dependabot_alert", Arc::new(DependabotAlertHandler))
    }

    /// Registers or replaces the handler for `event_type`.
    #[must_use]
    pub fn with_handler(
        mut self,
        event_type: &'static str,
        handler: Arc<dyn EventHandler>,
    ) -> Self {
        self.handlers.insert(event_type, handler);
        self
    }

    /// Whether a dedicated handler exists for `event_type`.
    pub fn handles(&self, event_type: &str) -> bool {
        self.handlers.contains_key(event_type)
    }

    /// Event types with a dedicated handler, sorted.
    pub fn event_types(&self) -> Vec<&'static str> {
        let mut types: Vec<_> = self.handlers.keys().copied().collect();
        types.sort_unstable();
        types
    }

    /// Routes an admitted event to its handler.
    ///
    /// # Errors
    ///
    /// Propagates the handler's `DispatchError`.
    pub fn dispatch(&self, ctx: &DispatchContext<'_>) -> Result<EventSummary, DispatchError> {
        match self.handlers.get(ctx.event_type) {
            Some(handler) => handler.handle(ctx),
            None => {
                let summary = EventSummary::basic(ctx.payload);
                info!(
                    event_type = ctx.event_type,
                    delivery_id = ctx.delivery_id,
                    repository = %summary.repository,
                    "no handler for event type"
                );
                Ok(summary)
            },
        }
    }
}

fn text_or_unknown(payload: &PayloadNode, path: &str) -> String {
    text_at(payload, path).unwrap_or_else(|| UNKNOWN.to_string())
}

fn text_at(payload: &PayloadNode, path: &str) -> Option<String> {
    payload.get_path(path).and_then(PayloadNode::as_str).map(str::to_string)
}

fn int_at(payload: &PayloadNode, path: &str) -> Option<i64> {
    payload.get_path(path).and_then(PayloadNode::as_i64)
}

/// Returns the object at `path`, `None` when absent or null.
fn object_at<'a>(
    payload: &'a PayloadNode,
    path: &str,
) -> Result<Option<&'a PayloadNode>, DispatchError> {
    match payload.get_path(path) {
        None | Some(PayloadNode::Scalar(hookgate_core::Scalar::Null)) => Ok(None),
        Some(node @ PayloadNode::Object(_)) => Ok(Some(node)),
        Some(other) => Err(malformed(path, "an object", other)),
    }
}

fn malformed(field: &str, expected: &'static str, found: &PayloadNode) -> DispatchError {
    DispatchError::MalformedField { field: field.to_string(), expected, found: found.kind() }
}
