//! Ordered, short-circuiting admission pipeline.
//!
//! # Stage order
//!
//! ```text
//! Received ─▶ HeaderContract ─▶ SizeLimit ─▶ HeaderFormat ─▶ Signature ─▶ Origin
//!                  │                │              │              │           │
//!                  ▼                ▼              ▼              ▼           ▼
//!             ┌──────────────────────────────────────────────────────────────────┐
//!             │                       Rejected(GateError)                        │
//!             └──────────────────────────────────────────────────────────────────┘
//!                  ▲                                           ▲
//!                  │                                           │
//!               Parsed ─▶ Scanned (never rejects) ─▶ Sanitized ─▶ Dispatched
//! ```
//!
//! The first failing check ends the run. Later checks never execute, and an
//! admission is never revisited. Sensitive-content findings are reported but
//! never block.

use std::{fmt, sync::Arc};

use hookgate_core::{
    GateError, InboundBody, InboundRequest, PayloadNode, SecurityCategory, SecurityEvent,
    SecurityEventSink, Severity,
};
use hookgate_security::{PatternId, SecurityPolicy, SignatureVerifier};
use tracing::{debug, field, info, instrument, warn, Span};

use crate::dispatch::{DispatchContext, DispatchError, EventDispatcher, EventSummary};

/// Checkpoints a request passes through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    /// Request captured.
    Received,
    /// Required headers present.
    HeaderContract,
    /// Body within the size limit.
    SizeLimit,
    /// Header values well-formed.
    HeaderFormat,
    /// Signature verified.
    Signature,
    /// Caller address allowed.
    Origin,
    /// Body parsed into a payload tree.
    Parsed,
    /// Raw body scanned for sensitive content.
    Scanned,
    /// String leaves sanitized.
    Sanitized,
    /// Event handed to the dispatcher.
    Dispatched,
}

/// An admitted delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct Admission {
    /// Sanitized payload.
    pub payload: PayloadNode,
    /// Event type header value.
    pub event_type: String,
    /// Delivery identifier header value.
    pub delivery_id: String,
    /// Sensitive pattern ids found in the raw body.
    pub sensitive_patterns: Vec<PatternId>,
}

/// Terminal decision for one request.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// All checks passed.
    Admitted(Admission),
    /// A check failed.
    Rejected(GateError),
}

impl Verdict {
    /// Whether the request was admitted.
    pub const fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted(_))
    }

    /// The rejection reason, if any.
    pub const fn rejection(&self) -> Option<&GateError> {
        match self {
            Self::Rejected(error) => Some(error),
            Self::Admitted(_) => None,
        }
    }
}

/// Full record of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutcome {
    /// Admission decision.
    pub verdict: Verdict,
    /// Stages passed, in order.
    pub stages: Vec<PipelineStage>,
    /// Dispatcher result, present once the event was dispatched.
    pub dispatch: Option<Result<EventSummary, DispatchError>>,
}

impl PipelineOutcome {
    /// Last stage reached.
    pub fn last_stage(&self) -> PipelineStage {
        self.stages.last().copied().unwrap_or(PipelineStage::Received)
    }

    /// Whether the run reached dispatch.
    pub fn dispatched(&self) -> bool {
        self.last_stage() == PipelineStage::Dispatched
    }

    /// True when the raw-body scan or a handler flagged sensitive content.
    pub fn sensitive_data_detected(&self) -> bool {
        let scanned = match &self.verdict {
            Verdict::Admitted(admission) => !admission.sensitive_patterns.is_empty(),
            Verdict::Rejected(_) => false,
        };
        let flagged = matches!(
            &self.dispatch,
            Some(Ok(summary)) if !summary.commit_findings.is_empty()
        );
        scanned || flagged
    }
}

/// Composes the security checks and dispatcher into one admission decision.
///
/// Holds only shared read-only state, so one instance serves every request
/// concurrently.
#[derive(Clone)]
pub struct ValidationPipeline {
    policy: Arc<SecurityPolicy>,
    verifier: Arc<dyn SignatureVerifier>,
    dispatcher: Arc<EventDispatcher>,
    events: Arc<dyn SecurityEventSink>,
}

impl fmt::Debug for ValidationPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationPipeline")
            .field("verify_signatures", &self.policy.verify_signatures())
            .field("allowed_ranges", &self.policy.allow_list().len())
            .field("handlers", &self.dispatcher.event_types())
            .finish_non_exhaustive()
    }
}

impl ValidationPipeline {
    /// Creates a pipeline from its collaborators.
    pub fn new(
        policy: Arc<SecurityPolicy>,
        verifier: Arc<dyn SignatureVerifier>,
        dispatcher: Arc<EventDispatcher>,
        events: Arc<dyn SecurityEventSink>,
    ) -> Self {
        Self { policy, verifier, dispatcher, events }
    }

    /// The policy this pipeline enforces.
    pub fn policy(&self) -> &SecurityPolicy {
        &self.policy
    }

    /// The dispatcher admitted events are routed through.
    pub fn dispatcher(&self) -> &EventDispatcher {
        &self.dispatcher
    }

    /// Runs every stage against `request` and returns the outcome.
    #[instrument(
        name = "validation_pipeline",
        skip_all,
        fields(origin = %request.origin, delivery_id = field::Empty, event_type = field::Empty)
    )]
    pub fn run(&self, request: &InboundRequest) -> PipelineOutcome {
        let mut stages = vec![PipelineStage::Received];
        match self.admit(request, &mut stages) {
            Ok(admission) => {
                let ctx = DispatchContext {
                    event_type: &admission.event_type,
                    delivery_id: &admission.delivery_id,
                    payload: &admission.payload,
                    events: self.events.as_ref(),
                    received_at: request.received_at,
                };
                let dispatch = self.dispatcher.dispatch(&ctx);
                if let Err(error) = &dispatch {
                    warn!(error = %error, "event handler failed after admission");
                }
                stages.push(PipelineStage::Dispatched);
                info!(sensitive_patterns = admission.sensitive_patterns.len(), "delivery admitted");

                PipelineOutcome {
                    verdict: Verdict::Admitted(admission),
                    stages,
                    dispatch: Some(dispatch),
                }
            },
            Err(error) => {
                warn!(code = error.code(), stage = ?stages.last(), "delivery rejected");
                PipelineOutcome { verdict: Verdict::Rejected(error), stages, dispatch: None }
            },
        }
    }

    fn admit(
        &self,
        request: &InboundRequest,
        stages: &mut Vec<PipelineStage>,
    ) -> Result<Admission, GateError> {
        let policy = self.policy.as_ref();

        let headers = policy.headers().require(&request.headers)?;
        let span = Span::current();
        span.record("delivery_id", headers.delivery_id);
        span.record("event_type", headers.event_type);
        stages.push(PipelineStage::HeaderContract);

        let body = match &request.body {
            InboundBody::Complete(bytes) if bytes.len() <= policy.max_payload_bytes() => bytes,
            InboundBody::Complete(_) => {
                return Err(GateError::PayloadTooLarge { limit_bytes: policy.max_payload_bytes() });
            },
            InboundBody::Exceeded { limit_bytes } => {
                return Err(GateError::PayloadTooLarge { limit_bytes: *limit_bytes });
            },
        };
        stages.push(PipelineStage::SizeLimit);

        policy.headers().validate_format(&headers)?;
        stages.push(PipelineStage::HeaderFormat);

        if policy.verify_signatures() {
            if !self.verifier.verify(body, headers.signature) {
                let category = SecurityCategory::SignatureFailure;
                self.emit(request, category, Severity::High, headers.event_type);
                return Err(GateError::InvalidSignature);
            }
            stages.push(PipelineStage::Signature);
        } else {
            debug!("signature verification skipped");
        }

        if let Err(error) = policy.allow_list().check(&request.origin) {
            let category = match error {
                GateError::InvalidOrigin => SecurityCategory::InvalidOrigin,
                _ => SecurityCategory::ForbiddenOrigin,
            };
            self.emit(request, category, Severity::Critical, headers.event_type);
            return Err(error);
        }
        stages.push(PipelineStage::Origin);

        let payload = PayloadNode::parse(body, policy.max_depth())?;
        stages.push(PipelineStage::Parsed);

        let sensitive_patterns = policy.scanner().scan(&String::from_utf8_lossy(body));
        if !sensitive_patterns.is_empty() {
            warn!(patterns = ?sensitive_patterns, "sensitive content detected in payload");
            let category = SecurityCategory::SensitiveDataDetected;
            self.emit(request, category, Severity::Critical, headers.event_type);
        }
        stages.push(PipelineStage::Scanned);

        let payload = policy.sanitizer().sanitize(&payload);
        stages.push(PipelineStage::Sanitized);

        Ok(Admission {
            payload,
            event_type: headers.event_type.to_string(),
            delivery_id: headers.delivery_id.to_string(),
            sensitive_patterns,
        })
    }

    fn emit(
        &self,
        request: &InboundRequest,
        category: SecurityCategory,
        severity: Severity,
        event_type: &str,
    ) {
        let event = SecurityEvent::new(category, severity, event_type, request.received_at);
        self.events.record(&event);
    }
}
