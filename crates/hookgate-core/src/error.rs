//! Error taxonomy for webhook admission.
//!
//! Every way a delivery can be turned away maps to exactly one `GateError`
//! variant. Each variant carries a stable machine code for callers, an HTTP
//! status class, and a fixed human-readable summary. Details echoed back to
//! the caller never include secret material: no digests, no signing key, no
//! matched sensitive text.

use http::StatusCode;
use thiserror::Error;

/// Result type alias using `GateError`.
pub type Result<T> = std::result::Result<T, GateError>;

/// Rejection reasons produced by the admission pipeline and HTTP surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    // Client input
    /// One or more required headers are absent or empty.
    #[error("missing required headers: {}", .headers.join(", "))]
    MissingHeaders {
        /// Canonical names of the missing headers, in check order.
        headers: Vec<&'static str>,
    },

    /// A required header is present but syntactically wrong.
    #[error("invalid {header} header: {reason}")]
    MalformedHeader {
        /// Canonical header name.
        header: &'static str,
        /// Which shape rule the value broke.
        reason: &'static str,
    },

    /// Body exceeded the configured size limit.
    #[error("payload size exceeded {limit_bytes} byte limit")]
    PayloadTooLarge {
        /// Limit that was exceeded, in bytes.
        limit_bytes: usize,
    },

    /// Body is not a JSON object.
    #[error("invalid JSON payload: {0}")]
    InvalidPayload(String),

    /// Parsed body nests deeper than the configured limit.
    #[error("payload nesting exceeds maximum depth of {max_depth}")]
    PayloadTooDeep {
        /// Configured maximum depth.
        max_depth: usize,
    },

    // Authentication and authorization
    /// Keyed digest over the body did not match the supplied signature.
    #[error("webhook signature verification failed")]
    InvalidSignature,

    /// Caller address is valid but outside every allowed range.
    #[error("origin address is not in an allowed range")]
    ForbiddenOrigin,

    /// Caller address could not be parsed.
    #[error("origin address could not be parsed")]
    InvalidOrigin,

    /// A rate limit scope refused admission.
    #[error("rate limit exceeded for {scope} scope")]
    RateLimited {
        /// Name of the scope that refused.
        scope: &'static str,
    },

    // Processing
    /// An event handler failed after admission.
    #[error("event processing failed: {0}")]
    Processing(String),
}

impl GateError {
    /// Returns the machine-readable error code sent to callers.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingHeaders { .. } => "MISSING_HEADERS",
            Self::MalformedHeader { .. } => "INVALID_HEADERS",
            Self::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            Self::InvalidPayload(_) | Self::PayloadTooDeep { .. } => "INVALID_PAYLOAD",
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::ForbiddenOrigin => "FORBIDDEN_IP",
            Self::InvalidOrigin => "INVALID_ORIGIN",
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::Processing(_) => "PROCESSING_ERROR",
        }
    }

    /// Returns the HTTP status for this rejection.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MissingHeaders { .. }
            | Self::MalformedHeader { .. }
            | Self::InvalidPayload(_)
            | Self::PayloadTooDeep { .. } => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::InvalidSignature => StatusCode::UNAUTHORIZED,
            Self::ForbiddenOrigin | Self::InvalidOrigin => StatusCode::FORBIDDEN,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Processing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a fixed summary suitable for the response `message` field.
    pub const fn message(&self) -> &'static str {
        match self {
            Self::MissingHeaders { .. } => "Required headers are missing",
            Self::MalformedHeader { .. } => "Header validation failed",
            Self::PayloadTooLarge { .. } => "Payload size exceeds configured limit",
            Self::InvalidPayload(_) => "Invalid JSON payload",
            Self::PayloadTooDeep { .. } => "Payload nesting too deep",
            Self::InvalidSignature => "Webhook signature verification failed",
            Self::ForbiddenOrigin => "Access denied: IP not allowed",
            Self::InvalidOrigin => "Access denied: IP address invalid",
            Self::RateLimited { .. } => "Rate limit exceeded",
            Self::Processing(_) => "Event processing failed",
        }
    }

    /// Returns extra detail that is safe to echo to the caller.
    ///
    /// Authentication and authorization failures return `None` so nothing
    /// about the expected digest or the allow-list leaks.
    pub fn details(&self) -> Option<String> {
        match self {
            Self::MissingHeaders { .. }
            | Self::MalformedHeader { .. }
            | Self::PayloadTooLarge { .. }
            | Self::PayloadTooDeep { .. }
            | Self::RateLimited { .. } => Some(self.to_string()),
            Self::InvalidPayload(reason) | Self::Processing(reason) => Some(reason.clone()),
            Self::InvalidSignature | Self::ForbiddenOrigin | Self::InvalidOrigin => None,
        }
    }

    /// Whether the rejection is a security-relevant authentication or
    /// authorization failure.
    pub const fn is_security_failure(&self) -> bool {
        matches!(self, Self::InvalidSignature | Self::ForbiddenOrigin | Self::InvalidOrigin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_match_wire_contract() {
        let missing = GateError::MissingHeaders { headers: vec!["X-GitHub-Delivery"] };
        assert_eq!(missing.code(), "MISSING_HEADERS");
        assert_eq!(GateError::InvalidSignature.code(), "INVALID_SIGNATURE");
        assert_eq!(GateError::ForbiddenOrigin.code(), "FORBIDDEN_IP");
        assert_eq!(GateError::PayloadTooLarge { limit_bytes: 10 }.code(), "PAYLOAD_TOO_LARGE");
        assert_eq!(GateError::InvalidPayload("eof".into()).code(), "INVALID_PAYLOAD");
        assert_eq!(GateError::PayloadTooDeep { max_depth: 4 }.code(), "INVALID_PAYLOAD");
        assert_eq!(GateError::Processing("boom".into()).code(), "PROCESSING_ERROR");
    }

    #[test]
    fn status_classes_follow_error_kind() {
        assert_eq!(
            GateError::MalformedHeader { header: "User-Agent", reason: "bad" }.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GateError::PayloadTooLarge { limit_bytes: 1 }.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(GateError::InvalidSignature.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(GateError::ForbiddenOrigin.status(), StatusCode::FORBIDDEN);
        assert_eq!(GateError::InvalidOrigin.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            GateError::RateLimited { scope: "global" }.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(GateError::Processing("x".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn security_failures_carry_no_details() {
        assert!(GateError::InvalidSignature.details().is_none());
        assert!(GateError::ForbiddenOrigin.details().is_none());
        assert!(GateError::InvalidOrigin.details().is_none());
        assert!(GateError::InvalidSignature.is_security_failure());
        assert!(!GateError::InvalidPayload("x".into()).is_security_failure());
    }

    #[test]
    fn missing_headers_lists_every_name() {
        let error = GateError::MissingHeaders { headers: vec!["X-GitHub-Delivery", "User-Agent"] };
        assert_eq!(error.to_string(), "missing required headers: X-GitHub-Delivery, User-Agent");
    }
}
