//! Inbound delivery representation.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::HeaderMap;

/// Body of an inbound delivery as seen by the gate.
///
/// The HTTP layer reads the body under a size cap. When the cap is hit the
/// bytes are dropped and only the fact of the overflow is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundBody {
    /// Entire body, read within the limit.
    Complete(Bytes),
    /// Body exceeded `limit_bytes` and was discarded.
    Exceeded {
        /// Limit that was hit.
        limit_bytes: usize,
    },
}

impl InboundBody {
    /// Raw bytes, if the body was read completely.
    pub fn bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Complete(bytes) => Some(bytes),
            Self::Exceeded { .. } => None,
        }
    }
}

impl From<Bytes> for InboundBody {
    fn from(bytes: Bytes) -> Self {
        Self::Complete(bytes)
    }
}

/// One webhook delivery as received.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    /// Request headers. Lookups are case-insensitive.
    pub headers: HeaderMap,
    /// Raw body bytes, unmodified.
    pub body: InboundBody,
    /// Textual caller address, possibly IPv4-mapped IPv6.
    pub origin: String,
    /// When the request reached the gate.
    pub received_at: DateTime<Utc>,
}

impl InboundRequest {
    /// Creates a request received now.
    pub fn new(
        headers: HeaderMap,
        body: impl Into<InboundBody>,
        origin: impl Into<String>,
    ) -> Self {
        Self { headers, body: body.into(), origin: origin.into(), received_at: Utc::now() }
    }

    /// Overrides the receive time, typically with the service clock.
    #[must_use]
    pub fn received_at(mut self, at: DateTime<Utc>) -> Self {
        self.received_at = at;
        self
    }

    /// Returns a header value as text when present, non-empty, and valid
    /// visible ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok()).filter(|v| !v.is_empty())
    }
}
