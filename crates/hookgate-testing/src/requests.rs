//! Builder for signed inbound deliveries.

use bytes::Bytes;
use hookgate_core::{InboundBody, InboundRequest};
use hookgate_security::{
    headers::{DELIVERY_HEADER, EVENT_HEADER, SIGNATURE_HEADER, USER_AGENT_HEADER},
    sign, WebhookSecret,
};
use http::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use uuid::Uuid;

/// Shared secret used by test deliveries.
pub const TEST_SECRET: &str = "test-webhook-secret";
/// An address inside the provider hook ranges.
pub const PROVIDER_IP: &str = "140.82.112.5";
/// An address outside every default range.
pub const FOREIGN_IP: &str = "203.0.113.10";
/// A user agent matching the provider relay naming.
pub const HOOKSHOT_AGENT: &str = "GitHub-Hookshot/abc123";

/// Builds a delivery that passes every check unless told otherwise.
#[derive(Debug, Clone)]
pub struct DeliveryBuilder {
    secret: String,
    event_type: String,
    delivery_id: String,
    user_agent: String,
    origin: String,
    body: Bytes,
    signature: Option<String>,
    omitted: Vec<&'static str>,
    extra: Vec<(String, String)>,
    exceeded: Option<usize>,
}

impl DeliveryBuilder {
    /// A delivery of `event_type` carrying `body`.
    pub fn new(event_type: impl Into<String>, body: &Value) -> Self {
        Self {
            secret: TEST_SECRET.to_string(),
            event_type: event_type.into(),
            delivery_id: Uuid::new_v4().to_string(),
            user_agent: HOOKSHOT_AGENT.to_string(),
            origin: PROVIDER_IP.to_string(),
            body: Bytes::from(body.to_string()),
            signature: None,
            omitted: Vec::new(),
            extra: Vec::new(),
            exceeded: None,
        }
    }

    /// Replaces the body with raw bytes. The signature follows the new body.
    pub fn raw_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Signs with a different secret.
    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = secret.into();
        self
    }

    /// Sends this exact signature header value instead of a computed one.
    pub fn signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    /// Sets the delivery identifier header.
    pub fn delivery_id(mut self, id: impl Into<String>) -> Self {
        self.delivery_id = id.into();
        self
    }

    /// Sets the user agent header.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// Sets the caller address.
    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Leaves out one of the required headers.
    pub fn without(mut self, header: &'static str) -> Self {
        self.omitted.push(header);
        self
    }

    /// Adds an arbitrary header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((name.into(), value.into()));
        self
    }

    /// Marks the body as having overflowed the reader at `limit_bytes`.
    pub fn exceeded(mut self, limit_bytes: usize) -> Self {
        self.exceeded = Some(limit_bytes);
        self
    }

    /// Delivery identifier that will be sent.
    pub fn current_delivery_id(&self) -> &str {
        &self.delivery_id
    }

    /// Signature header value that will be sent.
    pub fn signature_value(&self) -> String {
        if let Some(signature) = &self.signature {
            return signature.clone();
        }
        WebhookSecret::new(self.secret.clone())
            .and_then(|secret| sign(&self.body, &secret))
            .unwrap_or_default()
    }

    /// Request headers.
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let signature = self.signature_value();
        let required = [
            (DELIVERY_HEADER, self.delivery_id.as_str()),
            (EVENT_HEADER, self.event_type.as_str()),
            (SIGNATURE_HEADER, signature.as_str()),
            (USER_AGENT_HEADER, self.user_agent.as_str()),
        ];

        for (name, value) in required {
            if !self.omitted.iter().any(|omitted| *omitted == name) {
                insert(&mut headers, name, value);
            }
        }
        insert(&mut headers, "content-type", "application/json");
        for (name, value) in &self.extra {
            insert(&mut headers, name, value);
        }
        headers
    }

    /// Body bytes as they will be sent.
    pub fn body(&self) -> Bytes {
        self.body.clone()
    }

    /// Builds the inbound request.
    pub fn build(self) -> InboundRequest {
        let headers = self.headers();
        let body = match self.exceeded {
            Some(limit_bytes) => InboundBody::Exceeded { limit_bytes },
            None => InboundBody::Complete(self.body),
        };
        InboundRequest::new(headers, body, self.origin)
    }
}

fn insert(headers: &mut HeaderMap, name: &str, value: &str) {
    if let (Ok(name), Ok(value)) =
        (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value))
    {
        headers.insert(name, value);
    }
}
