//! Required header contract.
//!
//! Presence and shape are checked separately because the pipeline enforces
//! the body size limit between them.

use hookgate_core::GateError;
use http::HeaderMap;
use regex::Regex;

/// Delivery identifier header.
pub const DELIVERY_HEADER: &str = "X-GitHub-Delivery";
/// Event type header.
pub const EVENT_HEADER: &str = "X-GitHub-Event";
/// Signature header.
pub const SIGNATURE_HEADER: &str = "X-Hub-Signature-256";
/// User agent header.
pub const USER_AGENT_HEADER: &str = "User-Agent";

/// Required headers in check order.
pub const REQUIRED_HEADERS: [&str; 4] =
    [DELIVERY_HEADER, EVENT_HEADER, SIGNATURE_HEADER, USER_AGENT_HEADER];

const DELIVERY_PATTERN: &str = r"^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$";
const SIGNATURE_PATTERN: &str = r"^sha256=[a-f0-9]{64}$";
const USER_AGENT_PATTERN: &str = r"^GitHub-Hookshot/[a-f0-9]+$";

/// Values of the required headers, borrowed from the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryHeaders<'a> {
    /// Delivery identifier.
    pub delivery_id: &'a str,
    /// Event type name.
    pub event_type: &'a str,
    /// Supplied signature.
    pub signature: &'a str,
    /// Caller user agent.
    pub user_agent: &'a str,
}

/// Compiled header shape rules.
#[derive(Debug, Clone)]
pub struct HeaderContract {
    delivery_id: Regex,
    signature: Regex,
    user_agent: Regex,
}

impl HeaderContract {
    /// Compiles the header shape rules.
    ///
    /// # Errors
    ///
    /// Returns the regex error if a pattern fails to compile.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            delivery_id: Regex::new(DELIVERY_PATTERN)?,
            signature: Regex::new(SIGNATURE_PATTERN)?,
            user_agent: Regex::new(USER_AGENT_PATTERN)?,
        })
    }

    /// Collects the required headers.
    ///
    /// Absent and empty values both count as missing, and every missing name
    /// is reported at once.
    ///
    /// # Errors
    ///
    /// `MissingHeaders` listing each absent header, or `MalformedHeader` when
    /// a value is not visible ASCII.
    pub fn require<'a>(&self, headers: &'a HeaderMap) -> Result<DeliveryHeaders<'a>, GateError> {
        let mut values = [""; 4];
        let mut missing = Vec::new();

        for (slot, name) in values.iter_mut().zip(REQUIRED_HEADERS) {
            match headers.get(name) {
                Some(value) if !value.is_empty() => {
                    *slot = value.to_str().map_err(|_| GateError::MalformedHeader {
                        header: name,
                        reason: "value is not visible ASCII",
                    })?;
                },
                _ => missing.push(name),
            }
        }

        if !missing.is_empty() {
            return Err(GateError::MissingHeaders { headers: missing });
        }

        let [delivery_id, event_type, signature, user_agent] = values;
        Ok(DeliveryHeaders { delivery_id, event_type, signature, user_agent })
    }

    /// Checks the exact shape of the delivery id, signature and user agent.
    /// The event type is free-form.
    ///
    /// # Errors
    ///
    /// `MalformedHeader` naming the first header that breaks its rule.
    pub fn validate_format(&self, headers: &DeliveryHeaders<'_>) -> Result<(), GateError> {
        if !self.delivery_id.is_match(headers.delivery_id) {
            return Err(GateError::MalformedHeader {
                header: DELIVERY_HEADER,
                reason: "expected lowercase 8-4-4-4-12 hex UUID",
            });
        }
        if !self.signature.is_match(headers.signature) {
            return Err(GateError::MalformedHeader {
                header: SIGNATURE_HEADER,
                reason: "expected sha256= followed by 64 lowercase hex characters",
            });
        }
        if !self.user_agent.is_match(headers.user_agent) {
            return Err(GateError::MalformedHeader {
                header: USER_AGENT_HEADER,
                reason: "expected GitHub-Hookshot/<hex>",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use http::{HeaderName, HeaderValue};

    use super::*;

    const DELIVERY: &str = "72d3162e-cc78-11e3-81ab-4c9367dc0958";

    fn set(headers: &mut HeaderMap, name: &str, value: &str) {
        headers.insert(
            HeaderName::from_bytes(name.as_bytes()).unwrap(),
            HeaderValue::from_str(value).unwrap(),
        );
    }

    fn valid_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        set(&mut headers, DELIVERY_HEADER, DELIVERY);
        set(&mut headers, EVENT_HEADER, "push");
        set(&mut headers, SIGNATURE_HEADER, &format!("sha256={}", "ab".repeat(32)));
        set(&mut headers, USER_AGENT_HEADER, "GitHub-Hookshot/abc123");
        headers
    }

    #[test]
    fn valid_headers_pass_both_checks() {
        let contract = HeaderContract::new().unwrap();
        let headers = valid_headers();
        let found = contract.require(&headers).unwrap();

        assert_eq!(found.delivery_id, DELIVERY);
        assert_eq!(found.event_type, "push");
        assert!(contract.validate_format(&found).is_ok());
    }

    #[test]
    fn every_missing_header_is_reported() {
        let contract = HeaderContract::new().unwrap();
        let mut headers = valid_headers();
        headers.remove(DELIVERY_HEADER);
        set(&mut headers, USER_AGENT_HEADER, "");

        assert_eq!(
            contract.require(&headers).unwrap_err(),
            GateError::MissingHeaders { headers: vec![DELIVERY_HEADER, USER_AGENT_HEADER] }
        );
    }

    #[test]
    fn lookup_ignores_header_case() {
        let contract = HeaderContract::new().unwrap();
        let mut headers = HeaderMap::new();
        set(&mut headers, "x-github-delivery", DELIVERY);
        set(&mut headers, "X-GITHUB-EVENT", "ping");
        set(&mut headers, "x-hub-signature-256", &format!("sha256={}", "0".repeat(64)));
        set(&mut headers, "user-agent", "GitHub-Hookshot/1");

        assert_eq!(contract.require(&headers).unwrap().event_type, "ping");
    }

    #[test]
    fn non_ascii_value_is_malformed() {
        let contract = HeaderContract::new().unwrap();
        let mut headers = valid_headers();
        headers.insert(
            HeaderName::from_static("x-github-event"),
            HeaderValue::from_bytes("pu\u{00e9}sh".as_bytes()).unwrap(),
        );

        assert!(matches!(
            contract.require(&headers),
            Err(GateError::MalformedHeader { header: EVENT_HEADER, .. })
        ));
    }

    #[test]
    fn uppercase_delivery_id_is_malformed() {
        let contract = HeaderContract::new().unwrap();
        let mut headers = valid_headers();
        set(&mut headers, DELIVERY_HEADER, "72D3162E-CC78-11E3-81AB-4C9367DC0958");
        let found = contract.require(&headers).unwrap();

        assert!(matches!(
            contract.validate_format(&found),
            Err(GateError::MalformedHeader { header: DELIVERY_HEADER, .. })
        ));
    }

    #[test]
    fn short_signature_is_malformed() {
        let contract = HeaderContract::new().unwrap();
        let mut headers = valid_headers();
        set(&mut headers, SIGNATURE_HEADER, "sha256=abc");
        let found = contract.require(&headers).unwrap();

        assert!(matches!(
            contract.validate_format(&found),
            Err(GateError::MalformedHeader { header: SIGNATURE_HEADER, .. })
        ));
    }

    #[test]
    fn foreign_user_agent_is_malformed() {
        let contract = HeaderContract::new().unwrap();
        let agents = ["curl/8.0", "GitHub-Hookshot/", "GitHub-Hookshot/XYZ", "github-hookshot/abc"];
        for agent in agents {
            let mut headers = valid_headers();
            set(&mut headers, USER_AGENT_HEADER, agent);
            let found = contract.require(&headers).unwrap();

            assert!(
                matches!(
                    contract.validate_format(&found),
                    Err(GateError::MalformedHeader { header: USER_AGENT_HEADER, .. })
                ),
                "{agent} should be rejected"
            );
        }
    }
}
