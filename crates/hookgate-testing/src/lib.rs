//! Shared test fixtures for the hookgate workspace.
//!
//! Payload fixtures, a builder for correctly signed deliveries, and test
//! doubles for the security event sink and signature verifier.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod doubles;
pub mod fixtures;
pub mod requests;

use std::sync::Arc;

pub use doubles::{CountingVerifier, RecordingSink};
pub use requests::{DeliveryBuilder, FOREIGN_IP, HOOKSHOT_AGENT, PROVIDER_IP, TEST_SECRET};

use hookgate_security::{HmacSha256Verifier, SignatureVerifier, WebhookSecret};

/// HMAC verifier keyed with `TEST_SECRET`.
pub fn test_verifier() -> Arc<dyn SignatureVerifier> {
    match WebhookSecret::new(TEST_SECRET) {
        Ok(secret) => Arc::new(HmacSha256Verifier::new(secret)),
        Err(_) => unreachable!("TEST_SECRET is non-empty"),
    }
}
