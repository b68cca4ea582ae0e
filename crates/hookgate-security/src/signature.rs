//! HMAC-SHA256 webhook signature verification.
//!
//! The provider signs the exact body bytes with the shared secret and sends
//! `sha256=<lowercase hex>` in `X-Hub-Signature-256`. Verification recomputes
//! the digest over the raw bytes, never a re-serialized form, and compares in
//! constant time.

use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Prefix carried by every signature header value.
pub const SIGNATURE_PREFIX: &str = "sha256=";

/// Signature setup errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// Shared secret is empty.
    #[error("webhook secret must not be empty")]
    EmptySecret,
    /// Secret was rejected by the MAC construction.
    #[error("invalid secret key")]
    InvalidSecret,
}

/// Shared signing secret. Its `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct WebhookSecret(String);

impl WebhookSecret {
    /// Wraps a secret, refusing an empty one.
    ///
    /// # Errors
    ///
    /// Returns `SignatureError::EmptySecret` for an empty string.
    pub fn new(secret: impl Into<String>) -> Result<Self, SignatureError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(SignatureError::EmptySecret);
        }
        Ok(Self(secret))
    }

    fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for WebhookSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WebhookSecret([REDACTED])")
    }
}

/// Checks a body against a supplied signature header value.
pub trait SignatureVerifier: Send + Sync + fmt::Debug {
    /// Returns true only when `signature` is the correct signature of `body`.
    /// Malformed input yields false, never a panic.
    fn verify(&self, body: &[u8], signature: &str) -> bool;
}

/// HMAC-SHA256 verifier keyed with the shared secret.
#[derive(Debug, Clone)]
pub struct HmacSha256Verifier {
    secret: WebhookSecret,
}

impl HmacSha256Verifier {
    /// Creates a verifier for the given secret.
    pub fn new(secret: WebhookSecret) -> Self {
        Self { secret }
    }
}

impl SignatureVerifier for HmacSha256Verifier {
    fn verify(&self, body: &[u8], signature: &str) -> bool {
        if !signature.starts_with(SIGNATURE_PREFIX) {
            return false;
        }

        match sign(body, &self.secret) {
            Ok(expected) => timing_safe_eq(expected.as_bytes(), signature.as_bytes()),
            Err(_) => false,
        }
    }
}

/// Computes the `sha256=<hex>` signature of `body`.
///
/// # Errors
///
/// Returns `SignatureError::InvalidSecret` if the MAC rejects the key.
pub fn sign(body: &[u8], secret: &WebhookSecret) -> Result<String, SignatureError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::InvalidSecret)?;
    mac.update(body);
    Ok(format!("{SIGNATURE_PREFIX}{}", hex::encode(mac.finalize().into_bytes())))
}

/// Constant-time comparison. Length is not secret: both sides are fixed
/// width for well-formed input.
fn timing_safe_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
