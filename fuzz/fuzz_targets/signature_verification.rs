#![no_main]

//! Fuzz target for webhook signature verification.
//!
//! Feeds arbitrary bodies and signature header values to the HMAC verifier.
//! Verification must never panic, must reject every header that is not the
//! exact signature, and must accept the signature it computes itself.

use hookgate_security::{sign, HmacSha256Verifier, SignatureVerifier, WebhookSecret};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(secret) = WebhookSecret::new("fuzz-secret") else {
        return;
    };
    let verifier = HmacSha256Verifier::new(secret.clone());

    let split = data.first().map_or(0, |b| usize::from(*b)).min(data.len());
    let (header, body) = data.split_at(split);
    let header = String::from_utf8_lossy(header);

    let Ok(expected) = sign(body, &secret) else {
        return;
    };
    assert!(verifier.verify(body, &expected));
    if header != expected {
        assert!(!verifier.verify(body, &header));
    }
    let _ = verifier.verify(data, &header);
});
