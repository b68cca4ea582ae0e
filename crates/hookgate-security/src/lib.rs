//! Security checks for inbound webhook deliveries.
//!
//! Signature verification, header contract, origin allow-list, sensitive
//! content scanning, and payload sanitization, bundled into an immutable
//! `SecurityPolicy` built once at startup.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod headers;
pub mod origin;
pub mod policy;
pub mod sanitizer;
pub mod scanner;
pub mod signature;

pub use headers::{DeliveryHeaders, HeaderContract};
pub use origin::{AllowList, CidrError, CidrRange, PROVIDER_HOOK_RANGES};
pub use policy::{PolicyConfig, PolicyError, SecurityPolicy};
pub use sanitizer::Sanitizer;
pub use scanner::{PatternId, SensitiveScanner};
pub use signature::{sign, HmacSha256Verifier, SignatureError, SignatureVerifier, WebhookSecret};
