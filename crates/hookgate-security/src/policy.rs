//! Immutable security policy value object.
//!
//! Built once at startup and shared read-only across requests. Holds the
//! compiled header rules, scanner and sanitizer patterns, the allow-list,
//! and the size and depth limits.

use thiserror::Error;
use tracing::{info, warn};

use crate::{
    headers::HeaderContract, origin::AllowList, sanitizer::Sanitizer, scanner::SensitiveScanner,
};

const BYTES_PER_MB: usize = 1024 * 1024;

/// Policy construction errors.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// A built-in pattern failed to compile.
    #[error("failed to compile pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// A limit was configured as zero.
    #[error("{0} must be greater than zero")]
    ZeroLimit(&'static str),
}

/// Tunables for building a `SecurityPolicy`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyConfig {
    /// Operator-supplied CIDR ranges added to the provider ranges.
    pub allowed_ranges: Vec<String>,
    /// When false, loopback callers bypass the allow-list.
    pub ip_validation_strict: bool,
    /// When false, the signature stage is skipped.
    pub verify_signatures: bool,
    /// Maximum body size in bytes.
    pub max_payload_bytes: usize,
    /// Maximum payload nesting depth.
    pub max_depth: usize,
}

impl PolicyConfig {
    /// Converts a megabyte limit to bytes.
    pub const fn megabytes(mb: usize) -> usize {
        mb.saturating_mul(BYTES_PER_MB)
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            allowed_ranges: Vec::new(),
            ip_validation_strict: true,
            verify_signatures: true,
            max_payload_bytes: Self::megabytes(10),
            max_depth: 64,
        }
    }
}

/// Compiled, read-only security policy.
#[derive(Debug, Clone)]
pub struct SecurityPolicy {
    headers: HeaderContract,
    allow_list: AllowList,
    scanner: SensitiveScanner,
    sanitizer: Sanitizer,
    verify_signatures: bool,
    max_payload_bytes: usize,
    max_depth: usize,
}

impl SecurityPolicy {
    /// Compiles every pattern and assembles the allow-list.
    ///
    /// # Errors
    ///
    /// `PolicyError::Pattern` if a built-in pattern fails to compile, or
    /// `PolicyError::ZeroLimit` for a zero size or depth limit.
    pub fn new(config: PolicyConfig) -> Result<Self, PolicyError> {
        if config.max_payload_bytes == 0 {
            return Err(PolicyError::ZeroLimit("max_payload_bytes"));
        }
        if config.max_depth == 0 {
            return Err(PolicyError::ZeroLimit("max_depth"));
        }

        let allow_list =
            AllowList::new(config.allowed_ranges.as_slice(), config.ip_validation_strict);
        if allow_list.is_empty() {
            warn!("allow-list has no valid ranges; every origin will be rejected");
        }
        if !config.verify_signatures {
            warn!("signature verification is disabled");
        }

        info!(
            ranges = allow_list.len(),
            strict = config.ip_validation_strict,
            max_payload_bytes = config.max_payload_bytes,
            max_depth = config.max_depth,
            "security policy built"
        );

        Ok(Self {
            headers: HeaderContract::new()?,
            allow_list,
            scanner: SensitiveScanner::new()?,
            sanitizer: Sanitizer::new()?,
            verify_signatures: config.verify_signatures,
            max_payload_bytes: config.max_payload_bytes,
            max_depth: config.max_depth,
        })
    }

    /// Header contract checker.
    pub fn headers(&self) -> &HeaderContract {
        &self.headers
    }

    /// Origin allow-list.
    pub fn allow_list(&self) -> &AllowList {
        &self.allow_list
    }

    /// Sensitive-content scanner.
    pub fn scanner(&self) -> &SensitiveScanner {
        &self.scanner
    }

    /// Payload sanitizer.
    pub fn sanitizer(&self) -> &Sanitizer {
        &self.sanitizer
    }

    /// Whether the signature stage runs.
    pub const fn verify_signatures(&self) -> bool {
        self.verify_signatures
    }

    /// Body size limit in bytes.
    pub const fn max_payload_bytes(&self) -> usize {
        self.max_payload_bytes
    }

    /// Payload nesting limit.
    pub const fn max_depth(&self) -> usize {
        self.max_depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_builds() {
        let policy = SecurityPolicy::new(PolicyConfig::default()).unwrap();

        assert!(policy.verify_signatures());
        assert_eq!(policy.max_payload_bytes(), 10 * 1024 * 1024);
        assert_eq!(policy.max_depth(), 64);
        assert!(policy.allow_list().check("140.82.112.5").is_ok());
    }

    #[test]
    fn zero_limits_are_rejected() {
        let config = PolicyConfig { max_payload_bytes: 0, ..PolicyConfig::default() };
        assert!(matches!(
            SecurityPolicy::new(config),
            Err(PolicyError::ZeroLimit("max_payload_bytes"))
        ));

        let config = PolicyConfig { max_depth: 0, ..PolicyConfig::default() };
        assert!(matches!(SecurityPolicy::new(config), Err(PolicyError::ZeroLimit("max_depth"))));
    }

    #[test]
    fn invalid_ranges_do_not_fail_construction() {
        let config = PolicyConfig {
            allowed_ranges: vec!["garbage".into(), "10.0.0.0/8".into()],
            ..PolicyConfig::default()
        };
        let policy = SecurityPolicy::new(config).unwrap();
        assert!(policy.allow_list().check("10.9.8.7").is_ok());
    }
}
