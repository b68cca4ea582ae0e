//! Configuration management for the hookgate service.

use std::{fmt, net::SocketAddr, str::FromStr, time::Duration};

use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use hookgate_security::PolicyConfig;
use serde::{Deserialize, Serialize};

use crate::rate_limit::RateLimits;

const CONFIG_FILE: &str = "config.toml";

/// Rate limits are counted over one-minute windows.
pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);

/// Shared signing secret that never prints.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct SecretString(String);

impl SecretString {
    /// Wraps a secret value.
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Returns the raw secret.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether no secret was configured.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per line.
    Json,
}

/// Complete service configuration with defaults, file, and environment
/// overrides.
///
/// Configuration is loaded in priority order:
/// 1. Environment variables (highest priority)
/// 2. Configuration file (`config.toml`)
/// 3. Built-in defaults (lowest priority)
///
/// Every setting has a default except `webhook_secret`, which must be
/// provided or the service refuses to start.
///
/// # Example
///
/// ```no_run
/// use hookgate_api::Config;
///
/// let config = Config::load().expect("Failed to load configuration");
///
/// println!("Server will bind to {}:{}", config.host, config.port);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server
    /// Server bind address.
    ///
    /// Environment variable: `HOST`
    #[serde(default = "default_host", alias = "HOST")]
    pub host: String,
    /// Server bind port.
    ///
    /// Environment variable: `PORT`
    #[serde(default = "default_port", alias = "PORT")]
    pub port: u16,
    /// Deployment environment name.
    ///
    /// Environment variable: `ENVIRONMENT`
    #[serde(default = "default_environment", alias = "ENVIRONMENT")]
    pub environment: String,
    /// HTTP request timeout in seconds.
    ///
    /// Environment variable: `REQUEST_TIMEOUT`
    #[serde(default = "default_request_timeout", alias = "REQUEST_TIMEOUT")]
    pub request_timeout: u64,

    // Security
    /// Shared secret for delivery signatures. Never serialized.
    ///
    /// Environment variable: `WEBHOOK_SECRET`
    #[serde(default, alias = "WEBHOOK_SECRET", skip_serializing)]
    pub webhook_secret: SecretString,
    /// Extra CIDR ranges allowed on top of the provider ranges,
    /// comma-separated.
    ///
    /// Environment variable: `ALLOWED_IPS`
    #[serde(default, alias = "ALLOWED_IPS")]
    pub allowed_ips: String,
    /// Maximum request body size in megabytes.
    ///
    /// Environment variable: `MAX_PAYLOAD_SIZE_MB`
    #[serde(default = "default_max_payload_size_mb", alias = "MAX_PAYLOAD_SIZE_MB")]
    pub max_payload_size_mb: usize,
    /// Maximum JSON nesting depth.
    ///
    /// Environment variable: `MAX_PAYLOAD_DEPTH`
    #[serde(default = "default_max_payload_depth", alias = "MAX_PAYLOAD_DEPTH")]
    pub max_payload_depth: usize,
    /// When false, loopback callers are admitted too.
    ///
    /// Environment variable: `IP_VALIDATION_STRICT`
    #[serde(default = "default_true", alias = "IP_VALIDATION_STRICT")]
    pub ip_validation_strict: bool,
    /// Whether delivery signatures are verified.
    ///
    /// Environment variable: `ENABLE_SIGNATURE_VERIFY`
    #[serde(default = "default_true", alias = "ENABLE_SIGNATURE_VERIFY")]
    pub enable_signature_verify: bool,
    /// Take the caller address from `X-Forwarded-For` instead of the peer.
    ///
    /// Environment variable: `TRUST_FORWARDED_FOR`
    #[serde(default, alias = "TRUST_FORWARDED_FOR")]
    pub trust_forwarded_for: bool,

    // Rate limiting
    /// Requests per minute across all callers.
    ///
    /// Environment variable: `RATE_LIMIT_GLOBAL`
    #[serde(default = "default_rate_limit_global", alias = "RATE_LIMIT_GLOBAL")]
    pub rate_limit_global: u32,
    /// Requests per minute from one caller address.
    ///
    /// Environment variable: `RATE_LIMIT_PER_IP`
    #[serde(default = "default_rate_limit_per_ip", alias = "RATE_LIMIT_PER_IP")]
    pub rate_limit_per_ip: u32,

    // Features
    /// Mount `GET /metrics`.
    ///
    /// Environment variable: `ENABLE_METRICS`
    #[serde(default = "default_true", alias = "ENABLE_METRICS")]
    pub enable_metrics: bool,
    /// Mount the health, readiness and liveness routes.
    ///
    /// Environment variable: `ENABLE_HEALTH_CHECK`
    #[serde(default = "default_true", alias = "ENABLE_HEALTH_CHECK")]
    pub enable_health_check: bool,

    // Logging
    /// Log filter directives.
    ///
    /// Environment variable: `RUST_LOG`
    #[serde(default = "default_log_level", alias = "RUST_LOG")]
    pub rust_log: String,
    /// Log output format.
    ///
    /// Environment variable: `LOG_FORMAT`
    #[serde(default = "default_log_format", alias = "LOG_FORMAT")]
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from defaults, config file, and environment variable
    /// overrides, then validate it.
    pub fn load() -> Result<Self> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(""));

        let config: Self = figment.extract().context("Failed to load configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Extra allow-list entries, trimmed, empty entries dropped.
    pub fn allowed_ranges(&self) -> Vec<String> {
        self.allowed_ips
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(String::from)
            .collect()
    }

    /// Convert to the security crate's policy settings.
    pub fn to_policy_config(&self) -> PolicyConfig {
        PolicyConfig {
            allowed_ranges: self.allowed_ranges(),
            ip_validation_strict: self.ip_validation_strict,
            verify_signatures: self.enable_signature_verify,
            max_payload_bytes: self.max_payload_bytes(),
            max_depth: self.max_payload_depth,
        }
    }

    /// Convert to limiter settings.
    pub fn to_rate_limits(&self) -> RateLimits {
        RateLimits {
            global: self.rate_limit_global,
            per_origin: self.rate_limit_per_ip,
            window: RATE_LIMIT_WINDOW,
        }
    }

    /// Body size limit in bytes.
    pub fn max_payload_bytes(&self) -> usize {
        PolicyConfig::megabytes(self.max_payload_size_mb)
    }

    /// Request timeout as a duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Parse server socket address from host and port configuration.
    pub fn parse_server_addr(&self) -> Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.host, self.port);
        SocketAddr::from_str(&addr_str).context("Invalid server address")
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.webhook_secret.is_empty() {
            anyhow::bail!("WEBHOOK_SECRET must be set");
        }

        if self.port == 0 {
            anyhow::bail!("port must be greater than 0");
        }

        if self.request_timeout == 0 {
            anyhow::bail!("request_timeout must be greater than 0");
        }

        if self.max_payload_size_mb == 0 {
            anyhow::bail!("max_payload_size_mb must be greater than 0");
        }

        if self.max_payload_depth == 0 {
            anyhow::bail!("max_payload_depth must be greater than 0");
        }

        if self.rate_limit_global == 0 || self.rate_limit_per_ip == 0 {
            anyhow::bail!("rate limits must be greater than 0");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
            request_timeout: default_request_timeout(),
            webhook_secret: SecretString::default(),
            allowed_ips: String::new(),
            max_payload_size_mb: default_max_payload_size_mb(),
            max_payload_depth: default_max_payload_depth(),
            ip_validation_strict: true,
            enable_signature_verify: true,
            trust_forwarded_for: false,
            rate_limit_global: default_rate_limit_global(),
            rate_limit_per_ip: default_rate_limit_per_ip(),
            enable_metrics: true,
            enable_health_check: true,
            rust_log: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_payload_size_mb() -> usize {
    10
}

fn default_max_payload_depth() -> usize {
    64
}

fn default_true() -> bool {
    true
}

fn default_rate_limit_global() -> u32 {
    1000
}

fn default_rate_limit_per_ip() -> u32 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> LogFormat {
    LogFormat::Text
}
