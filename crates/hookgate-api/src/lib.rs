//! Hookgate HTTP API.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod rate_limit;
pub mod server;

use std::{sync::Arc, time::Instant};

use anyhow::{Context, Result};
use hookgate_core::{Clock, MulticastSink, RealClock, SecurityEventSink, TracingSink};
use hookgate_pipeline::{EventDispatcher, ValidationPipeline};
use hookgate_security::{HmacSha256Verifier, SecurityPolicy, SignatureVerifier, WebhookSecret};

pub use config::Config;
pub use metrics::{GateMetrics, MetricsError};
pub use rate_limit::{FixedWindowRateLimiter, RateLimiter, RateLimits, RateScope};
pub use server::{create_router, start_server};

/// Shared application state for all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Admission pipeline run for every webhook delivery.
    pub pipeline: Arc<ValidationPipeline>,
    /// Loaded service configuration.
    pub config: Arc<Config>,
    /// Prometheus metrics.
    pub metrics: Arc<GateMetrics>,
    /// Limiter consulted before the pipeline runs.
    pub rate_limiter: Arc<dyn RateLimiter>,
    /// Clock for timestamps, uptime and processing time.
    pub clock: Arc<dyn Clock>,
    /// Monotonic instant the state was built.
    pub started_at: Instant,
}

impl AppState {
    /// Builds the full production state from `config`.
    pub fn new(config: Config) -> Result<Self> {
        Self::with_clock(config, Arc::new(RealClock::new()))
    }

    /// Builds the state with an injected clock.
    pub fn with_clock(config: Config, clock: Arc<dyn Clock>) -> Result<Self> {
        let secret = WebhookSecret::new(config.webhook_secret.expose())
            .context("webhook secret is required")?;
        let verifier: Arc<dyn SignatureVerifier> = Arc::new(HmacSha256Verifier::new(secret));
        Self::with_verifier(config, verifier, clock)
    }

    /// Builds the state around a caller-supplied signature verifier.
    pub fn with_verifier(
        config: Config,
        verifier: Arc<dyn SignatureVerifier>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let metrics = Arc::new(GateMetrics::new().context("failed to register metrics")?);
        let events: Arc<dyn SecurityEventSink> = Arc::new(
            MulticastSink::new()
                .with_subscriber(Arc::new(TracingSink))
                .with_subscriber(metrics.clone()),
        );

        let policy =
            SecurityPolicy::new(config.to_policy_config()).context("invalid security policy")?;
        let pipeline = ValidationPipeline::new(
            Arc::new(policy),
            verifier,
            Arc::new(EventDispatcher::with_default_handlers()),
            events,
        );
        let rate_limiter =
            Arc::new(FixedWindowRateLimiter::new(config.to_rate_limits(), clock.clone()));

        Ok(Self {
            pipeline: Arc::new(pipeline),
            config: Arc::new(config),
            metrics,
            rate_limiter,
            started_at: clock.now(),
            clock,
        })
    }
}
