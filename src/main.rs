//! Hookgate webhook security gate.
//!
//! Main entry point for the hookgate server. Loads configuration, builds the
//! validation pipeline, and serves the HTTP API until a shutdown signal
//! arrives.

use anyhow::{Context, Result};
use hookgate_api::{config::LogFormat, start_server, AppState, Config};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().context("failed to load configuration")?;

    init_tracing(&config)?;

    info!("Starting hookgate webhook security gate");

    let addr = config.parse_server_addr()?;
    info!(
        environment = %config.environment,
        server_addr = %addr,
        signature_verification = config.enable_signature_verify,
        ip_validation_strict = config.ip_validation_strict,
        "Configuration loaded"
    );

    let state = AppState::new(config).context("failed to build application state")?;
    info!(addr = %addr, "hookgate is ready to receive webhooks");

    start_server(state, addr).await.context("HTTP server failed")?;

    info!("hookgate shutdown complete");
    Ok(())
}

/// Initializes tracing from `RUST_LOG`, falling back to the configured level.
fn init_tracing(config: &Config) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.rust_log))
        .or_else(|_| EnvFilter::try_new("info,hookgate=debug,tower_http=debug"))
        .context("invalid log filter")?;

    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_target(true).with_current_span(true))
            .try_init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_target(true).with_thread_ids(true).with_line_number(true))
            .try_init(),
    }
    .context("failed to install tracing subscriber")
}
