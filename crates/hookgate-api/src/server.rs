//! HTTP server configuration and request routing.
//!
//! Requests flow through middleware in order:
//! 1. Request ID generation
//! 2. Security response headers
//! 3. Request/response logging
//! 4. Active connection tracking
//! 5. Timeout enforcement (`request_timeout`)
//! 6. Rate limiting (webhook route only)
//! 7. Handler execution
//!
//! # Graceful Shutdown
//!
//! The server handles SIGINT and SIGTERM gracefully:
//! - Stops accepting new connections
//! - Waits for in-flight requests to finish
//! - Returns once the listener is closed

use std::net::SocketAddr;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::{
    handlers,
    middleware::{enforce_rate_limit, inject_request_id, security_headers, track_connections},
    AppState,
};

/// Path the provider delivers webhooks to.
pub const WEBHOOK_PATH: &str = "/webhook/github";

/// Creates the Axum router with all routes and middleware.
///
/// Health and metrics routes are mounted only when enabled in the
/// configuration. The caller address is read from `ConnectInfo`, so the
/// router must be served with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
///
/// # Example
///
/// ```no_run
/// use hookgate_api::{create_router, AppState, Config};
///
/// fn build(config: Config) -> anyhow::Result<axum::Router> {
///     Ok(create_router(AppState::new(config)?))
/// }
/// ```
pub fn create_router(state: AppState) -> Router {
    let config = state.config.clone();

    let webhook_routes = Router::new()
        .route(WEBHOOK_PATH, post(handlers::receive_webhook))
        .route_layer(middleware::from_fn_with_state(state.clone(), enforce_rate_limit));

    let mut router =
        Router::new().merge(webhook_routes).route("/config", get(handlers::config_echo));

    if config.enable_health_check {
        router = router
            .route("/health", get(handlers::health_check))
            .route("/healthz", get(handlers::health_check))
            .route("/ready", get(handlers::readiness_check))
            .route("/live", get(handlers::liveness_check));
    }

    if config.enable_metrics {
        router = router.route("/metrics", get(handlers::metrics_export));
    }

    router
        .layer(TimeoutLayer::new(config.request_timeout()))
        .layer(middleware::from_fn_with_state(state.clone(), track_connections))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(inject_request_id))
        .with_state(state)
}

/// Starts the HTTP server with graceful shutdown support.
///
/// Binds to the specified address and serves requests until a shutdown
/// signal is received.
///
/// # Errors
///
/// Returns `std::io::Error` if the port is already in use or the network
/// interface is unavailable.
pub async fn start_server(state: AppState, addr: SocketAddr) -> Result<(), std::io::Error> {
    let app = create_router(state);

    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    info!("HTTP server listening on {}", actual_addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped gracefully");
    Ok(())
}

/// Waits for shutdown signal (CTRL+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received CTRL+C, starting graceful shutdown");
        },
        () = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }

    warn!("Draining in-flight requests before exit");
}
