//! In-flight request tracking.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::AppState;

/// Holds the active connections gauge up for the lifetime of each request.
pub async fn track_connections(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let _guard = state.metrics.track_connection();
    next.run(req).await
}
