//! Admin HTTP API: read-only operational view of the hub.
//!
//! Served on its own listener, separate from the envelope protocol.
//! Registry endpoints are mounted under `/api/v1`; `/health` sits at the
//! root.

pub mod dto;
pub mod handlers;

use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::error::HubError;

/// Per-request timeout for admin endpoints.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds the complete admin router.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes())
}

/// Builds the router with tracing and timeout layers and binds it to
/// `state`.
pub fn app(state: AppState) -> Router {
    build_router()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(REQUEST_TIMEOUT)),
        )
        .with_state(state)
}

/// Serves the admin API on `listener` until `shutdown` is cancelled.
///
/// # Errors
///
/// Returns [`HubError::Transport`] if the HTTP server fails.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: CancellationToken,
) -> Result<(), HubError> {
    axum::serve(listener, app(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    Ok(())
}
