//! Registry views: connections, devices, occupancy.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{ConnectionFilter, ConnectionListResponse};
use crate::app_state::AppState;

/// `GET /api/v1/connections`: Registry entries in registry order.
///
/// `?online=true` keeps only live entries; `?devices=true` keeps only
/// registered devices.
pub async fn list_connections(
    State(state): State<AppState>,
    Query(filter): Query<ConnectionFilter>,
) -> impl IntoResponse {
    let connections: Vec<_> = state
        .hub
        .connections()
        .await
        .into_iter()
        .filter(|c| filter.matches(c))
        .collect();
    let stats = state.hub.stats().await;
    Json(ConnectionListResponse { connections, stats })
}

/// `GET /api/v1/devices`: Online devices, same shape as the
/// `list_devices` envelope reply.
pub async fn list_devices(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.hub.list_devices().await)
}

/// `GET /api/v1/stats`: Registry occupancy.
pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.hub.stats().await)
}

/// Registry routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/connections", get(list_connections))
        .route("/devices", get(list_devices))
        .route("/stats", get(stats))
}
