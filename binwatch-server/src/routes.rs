//! HTTP routes. Each submodule owns one path prefix and delegates to the service.

mod auth;
mod authority;
mod pickup;
mod rewards;
mod user;
mod waste;

use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};

use crate::state::AppState;

/// All API routes, not yet bound to state.
pub(crate) fn api() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(health_handler))
        .nest("/api/auth", auth::router())
        .nest("/api/user", user::router())
        .nest("/api/waste", waste::router())
        .nest("/api/rewards", rewards::router())
        .nest("/api/authority", authority::router())
        .nest("/api/pickup-requests", pickup::router())
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
