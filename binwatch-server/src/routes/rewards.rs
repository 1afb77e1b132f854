//! Reward points of the calling resident.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use binwatch_core::api::RewardPointsResponse;

use crate::error::AppError;
use crate::session::AuthSession;
use crate::state::AppState;

pub(super) fn router() -> Router<AppState> {
    Router::new().route("/points", get(points_handler))
}

/// Recompute from the current bin and return the stored snapshot.
async fn points_handler(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
) -> Result<Json<RewardPointsResponse>, AppError> {
    Ok(Json(state.service.calculate_rewards(&session).await?))
}
