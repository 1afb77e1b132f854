//! Authority overview.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use binwatch_core::overview::AuthorityOverview;

use crate::error::AppError;
use crate::session::AuthSession;
use crate::state::AppState;

pub(super) fn router() -> Router<AppState> {
    Router::new().route("/overview", get(overview_handler))
}

async fn overview_handler(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
) -> Result<Json<AuthorityOverview>, AppError> {
    Ok(Json(state.service.authority_overview(&session).await?))
}
