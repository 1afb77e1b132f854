//! House registration and the resident dashboard.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::routing::{get, put};
use axum::{Json, Router};
use binwatch_core::House;
use binwatch_core::api::{DashboardResponse, HouseRequest};

use crate::error::AppError;
use crate::session::AuthSession;
use crate::state::AppState;

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/house", put(house_handler))
        .route("/waste-levels", get(dashboard_handler))
}

async fn house_handler(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    payload: Result<Json<HouseRequest>, JsonRejection>,
) -> Result<Json<House>, AppError> {
    let Json(request) = payload?;
    Ok(Json(state.service.register_house(&session, request).await?))
}

async fn dashboard_handler(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
) -> Result<Json<DashboardResponse>, AppError> {
    Ok(Json(state.service.dashboard(&session).await?))
}
