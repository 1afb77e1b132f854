//! Bin levels, the waste log and plastic detector results.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use binwatch_core::api::{
    BinStatus, LevelsRequest, LevelsView, PlasticDetectionRequest, RewardPointsResponse,
    WasteEntryRequest,
};
use binwatch_core::{WasteEntry, WasteTotals};

use crate::error::AppError;
use crate::session::AuthSession;
use crate::state::AppState;

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/levels", get(levels_handler).put(report_levels_handler))
        .route("/add", post(add_handler))
        .route("/stats", get(stats_handler))
        .route("/image-detection", post(image_detection_handler))
}

async fn levels_handler(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
) -> Result<Json<LevelsView>, AppError> {
    Ok(Json(state.service.bin_levels(&session).await?))
}

async fn report_levels_handler(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    payload: Result<Json<LevelsRequest>, JsonRejection>,
) -> Result<Json<BinStatus>, AppError> {
    let Json(request) = payload?;
    Ok(Json(state.service.report_levels(&session, request).await?))
}

async fn add_handler(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    payload: Result<Json<WasteEntryRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<WasteEntry>), AppError> {
    let Json(request) = payload?;
    let entry = state.service.add_waste(&session, request).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn stats_handler(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
) -> Result<Json<WasteTotals>, AppError> {
    Ok(Json(state.service.waste_stats(&session).await?))
}

async fn image_detection_handler(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    payload: Result<Json<PlasticDetectionRequest>, JsonRejection>,
) -> Result<Json<RewardPointsResponse>, AppError> {
    let Json(request) = payload?;
    Ok(Json(
        state
            .service
            .record_plastic_detection(&session, request)
            .await?,
    ))
}
