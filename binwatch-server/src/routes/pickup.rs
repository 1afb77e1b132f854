//! Extra pickup requests: residents submit, authorities list and accept.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Json, Router};
use binwatch_core::api::{MessageResponse, PickupRequestBody};
use binwatch_core::{PickupRequest, PickupRequestId, PickupRequestView};

use crate::error::AppError;
use crate::session::AuthSession;
use crate::state::AppState;

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_handler).post(submit_handler))
        .route("/{id}/accept", patch(accept_handler))
}

async fn submit_handler(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    payload: Result<Json<PickupRequestBody>, JsonRejection>,
) -> Result<(StatusCode, Json<PickupRequest>), AppError> {
    let Json(body) = payload?;
    let request = state.service.submit_pickup_request(&session, body).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

async fn list_handler(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
) -> Result<Json<Vec<PickupRequestView>>, AppError> {
    Ok(Json(state.service.pickup_requests(&session).await?))
}

async fn accept_handler(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Path(id) = id?;
    state
        .service
        .accept_pickup_request(&session, PickupRequestId(id))
        .await?;
    Ok(Json(MessageResponse {
        message: "Request accepted".to_owned(),
    }))
}
