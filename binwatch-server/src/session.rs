//! Bearer token extraction.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use binwatch_core::{AuthError, BinwatchError, Session};
use tracing::debug;

use crate::error::AppError;
use crate::state::AppState;

/// Session of the caller, taken from `Authorization: Bearer <token>`.
#[derive(Debug, Clone, Copy)]
pub struct AuthSession(pub Session);

impl FromRequestParts<AppState> for AuthSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(BinwatchError::Auth(AuthError::MissingToken))?;
        let token = header
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(BinwatchError::Auth(AuthError::Malformed))?;
        let session = state.service.authenticate(token).inspect_err(|err| {
            debug!(error = %err, "rejected session token");
        })?;
        Ok(Self(session))
    }
}
