//! Mapping of service failures onto HTTP responses.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use binwatch_core::{BinwatchError, api::MessageResponse};
use thiserror::Error;
use tracing::{debug, error};

/// Error returned by every handler. Rendered as `{"message": ...}`.
#[derive(Error, Debug)]
pub enum AppError {
    /// The body could not be parsed.
    #[error("Malformed payload: {0}")]
    MalformedPayload(#[from] JsonRejection),

    /// A path parameter could not be parsed.
    #[error("Invalid path: {0}")]
    InvalidPath(#[from] PathRejection),

    /// The service rejected the request.
    #[error(transparent)]
    Service(#[from] BinwatchError),
}

impl AppError {
    /// Status code the error is reported with.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MalformedPayload(_) | AppError::InvalidPath(_) => StatusCode::BAD_REQUEST,
            AppError::Service(err) => match err {
                BinwatchError::OutOfRange { .. } | BinwatchError::Invalid(_) => {
                    StatusCode::BAD_REQUEST
                }
                BinwatchError::InvalidCredentials | BinwatchError::Auth(_) => {
                    StatusCode::UNAUTHORIZED
                }
                BinwatchError::Forbidden(_) => StatusCode::FORBIDDEN,
                BinwatchError::NotFound(_) => StatusCode::NOT_FOUND,
                BinwatchError::Conflict(_) => StatusCode::CONFLICT,
                BinwatchError::Port(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!(error = %self, "request failed");
            "Server error".to_owned()
        } else {
            debug!(%status, error = %self, "request rejected");
            self.to_string()
        };
        (status, Json(MessageResponse { message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use binwatch_core::{AuthError, PortError, WasteKind};

    use super::*;

    #[test]
    fn service_errors_map_to_status_codes() {
        let cases = [
            (
                BinwatchError::OutOfRange {
                    kind: WasteKind::Organic,
                    value: 120.0,
                },
                StatusCode::BAD_REQUEST,
            ),
            (BinwatchError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (
                BinwatchError::Auth(AuthError::Expired),
                StatusCode::UNAUTHORIZED,
            ),
            (BinwatchError::Forbidden("authority only"), StatusCode::FORBIDDEN),
            (BinwatchError::NotFound("Waste bin"), StatusCode::NOT_FOUND),
            (BinwatchError::Conflict("User"), StatusCode::CONFLICT),
            (
                BinwatchError::Port(PortError::Corrupt("bad row".to_owned())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(AppError::from(err).status(), expected);
        }
    }
}
