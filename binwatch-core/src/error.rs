//! Errors surfaced by the binwatch service.

use crate::model::WasteKind;
use crate::ports::{AuthError, PortError};

#[derive(thiserror::Error, Debug)]
/// Failure of a service operation. Every operation either succeeds fully or fails with one of these.
pub enum BinwatchError {
    /// A fill level lies outside `0..=100`.
    #[error("Fill level {value} for {kind} must be between 0 and 100")]
    OutOfRange {
        /// Section carrying the bad value.
        kind: WasteKind,
        /// Rejected value.
        value: f64,
    },
    /// The requested record does not exist for the caller.
    #[error("{0} not found")]
    NotFound(&'static str),
    /// Request body failed validation.
    #[error("{0}")]
    Invalid(String),
    /// A unique record already exists.
    #[error("{0} already exists")]
    Conflict(&'static str),
    /// Login with an unknown e-mail or a wrong password.
    #[error("Invalid email or password")]
    InvalidCredentials,
    /// The session is not allowed to run the operation.
    #[error("Access denied: {0}")]
    Forbidden(&'static str),
    /// Session token missing or rejected.
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// Storage backend failed.
    #[error("Storage error: {0}")]
    Port(#[from] PortError),
}
