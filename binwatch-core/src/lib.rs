//! Core types and service wiring for the binwatch waste tracking backend.

/// Typed request and response bodies exchanged with API clients.
pub mod api;
/// Bundle of storage ports the service runs against.
pub mod backend;
/// Fill level classification into severity tiers and alerts.
pub mod classify;
/// Error taxonomy shared by the service and its callers.
pub mod error;
/// Domain models and identifiers.
pub mod model;
/// Aggregated dashboard view for authorities.
pub mod overview;
/// Traits describing storage and security capabilities.
pub mod ports;
/// Reward point scoring and plastic penalty policy.
pub mod reward;
/// High-level service facade used by request handlers.
pub mod service;

pub use backend::*;
pub use classify::*;
pub use error::*;
pub use model::*;
pub use ports::*;
pub use reward::*;
pub use service::*;
