//! HTTP server for binwatch.
//!
//! Residents register a house, report the fill levels of their bin and collect reward points;
//! authorities watch the bins of their assigned residents and handle extra pickup requests.
//! Every route is a thin axum handler over [`binwatch_core::BinwatchService`].
//!
//! # Configuration
//!
//! See [`config::Config`]; the token secret is the only required value and may be provided as
//! `/run/secrets/BINWATCH_TOKEN_SECRET`.
//!
//! # Logging
//!
//! Filtered through `RUST_LOG`, e.g. `RUST_LOG=binwatch_server=debug,tower_http=debug`.

pub mod config;
pub mod error;
pub mod password;
mod routes;
pub mod session;
pub mod state;
pub mod token;

use std::future::pending;
use std::io;
use std::time::Duration;

use axum::Router;
use axum::http::Method;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use state::AppState;

/// Install the global `tracing` subscriber, filtered by `RUST_LOG`.
pub fn init_tracing() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
}

/// Build the application router with CORS and request tracing.
#[must_use]
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    routes::api()
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Serve the router on `0.0.0.0:port` until Ctrl+C or SIGTERM.
///
/// # Errors
///
/// Returns an [`io::Error`] when the port cannot be bound or the server fails.
pub async fn start_server(state: AppState, port: u16) -> io::Result<()> {
    let address = format!("0.0.0.0:{port}");
    info!("Binding to {address}");
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(err) => {
                warn!("Failed to install Ctrl+C handler: {err}");
                pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(err) => {
                warn!("Failed to install signal handler: {err}");
                pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
