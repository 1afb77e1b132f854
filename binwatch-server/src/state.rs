//! Shared handler state.

use std::sync::Arc;

use binwatch_core::{BinwatchService, PortError, RewardScorer, Security};
use binwatch_store_sqlite::{SqliteStore, backend};
use hmac::digest::InvalidLength;
use tracing::info;

use crate::config::Config;
use crate::password::Argon2Hasher;
use crate::token::HmacTokenSigner;

const IN_MEMORY: &str = ":memory:";

/// Failures while wiring the service together.
#[derive(thiserror::Error, Debug)]
pub enum StateError {
    /// The database could not be opened.
    #[error(transparent)]
    Storage(#[from] PortError),
    /// The token secret was rejected.
    #[error("Invalid token secret: {0}")]
    TokenSecret(#[from] InvalidLength),
}

/// State cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    /// The service all routes delegate to.
    pub service: Arc<BinwatchService>,
}

impl AppState {
    /// Wrap an existing service.
    #[must_use]
    pub fn new(service: BinwatchService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    /// Open the configured database and build the service on top of it.
    ///
    /// # Errors
    ///
    /// Returns a [`StateError`] when the store cannot be opened or the token secret is unusable.
    pub fn from_config(config: &Config) -> Result<Self, StateError> {
        let store = if config.database.as_os_str() == IN_MEMORY {
            info!("using in-memory database");
            SqliteStore::open_in_memory()?
        } else {
            SqliteStore::open(&config.database)?
        };
        let security = Security {
            authenticator: Arc::new(HmacTokenSigner::new(
                config.token_secret.as_bytes(),
                config.token_ttl,
            )?),
            hasher: Arc::new(Argon2Hasher::default()),
        };
        info!(policy = ?config.plastic_policy, "reward scorer configured");
        Ok(Self::new(BinwatchService::new(
            backend(store),
            security,
            RewardScorer::new(config.plastic_policy),
        )))
    }
}
