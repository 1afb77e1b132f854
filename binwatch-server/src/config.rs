//! Server configuration read from the environment.
//!
//! Secrets may also be provided as files under `/run/secrets/`, which is where container
//! orchestrators mount them.

use std::env;
use std::fmt::Display;
use std::fs::read_to_string;
use std::path::PathBuf;
use std::str::FromStr;

use binwatch_core::{PenaltyMode, PlasticPolicy};
use chrono::Duration;
use tracing::{info, warn};

const SECRETS_DIR: &str = "/run/secrets";

/// Problems found while loading the configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// A required variable is not set and has no secret file.
    #[error("{0} is not set")]
    Missing(&'static str),
    /// A variable is set to something unusable.
    #[error("Invalid {key} value {value:?}: {reason}")]
    Invalid {
        /// Variable name.
        key: &'static str,
        /// Rejected raw value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Typed server settings.
#[derive(Debug, Clone)]
pub struct Config {
    /// Listen port.
    pub port: u16,
    /// SQLite file, or `:memory:`.
    pub database: PathBuf,
    /// HMAC key for session tokens.
    pub token_secret: String,
    /// Lifetime of issued session tokens.
    pub token_ttl: Duration,
    /// How detected plastic affects reward points.
    pub plastic_policy: PlasticPolicy,
}

impl Config {
    /// Load from the process environment.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the token secret is missing or a value does not parse.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| {
            env::var(key)
                .ok()
                .or_else(|| read_secret(key))
        })
    }

    /// Load through an arbitrary lookup function.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the token secret is missing or a value does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token_secret = lookup("BINWATCH_TOKEN_SECRET")
            .map(|secret| secret.trim().to_owned())
            .filter(|secret| !secret.is_empty())
            .ok_or(ConfigError::Missing("BINWATCH_TOKEN_SECRET"))?;

        let ttl_hours: i64 = try_load(&lookup, "BINWATCH_TOKEN_TTL_HOURS", "168")?;
        if ttl_hours <= 0 {
            return Err(ConfigError::Invalid {
                key: "BINWATCH_TOKEN_TTL_HOURS",
                value: ttl_hours.to_string(),
                reason: "must be positive".to_owned(),
            });
        }

        let min_confidence: f64 = try_load(&lookup, "BINWATCH_PLASTIC_MIN_CONFIDENCE", "0.0")?;
        if !(0.0..=1.0).contains(&min_confidence) {
            return Err(ConfigError::Invalid {
                key: "BINWATCH_PLASTIC_MIN_CONFIDENCE",
                value: min_confidence.to_string(),
                reason: "must be between 0 and 1".to_owned(),
            });
        }

        Ok(Self {
            port: try_load(&lookup, "BINWATCH_PORT", "5000")?,
            database: try_load(&lookup, "BINWATCH_DATABASE", "binwatch.sqlite3")?,
            token_secret,
            token_ttl: Duration::hours(ttl_hours),
            plastic_policy: PlasticPolicy {
                penalty_points: try_load(&lookup, "BINWATCH_PLASTIC_PENALTY_POINTS", "0")?,
                min_confidence,
                mode: try_load::<PenaltyMode, _>(&lookup, "BINWATCH_PLASTIC_PENALTY_MODE", "add")?,
            },
        })
    }
}

fn try_load<T, F>(lookup: &F, key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_owned()
    });
    raw.trim().parse().map_err(|err: T::Err| {
        warn!("Invalid {key} value: {err}");
        ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: err.to_string(),
        }
    })
}

fn read_secret(name: &str) -> Option<String> {
    let path = PathBuf::from(SECRETS_DIR).join(name);
    read_to_string(&path)
        .map(|secret| secret.trim().to_owned())
        .ok()
}
