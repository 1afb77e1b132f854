//! Bundle of storage ports a service runs against.

use std::sync::Arc;

use crate::ports::{
    AccountPort, Authenticator, BinPort, CredentialHasher, PickupPort, RewardPort,
};

/// Collection of ports implementing storage for the service.
#[derive(Clone)]
pub struct Backend {
    /// Account storage.
    pub accounts: Arc<dyn AccountPort>,
    /// House, bin and waste log storage.
    pub bins: Arc<dyn BinPort>,
    /// Reward snapshot storage.
    pub rewards: Arc<dyn RewardPort>,
    /// Pickup request storage.
    pub pickups: Arc<dyn PickupPort>,
}

/// Capabilities used to authenticate callers.
#[derive(Clone)]
pub struct Security {
    /// Issues and verifies session tokens.
    pub authenticator: Arc<dyn Authenticator>,
    /// Hashes and checks passwords.
    pub hasher: Arc<dyn CredentialHasher>,
}
