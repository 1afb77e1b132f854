//! Traits describing storage and security capabilities and shared helper types.

use std::error::Error as StdError;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::model::{
    BinId, BinReading, House, NewHouse, NewPickupRequest, NewUser, NewWasteEntry, PickupRequest,
    PickupRequestId, PickupRequestView, PickupStatus, PlasticSignal, Session, User, UserId,
    WasteBin, WasteEntry, WasteTotals,
};
use crate::reward::RewardSnapshot;

#[derive(thiserror::Error, Debug)]
/// Errors that can occur while talking to the storage backend.
pub enum PortError {
    /// The backend rejected or failed the operation.
    #[error("Backend error: {0}")]
    Backend(#[source] Box<dyn StdError + Send + Sync>),
    /// A unique constraint was violated.
    #[error("Duplicate {0}")]
    Duplicate(&'static str),
    /// Stored data could not be mapped back into domain types.
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl PortError {
    /// Wrap any backend error.
    pub fn backend<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        PortError::Backend(Box::new(err))
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
/// Reasons a session token was not accepted.
pub enum AuthError {
    /// No bearer token on the request.
    #[error("No authorization token provided")]
    MissingToken,
    /// The token does not have the expected shape.
    #[error("Invalid token format")]
    Malformed,
    /// Signature did not verify.
    #[error("Invalid token")]
    BadSignature,
    /// The token lifetime is over.
    #[error("Token expired")]
    Expired,
}

#[derive(Debug, Clone)]
/// Token handed to a client after login or signup.
pub struct IssuedToken {
    /// Encoded bearer token.
    pub token: String,
    /// End of validity.
    pub expires_at: DateTime<Utc>,
}

/// Capability that turns sessions into bearer tokens and back.
pub trait Authenticator: Send + Sync {
    /// Issue a token for the session, valid from `now`.
    fn issue(&self, session: Session, now: DateTime<Utc>) -> IssuedToken;

    /// Verify a bearer token at `now`.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthError`] when the token is malformed, forged, or expired.
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Session, AuthError>;
}

/// Capability that hashes and checks passwords.
pub trait CredentialHasher: Send + Sync {
    /// Produce a storable digest for a password.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the hashing backend fails.
    fn hash(&self, password: &str) -> Result<String, PortError>;

    /// Check a password against a stored digest.
    fn verify(&self, password: &str, digest: &str) -> bool;
}

#[async_trait]
/// Storage of user accounts and their authority assignment.
pub trait AccountPort: Send + Sync {
    /// Insert a new account.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::Duplicate`] when the e-mail is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, PortError>;

    /// Look up an account by e-mail.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the backend fails.
    async fn user_by_email(&self, email: &str) -> Result<Option<User>, PortError>;

    /// Look up an account by id.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the backend fails.
    async fn user(&self, id: UserId) -> Result<Option<User>, PortError>;

    /// Residents assigned to an authority, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the backend fails.
    async fn residents_of(&self, authority: UserId) -> Result<Vec<User>, PortError>;

    /// All authority accounts, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the backend fails.
    async fn authorities(&self) -> Result<Vec<User>, PortError>;

    /// Residents without an authority, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the backend fails.
    async fn unassigned_residents(&self) -> Result<Vec<User>, PortError>;

    /// Assign a resident to an authority.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the backend fails.
    async fn assign(&self, resident: UserId, authority: UserId) -> Result<(), PortError>;
}

#[async_trait]
/// Storage of houses, bins and the waste log.
pub trait BinPort: Send + Sync {
    /// Register or update the house of a resident.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the backend fails.
    async fn upsert_house(&self, owner: UserId, house: NewHouse) -> Result<House, PortError>;

    /// House of a resident.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the backend fails.
    async fn house_of(&self, owner: UserId) -> Result<Option<House>, PortError>;

    /// Houses of the given residents, each joined with its bin if one exists.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the backend fails.
    async fn houses_with_bins(
        &self,
        owners: &[UserId],
    ) -> Result<Vec<(House, Option<WasteBin>)>, PortError>;

    /// Bin of a resident.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the backend fails.
    async fn bin_of(&self, owner: UserId) -> Result<Option<WasteBin>, PortError>;

    /// Store new fill levels, creating the bin for the house on first report.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the backend fails.
    async fn save_levels(
        &self,
        house: &House,
        reading: BinReading,
        at: DateTime<Utc>,
    ) -> Result<WasteBin, PortError>;

    /// Record detector output on a bin owned by `owner`. Returns `None` when no such bin exists.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the backend fails.
    async fn record_plastic(
        &self,
        owner: UserId,
        bin: BinId,
        signal: PlasticSignal,
        at: DateTime<Utc>,
    ) -> Result<Option<WasteBin>, PortError>;

    /// Append to the waste log of a resident.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the backend fails.
    async fn add_waste_entry(
        &self,
        owner: UserId,
        entry: NewWasteEntry,
    ) -> Result<WasteEntry, PortError>;

    /// Summed quantities per fraction for a resident.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the backend fails.
    async fn waste_totals(&self, owner: UserId) -> Result<WasteTotals, PortError>;

    /// Log entries collected at or after `since`, newest first.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the backend fails.
    async fn waste_history(
        &self,
        owner: UserId,
        since: DateTime<Utc>,
    ) -> Result<Vec<WasteEntry>, PortError>;
}

#[async_trait]
/// Storage of the latest reward snapshot per resident.
pub trait RewardPort: Send + Sync {
    /// Latest snapshot of a resident.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the backend fails.
    async fn latest(&self, owner: UserId) -> Result<Option<RewardSnapshot>, PortError>;

    /// Replace the snapshot of `snapshot.owner` atomically.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the backend fails.
    async fn upsert(&self, snapshot: &RewardSnapshot) -> Result<(), PortError>;

    /// Snapshots of the given residents; residents without one are left out.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the backend fails.
    async fn for_owners(&self, owners: &[UserId]) -> Result<Vec<RewardSnapshot>, PortError>;
}

#[async_trait]
/// Storage of pickup requests.
pub trait PickupPort: Send + Sync {
    /// Insert a new pending request.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the backend fails.
    async fn create(&self, request: NewPickupRequest) -> Result<PickupRequest, PortError>;

    /// Look up a request.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the backend fails.
    async fn get(&self, id: PickupRequestId) -> Result<Option<PickupRequest>, PortError>;

    /// Requests of the given residents joined with requester and house, newest first.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the backend fails.
    async fn for_owners(&self, owners: &[UserId]) -> Result<Vec<PickupRequestView>, PortError>;

    /// Change the status of a request.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the backend fails.
    async fn set_status(&self, id: PickupRequestId, status: PickupStatus) -> Result<(), PortError>;
}
