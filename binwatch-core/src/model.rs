//! Domain data structures for users, houses, bins, waste entries, and pickup requests.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::BinwatchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
/// Identifier of a user account. Residents own houses, bins and rewards through it.
pub struct UserId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
/// Identifier of a registered house.
pub struct HouseId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
/// Identifier of a waste bin.
pub struct BinId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
/// Identifier of a pickup request.
pub struct PickupRequestId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl fmt::Display for PickupRequestId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Account role deciding which operations a session may run.
pub enum Role {
    /// A household reporting its own bin.
    #[default]
    User,
    /// A municipal authority overseeing assigned residents.
    Authority,
}

impl Role {
    /// Wire name of the role.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Authority => "authority",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = BinwatchError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "user" => Ok(Role::User),
            "authority" => Ok(Role::Authority),
            other => Err(BinwatchError::Invalid(format!("unknown role {other:?}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Authenticated caller, passed explicitly into every service operation.
pub struct Session {
    /// Account the request acts for.
    pub user: UserId,
    /// Role claimed by the session token.
    pub role: Role,
}

impl Session {
    /// Whether the caller is an authority.
    #[must_use]
    pub fn is_authority(&self) -> bool {
        self.role == Role::Authority
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Stored user account.
pub struct User {
    /// Unique identifier.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Login e-mail, unique across accounts.
    pub email: String,
    /// Opaque digest produced by a [`crate::ports::CredentialHasher`].
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Account role.
    pub role: Role,
    /// Authority this resident is assigned to, if any.
    pub authority_id: Option<UserId>,
}

#[derive(Debug, Clone)]
/// Values needed to create a user account.
pub struct NewUser {
    /// Display name.
    pub name: String,
    /// Login e-mail.
    pub email: String,
    /// Digest of the chosen password.
    pub password_hash: String,
    /// Account role.
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Registered house location of a resident.
pub struct House {
    /// Unique identifier.
    pub id: HouseId,
    /// Resident owning the house.
    pub owner: UserId,
    /// Postal address.
    pub address: String,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

#[derive(Debug, Clone)]
/// Values needed to register or move a house.
pub struct NewHouse {
    /// Postal address.
    pub address: String,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawBinReading")]
/// Snapshot of fill percentages for the three tracked waste fractions.
///
/// Construct through [`BinReading::new`] so every level is known to lie in `0..=100`.
pub struct BinReading {
    organic_level: f64,
    non_recyclable_level: f64,
    hazardous_level: f64,
}

impl BinReading {
    /// Validate and build a reading.
    ///
    /// # Errors
    ///
    /// Returns [`BinwatchError::OutOfRange`] when any level is outside `0..=100` or not a number.
    pub fn new(
        organic_level: f64,
        non_recyclable_level: f64,
        hazardous_level: f64,
    ) -> Result<Self, BinwatchError> {
        check_level(WasteKind::Organic, organic_level)?;
        check_level(WasteKind::NonRecyclable, non_recyclable_level)?;
        check_level(WasteKind::Hazardous, hazardous_level)?;
        Ok(Self {
            organic_level,
            non_recyclable_level,
            hazardous_level,
        })
    }

    /// Empty bin.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            organic_level: 0.0,
            non_recyclable_level: 0.0,
            hazardous_level: 0.0,
        }
    }

    /// Organic section fill percentage.
    #[must_use]
    pub fn organic_level(&self) -> f64 {
        self.organic_level
    }

    /// Non-recyclable section fill percentage.
    #[must_use]
    pub fn non_recyclable_level(&self) -> f64 {
        self.non_recyclable_level
    }

    /// Hazardous section fill percentage.
    #[must_use]
    pub fn hazardous_level(&self) -> f64 {
        self.hazardous_level
    }

    /// Highest level across the three sections.
    #[must_use]
    pub fn max_level(&self) -> f64 {
        self.organic_level
            .max(self.non_recyclable_level)
            .max(self.hazardous_level)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBinReading {
    organic_level: f64,
    non_recyclable_level: f64,
    hazardous_level: f64,
}

impl TryFrom<RawBinReading> for BinReading {
    type Error = BinwatchError;

    fn try_from(raw: RawBinReading) -> Result<Self, Self::Error> {
        BinReading::new(
            raw.organic_level,
            raw.non_recyclable_level,
            raw.hazardous_level,
        )
    }
}

fn check_level(kind: WasteKind, value: f64) -> Result<(), BinwatchError> {
    if (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(BinwatchError::OutOfRange { kind, value })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Output of the plastic detector for the latest bin photo.
pub struct PlasticSignal {
    /// Whether plastic was found in a non-plastic section.
    pub detected: bool,
    /// Detector confidence in `0..=1`.
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Stored waste bin with its latest reading.
pub struct WasteBin {
    /// Unique identifier.
    pub id: BinId,
    /// House the bin stands at.
    pub house_id: HouseId,
    /// Resident owning the bin.
    pub owner: UserId,
    /// Latest fill levels.
    #[serde(flatten)]
    pub reading: BinReading,
    /// Whether the last processed photo showed plastic.
    pub plastic_detected: bool,
    /// Detector confidence for the last processed photo.
    pub plastic_confidence: f64,
    /// Time the levels were last reported.
    pub last_updated: DateTime<Utc>,
    /// Time the last photo was processed.
    pub last_image_processed: Option<DateTime<Utc>>,
}

impl WasteBin {
    /// Plastic detector output recorded on the bin.
    #[must_use]
    pub fn plastic_signal(&self) -> PlasticSignal {
        PlasticSignal {
            detected: self.plastic_detected,
            confidence: self.plastic_confidence,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Waste fractions tracked per household.
pub enum WasteKind {
    /// Compostable waste.
    Organic,
    /// Residual waste.
    NonRecyclable,
    /// Batteries, chemicals and similar.
    Hazardous,
}

impl WasteKind {
    /// Wire name of the fraction.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            WasteKind::Organic => "organic",
            WasteKind::NonRecyclable => "nonRecyclable",
            WasteKind::Hazardous => "hazardous",
        }
    }
}

impl fmt::Display for WasteKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for WasteKind {
    type Err = BinwatchError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "organic" => Ok(WasteKind::Organic),
            "nonRecyclable" => Ok(WasteKind::NonRecyclable),
            "hazardous" => Ok(WasteKind::Hazardous),
            _ => Err(BinwatchError::Invalid("Invalid waste type".to_owned())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Logged quantity of waste handed in by a resident.
pub struct WasteEntry {
    /// Unique identifier.
    pub id: i64,
    /// Resident who logged the entry.
    pub owner: UserId,
    /// Fraction of the waste.
    #[serde(rename = "type")]
    pub kind: WasteKind,
    /// Amount in kilograms.
    pub quantity: f64,
    /// Where the waste was handed in.
    pub location: String,
    /// Time of collection.
    pub collected_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
/// Values needed to log a waste entry.
pub struct NewWasteEntry {
    /// Fraction of the waste.
    pub kind: WasteKind,
    /// Amount in kilograms.
    pub quantity: f64,
    /// Where the waste was handed in.
    pub location: String,
    /// Time of collection.
    pub collected_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Summed waste quantities per fraction.
pub struct WasteTotals {
    /// Organic total.
    pub organic: f64,
    /// Non-recyclable total.
    pub non_recyclable: f64,
    /// Hazardous total.
    pub hazardous: f64,
}

impl WasteTotals {
    /// Add a quantity to the matching fraction.
    pub fn add(&mut self, kind: WasteKind, quantity: f64) {
        match kind {
            WasteKind::Organic => self.organic += quantity,
            WasteKind::NonRecyclable => self.non_recyclable += quantity,
            WasteKind::Hazardous => self.hazardous += quantity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Processing state of a pickup request.
pub enum PickupStatus {
    /// Waiting for an authority.
    #[default]
    Pending,
    /// Scheduled by an authority.
    Accepted,
}

impl PickupStatus {
    /// Wire name of the status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PickupStatus::Pending => "pending",
            PickupStatus::Accepted => "accepted",
        }
    }
}

impl FromStr for PickupStatus {
    type Err = BinwatchError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "pending" => Ok(PickupStatus::Pending),
            "accepted" => Ok(PickupStatus::Accepted),
            other => Err(BinwatchError::Invalid(format!("unknown pickup status {other:?}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Resident request for an extra trash pickup.
pub struct PickupRequest {
    /// Unique identifier.
    pub id: PickupRequestId,
    /// Resident who asked for the pickup.
    pub owner: UserId,
    /// Where to pick up.
    pub address: String,
    /// Free-form note.
    pub description: Option<String>,
    /// Arbitrary client-provided bin details.
    pub bin_details: Option<serde_json::Value>,
    /// Processing state.
    pub status: PickupStatus,
    /// Submission time.
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
/// Values needed to submit a pickup request.
pub struct NewPickupRequest {
    /// Resident asking for the pickup.
    pub owner: UserId,
    /// Where to pick up.
    pub address: String,
    /// Free-form note.
    pub description: Option<String>,
    /// Arbitrary client-provided bin details.
    pub bin_details: Option<serde_json::Value>,
    /// Submission time.
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Pickup request joined with its requester and house, as listed for authorities.
pub struct PickupRequestView {
    /// The request itself.
    #[serde(flatten)]
    pub request: PickupRequest,
    /// Requester display name.
    pub requester_name: String,
    /// Requester e-mail.
    pub requester_email: String,
    /// Registered house of the requester, if any.
    pub house: Option<House>,
}
