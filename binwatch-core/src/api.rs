//! Request and response bodies of the HTTP API.
//!
//! Requests are validated here, at the boundary, before any value reaches the service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classify::ClassificationResult;
use crate::error::BinwatchError;
use crate::model::{
    BinId, BinReading, NewHouse, PlasticSignal, Role, WasteBin, WasteEntry, WasteKind,
};
use crate::reward::RewardBreakdown;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Body of `POST /api/auth/signup`.
pub struct SignupRequest {
    /// Display name.
    pub name: String,
    /// Login e-mail.
    pub email: String,
    /// Chosen password.
    pub password: String,
    /// Requested role, `user` when absent.
    #[serde(default)]
    pub role: Option<Role>,
}

impl SignupRequest {
    /// Check that all required fields are present.
    ///
    /// # Errors
    ///
    /// Returns [`BinwatchError::Invalid`] when a field is blank or the e-mail is malformed.
    pub fn validate(&self) -> Result<(), BinwatchError> {
        if self.name.trim().is_empty() || self.email.trim().is_empty() || self.password.is_empty()
        {
            return Err(BinwatchError::Invalid(
                "Name, email and password are required".to_owned(),
            ));
        }
        if !looks_like_email(self.email.trim()) {
            return Err(BinwatchError::Invalid("Invalid email address".to_owned()));
        }
        Ok(())
    }
}

fn looks_like_email(email: &str) -> bool {
    email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Body of `POST /api/auth/login`.
pub struct LoginRequest {
    /// Login e-mail.
    pub email: String,
    /// Password.
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Response of signup and login.
pub struct AuthResponse {
    /// Human-readable outcome.
    pub message: String,
    /// Bearer token for later requests.
    pub token: String,
    /// End of token validity.
    pub expires_at: DateTime<Utc>,
    /// Display name of the account.
    pub name: String,
    /// Role of the account.
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Body of `PUT /api/user/house`.
pub struct HouseRequest {
    /// Postal address.
    pub address: String,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl HouseRequest {
    /// Validate into storable house values.
    ///
    /// # Errors
    ///
    /// Returns [`BinwatchError::Invalid`] for a blank address or impossible coordinates.
    pub fn into_new_house(self) -> Result<NewHouse, BinwatchError> {
        let address = self.address.trim();
        if address.is_empty() {
            return Err(BinwatchError::Invalid("Address is required".to_owned()));
        }
        if !(-90.0..=90.0).contains(&self.latitude) || !(-180.0..=180.0).contains(&self.longitude)
        {
            return Err(BinwatchError::Invalid("Invalid coordinates".to_owned()));
        }
        Ok(NewHouse {
            address: address.to_owned(),
            latitude: self.latitude,
            longitude: self.longitude,
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Body of `PUT /api/waste/levels`. Levels are checked by [`BinReading::new`].
pub struct LevelsRequest {
    /// Organic section fill percentage.
    pub organic_level: f64,
    /// Non-recyclable section fill percentage.
    pub non_recyclable_level: f64,
    /// Hazardous section fill percentage.
    pub hazardous_level: f64,
}

impl LevelsRequest {
    /// Validate into a reading.
    ///
    /// # Errors
    ///
    /// Returns [`BinwatchError::OutOfRange`] when a level is outside `0..=100`.
    pub fn reading(&self) -> Result<BinReading, BinwatchError> {
        BinReading::new(
            self.organic_level,
            self.non_recyclable_level,
            self.hazardous_level,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Bin together with its classification.
pub struct BinStatus {
    /// Stored bin.
    #[serde(flatten)]
    pub bin: WasteBin,
    /// Classification of its levels.
    pub status: ClassificationResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
/// Response of `GET /api/waste/levels`, depending on the caller's role.
pub enum LevelsView {
    /// The caller's own bin.
    Own(BinStatus),
    /// Bins of all residents assigned to the calling authority.
    Assigned(Vec<BinStatus>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Body of `POST /api/waste/add`.
pub struct WasteEntryRequest {
    /// Fraction name: `organic`, `nonRecyclable` or `hazardous`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Amount in kilograms.
    pub quantity: f64,
    /// Where the waste was handed in.
    pub location: String,
}

impl WasteEntryRequest {
    /// Validate into a fraction, quantity and trimmed location.
    ///
    /// # Errors
    ///
    /// Returns [`BinwatchError::Invalid`] for an unknown type, a non-positive quantity, or a
    /// blank location.
    pub fn validate(&self) -> Result<(WasteKind, f64, String), BinwatchError> {
        let kind = self.kind.parse::<WasteKind>()?;
        if !self.quantity.is_finite() || self.quantity <= 0.0 {
            return Err(BinwatchError::Invalid("Invalid quantity".to_owned()));
        }
        let location = self.location.trim();
        if location.is_empty() {
            return Err(BinwatchError::Invalid("Location is required".to_owned()));
        }
        Ok((kind, self.quantity, location.to_owned()))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Body of `POST /api/waste/image-detection`.
pub struct PlasticDetectionRequest {
    /// Bin the photo was taken of.
    pub bin_id: BinId,
    /// Whether plastic was found.
    pub plastic_detected: bool,
    /// Detector confidence in `0..=1`.
    pub confidence: f64,
}

impl PlasticDetectionRequest {
    /// Validate into a detector signal.
    ///
    /// # Errors
    ///
    /// Returns [`BinwatchError::Invalid`] when the confidence is outside `0..=1`.
    pub fn signal(&self) -> Result<PlasticSignal, BinwatchError> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(BinwatchError::Invalid(
                "Confidence must be between 0 and 1".to_owned(),
            ));
        }
        Ok(PlasticSignal {
            detected: self.plastic_detected,
            confidence: self.confidence,
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Response of reward calculation.
pub struct RewardPointsResponse {
    /// Newly stored breakdown.
    pub points: RewardBreakdown,
    /// When it was computed.
    pub last_calculated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Resident dashboard payload.
pub struct DashboardResponse {
    /// The resident's bin with classification, if reported yet.
    pub bin_data: Option<DashboardBin>,
    /// Waste log of the last seven days, newest first.
    pub waste_history: Vec<WasteEntry>,
    /// Latest stored rewards, zeros when never calculated.
    pub rewards: RewardBreakdown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Bin block of the resident dashboard.
pub struct DashboardBin {
    /// Bin with classification.
    #[serde(flatten)]
    pub bin: BinStatus,
    /// Address of the resident's house.
    pub house_address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Body of `POST /api/pickup-requests`.
pub struct PickupRequestBody {
    /// Where to pick up.
    pub address: String,
    /// Free-form note.
    #[serde(default)]
    pub description: Option<String>,
    /// Arbitrary bin details.
    #[serde(default)]
    pub bin_details: Option<serde_json::Value>,
}

impl PickupRequestBody {
    /// Check that an address was given.
    ///
    /// # Errors
    ///
    /// Returns [`BinwatchError::Invalid`] when the address is blank.
    pub fn validate(&self) -> Result<(), BinwatchError> {
        if self.address.trim().is_empty() {
            return Err(BinwatchError::Invalid("Address is required".to_owned()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Generic outcome message.
pub struct MessageResponse {
    /// Human-readable message.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_requires_all_fields() {
        let request = SignupRequest {
            name: "Ada".to_owned(),
            email: "ada@example.org".to_owned(),
            password: String::new(),
            role: None,
        };
        assert!(matches!(request.validate(), Err(BinwatchError::Invalid(_))));
    }

    #[test]
    fn signup_rejects_malformed_email() {
        let request = SignupRequest {
            name: "Ada".to_owned(),
            email: "ada.example.org".to_owned(),
            password: "secret".to_owned(),
            role: Some(Role::Authority),
        };
        assert!(matches!(request.validate(), Err(BinwatchError::Invalid(_))));
    }

    #[test]
    fn signup_role_is_optional_on_the_wire() {
        let request: SignupRequest = serde_json::from_str(
            r#"{"name":"Ada","email":"ada@example.org","password":"secret"}"#,
        )
        .expect("valid body");
        assert!(request.role.is_none());
        assert!(request.validate().is_ok(), "complete signup validates");
    }

    #[test]
    fn waste_entry_validation() {
        let entry = WasteEntryRequest {
            kind: "nonRecyclable".to_owned(),
            quantity: 2.5,
            location: "  Depot  ".to_owned(),
        };
        let (kind, quantity, location) = entry.validate().expect("valid entry");
        assert_eq!(kind, WasteKind::NonRecyclable);
        assert!((quantity - 2.5).abs() < f64::EPSILON);
        assert_eq!(location, "Depot");

        let bad_type = WasteEntryRequest {
            kind: "plastic".to_owned(),
            ..entry.clone()
        };
        assert!(matches!(bad_type.validate(), Err(BinwatchError::Invalid(_))));

        let bad_quantity = WasteEntryRequest {
            quantity: 0.0,
            ..entry.clone()
        };
        assert!(matches!(bad_quantity.validate(), Err(BinwatchError::Invalid(_))));

        let no_location = WasteEntryRequest {
            location: " ".to_owned(),
            ..entry
        };
        assert!(matches!(no_location.validate(), Err(BinwatchError::Invalid(_))));
    }

    #[test]
    fn levels_outside_range_are_out_of_range() {
        let levels = LevelsRequest {
            organic_level: 50.0,
            non_recyclable_level: 101.0,
            hazardous_level: 0.0,
        };
        assert!(matches!(
            levels.reading(),
            Err(BinwatchError::OutOfRange {
                kind: WasteKind::NonRecyclable,
                ..
            })
        ));
    }

    #[test]
    fn reading_cannot_be_deserialized_out_of_range() {
        let parsed = serde_json::from_str::<BinReading>(
            r#"{"organicLevel":120,"nonRecyclableLevel":0,"hazardousLevel":0}"#,
        );
        assert!(parsed.is_err(), "levels above 100 must not deserialize");
    }

    #[test]
    fn detection_confidence_is_bounded() {
        let request = PlasticDetectionRequest {
            bin_id: BinId(1),
            plastic_detected: true,
            confidence: 1.5,
        };
        assert!(matches!(request.signal(), Err(BinwatchError::Invalid(_))));
    }

    #[test]
    fn house_requires_address_and_sane_coordinates() {
        let blank = HouseRequest {
            address: "   ".to_owned(),
            latitude: 0.0,
            longitude: 0.0,
        };
        assert!(matches!(blank.into_new_house(), Err(BinwatchError::Invalid(_))));

        let far = HouseRequest {
            address: "1 Main St".to_owned(),
            latitude: 91.0,
            longitude: 0.0,
        };
        assert!(matches!(far.into_new_house(), Err(BinwatchError::Invalid(_))));
    }
}
