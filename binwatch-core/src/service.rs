//! High-level service facade combining storage, security and the scoring rules.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::api::{
    AuthResponse, BinStatus, DashboardBin, DashboardResponse, HouseRequest, LevelsRequest,
    LevelsView, LoginRequest, PickupRequestBody, PlasticDetectionRequest, RewardPointsResponse,
    SignupRequest, WasteEntryRequest,
};
use crate::backend::{Backend, Security};
use crate::classify::classify_reading;
use crate::error::BinwatchError;
use crate::model::{
    House, NewPickupRequest, NewUser, NewWasteEntry, PickupRequest, PickupRequestId,
    PickupRequestView, PickupStatus, Role, Session, User, UserId, WasteBin, WasteEntry,
    WasteTotals,
};
use crate::overview::{AuthorityOverview, build_overview};
use crate::ports::PortError;
use crate::reward::{RewardBreakdown, RewardScorer};

/// Days of waste log shown on the resident dashboard.
pub const HISTORY_DAYS: i64 = 7;

/// Public entry point for every operation of the API.
pub struct BinwatchService {
    backend: Backend,
    security: Security,
    scorer: RewardScorer,
}

impl BinwatchService {
    /// Create a new service bound to storage, security capabilities and a reward scorer.
    #[must_use]
    pub fn new(backend: Backend, security: Security, scorer: RewardScorer) -> Self {
        Self {
            backend,
            security,
            scorer,
        }
    }

    /// Scorer in effect.
    #[must_use]
    pub fn scorer(&self) -> &RewardScorer {
        &self.scorer
    }

    /// Create an account and log it in.
    ///
    /// # Errors
    ///
    /// Returns [`BinwatchError::Invalid`] for incomplete requests, [`BinwatchError::Conflict`]
    /// when the e-mail is taken, or a storage error.
    pub async fn signup(&self, request: SignupRequest) -> Result<AuthResponse, BinwatchError> {
        request.validate()?;
        let role = request.role.unwrap_or_default();
        let email = request.email.trim().to_ascii_lowercase();
        info!(%email, %role, "signup attempt");

        if self.backend.accounts.user_by_email(&email).await?.is_some() {
            return Err(BinwatchError::Conflict("User"));
        }

        let password_hash = self.security.hasher.hash(&request.password)?;
        let user = self
            .backend
            .accounts
            .create_user(NewUser {
                name: request.name.trim().to_owned(),
                email,
                password_hash,
                role,
            })
            .await
            .map_err(|err| match err {
                PortError::Duplicate(_) => BinwatchError::Conflict("User"),
                other => BinwatchError::Port(other),
            })?;

        info!(user = %user.id, "user created");
        Ok(self.auth_response("User created successfully", &user))
    }

    /// Check credentials and issue a session token.
    ///
    /// # Errors
    ///
    /// Returns [`BinwatchError::InvalidCredentials`] for an unknown e-mail or wrong password.
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, BinwatchError> {
        let email = request.email.trim().to_ascii_lowercase();
        let Some(user) = self.backend.accounts.user_by_email(&email).await? else {
            debug!(%email, "login for unknown email");
            return Err(BinwatchError::InvalidCredentials);
        };
        if !self
            .security
            .hasher
            .verify(&request.password, &user.password_hash)
        {
            debug!(user = %user.id, "login with wrong password");
            return Err(BinwatchError::InvalidCredentials);
        }
        info!(user = %user.id, "login successful");
        Ok(self.auth_response("Login successful", &user))
    }

    /// Turn a bearer token into a session.
    ///
    /// # Errors
    ///
    /// Returns [`BinwatchError::Auth`] when the token is rejected.
    pub fn authenticate(&self, token: &str) -> Result<Session, BinwatchError> {
        Ok(self.security.authenticator.verify(token, Utc::now())?)
    }

    fn auth_response(&self, message: &str, user: &User) -> AuthResponse {
        let issued = self.security.authenticator.issue(
            Session {
                user: user.id,
                role: user.role,
            },
            Utc::now(),
        );
        AuthResponse {
            message: message.to_owned(),
            token: issued.token,
            expires_at: issued.expires_at,
            name: user.name.clone(),
            role: user.role,
        }
    }

    /// Register or move the caller's house.
    ///
    /// # Errors
    ///
    /// Returns [`BinwatchError::Forbidden`] for authorities and [`BinwatchError::Invalid`] for
    /// bad locations.
    pub async fn register_house(
        &self,
        session: &Session,
        request: HouseRequest,
    ) -> Result<House, BinwatchError> {
        require_resident(session)?;
        let house = request.into_new_house()?;
        Ok(self.backend.bins.upsert_house(session.user, house).await?)
    }

    /// Store new fill levels for the caller's bin, classify them and rescore the resident.
    ///
    /// # Errors
    ///
    /// Returns [`BinwatchError::OutOfRange`] for bad levels and [`BinwatchError::NotFound`]
    /// when no house is registered.
    pub async fn report_levels(
        &self,
        session: &Session,
        request: LevelsRequest,
    ) -> Result<BinStatus, BinwatchError> {
        require_resident(session)?;
        let reading = request.reading()?;
        let house = self
            .backend
            .bins
            .house_of(session.user)
            .await?
            .ok_or(BinwatchError::NotFound("House"))?;
        let now = Utc::now();
        let bin = self.backend.bins.save_levels(&house, reading, now).await?;
        self.rescore(&bin, now).await?;
        Ok(with_status(bin))
    }

    /// The caller's bin, or for authorities every bin of their residents.
    ///
    /// # Errors
    ///
    /// Returns [`BinwatchError::NotFound`] when a resident has no bin.
    pub async fn bin_levels(&self, session: &Session) -> Result<LevelsView, BinwatchError> {
        if session.is_authority() {
            let residents = self.resident_ids(session.user).await?;
            let bins = self
                .backend
                .bins
                .houses_with_bins(&residents)
                .await?
                .into_iter()
                .filter_map(|(_, bin)| bin.map(with_status))
                .collect();
            return Ok(LevelsView::Assigned(bins));
        }

        let bin = self.own_bin(session.user).await?;
        Ok(LevelsView::Own(with_status(bin)))
    }

    /// Log handed-in waste.
    ///
    /// # Errors
    ///
    /// Returns [`BinwatchError::Invalid`] for an invalid entry.
    pub async fn add_waste(
        &self,
        session: &Session,
        request: WasteEntryRequest,
    ) -> Result<WasteEntry, BinwatchError> {
        let (kind, quantity, location) = request.validate()?;
        let entry = NewWasteEntry {
            kind,
            quantity,
            location,
            collected_at: Utc::now(),
        };
        Ok(self
            .backend
            .bins
            .add_waste_entry(session.user, entry)
            .await?)
    }

    /// Summed waste log per fraction for the caller.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn waste_stats(&self, session: &Session) -> Result<WasteTotals, BinwatchError> {
        Ok(self.backend.bins.waste_totals(session.user).await?)
    }

    /// Everything the resident dashboard shows.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn dashboard(&self, session: &Session) -> Result<DashboardResponse, BinwatchError> {
        let bins = &self.backend.bins;
        let bin_data = match bins.bin_of(session.user).await? {
            Some(bin) => {
                let house_address = bins.house_of(session.user).await?.map(|house| house.address);
                Some(DashboardBin {
                    bin: with_status(bin),
                    house_address,
                })
            }
            None => {
                debug!(user = %session.user, "no waste bin for dashboard");
                None
            }
        };

        let since = Utc::now() - Duration::days(HISTORY_DAYS);
        let waste_history = if bin_data.is_some() {
            bins.waste_history(session.user, since).await?
        } else {
            Vec::new()
        };

        let rewards = self
            .backend
            .rewards
            .latest(session.user)
            .await?
            .map_or_else(RewardBreakdown::default, |snapshot| snapshot.breakdown);

        Ok(DashboardResponse {
            bin_data,
            waste_history,
            rewards,
        })
    }

    /// Score the caller's bin and replace the stored reward snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`BinwatchError::NotFound`] when the caller has no bin.
    pub async fn calculate_rewards(
        &self,
        session: &Session,
    ) -> Result<RewardPointsResponse, BinwatchError> {
        let bin = self.own_bin(session.user).await?;
        self.rescore(&bin, Utc::now()).await
    }

    /// Record plastic detector output for one of the caller's bins and rescore it.
    ///
    /// # Errors
    ///
    /// Returns [`BinwatchError::NotFound`] when the bin does not belong to the caller and
    /// [`BinwatchError::Invalid`] for a bad confidence.
    pub async fn record_plastic_detection(
        &self,
        session: &Session,
        request: PlasticDetectionRequest,
    ) -> Result<RewardPointsResponse, BinwatchError> {
        let signal = request.signal()?;
        let now = Utc::now();
        let bin = self
            .backend
            .bins
            .record_plastic(session.user, request.bin_id, signal, now)
            .await?
            .ok_or(BinwatchError::NotFound("Waste bin"))?;
        info!(bin = bin.id.0, detected = signal.detected, "plastic detection recorded");
        self.rescore(&bin, now).await
    }

    async fn rescore(
        &self,
        bin: &WasteBin,
        now: DateTime<Utc>,
    ) -> Result<RewardPointsResponse, BinwatchError> {
        let previous = self.backend.rewards.latest(bin.owner).await?;
        let snapshot = self.scorer.snapshot(
            bin.owner,
            previous.as_ref(),
            &bin.reading,
            bin.plastic_signal(),
            now,
        );
        self.backend.rewards.upsert(&snapshot).await?;
        debug!(user = %bin.owner, total = snapshot.breakdown.total_points, "rewards stored");
        Ok(RewardPointsResponse {
            points: snapshot.breakdown,
            last_calculated: snapshot.last_calculated,
        })
    }

    /// Dashboard over all houses of the calling authority's residents.
    ///
    /// # Errors
    ///
    /// Returns [`BinwatchError::Forbidden`] for residents.
    pub async fn authority_overview(
        &self,
        session: &Session,
    ) -> Result<AuthorityOverview, BinwatchError> {
        require_authority(session)?;
        let residents = self.resident_ids(session.user).await?;
        let houses = self.backend.bins.houses_with_bins(&residents).await?;
        let rewards = self.backend.rewards.for_owners(&residents).await?;
        let overview = build_overview(houses, &rewards);
        info!(
            authority = %session.user,
            houses = overview.stats.total_houses,
            critical = overview.stats.critical_bins,
            "authority overview built"
        );
        Ok(overview)
    }

    /// Ask for an extra pickup.
    ///
    /// # Errors
    ///
    /// Returns [`BinwatchError::Invalid`] when no address is given.
    pub async fn submit_pickup_request(
        &self,
        session: &Session,
        request: PickupRequestBody,
    ) -> Result<PickupRequest, BinwatchError> {
        request.validate()?;
        let created = self
            .backend
            .pickups
            .create(NewPickupRequest {
                owner: session.user,
                address: request.address.trim().to_owned(),
                description: request.description,
                bin_details: request.bin_details,
                created_at: Utc::now(),
            })
            .await?;
        info!(request = %created.id, user = %session.user, "pickup requested");
        Ok(created)
    }

    /// Pickup requests of the calling authority's residents, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`BinwatchError::Forbidden`] for residents.
    pub async fn pickup_requests(
        &self,
        session: &Session,
    ) -> Result<Vec<PickupRequestView>, BinwatchError> {
        require_authority(session)?;
        let residents = self.resident_ids(session.user).await?;
        Ok(self.backend.pickups.for_owners(&residents).await?)
    }

    /// Accept a pickup request of one of the caller's residents.
    ///
    /// # Errors
    ///
    /// Returns [`BinwatchError::Forbidden`] for residents and [`BinwatchError::NotFound`] when
    /// the request does not exist or belongs to another authority's resident.
    pub async fn accept_pickup_request(
        &self,
        session: &Session,
        id: PickupRequestId,
    ) -> Result<(), BinwatchError> {
        require_authority(session)?;
        let not_found = || BinwatchError::NotFound("Request");
        let request = self.backend.pickups.get(id).await?.ok_or_else(not_found)?;
        let requester = self
            .backend
            .accounts
            .user(request.owner)
            .await?
            .ok_or_else(not_found)?;
        if requester.authority_id != Some(session.user) {
            return Err(not_found());
        }
        if request.status != PickupStatus::Accepted {
            self.backend
                .pickups
                .set_status(id, PickupStatus::Accepted)
                .await?;
            info!(request = %id, authority = %session.user, "pickup accepted");
        }
        Ok(())
    }

    /// Give each authority, in id order, up to `per_authority` unassigned residents.
    ///
    /// # Errors
    ///
    /// Returns [`BinwatchError::NotFound`] when there are no authorities.
    pub async fn assign_unclaimed_residents(
        &self,
        per_authority: usize,
    ) -> Result<Vec<(UserId, UserId)>, BinwatchError> {
        let accounts = &self.backend.accounts;
        let authorities = accounts.authorities().await?;
        if authorities.is_empty() {
            return Err(BinwatchError::NotFound("Authority"));
        }
        let mut residents = accounts.unassigned_residents().await?.into_iter();

        let mut assigned = Vec::new();
        for authority in &authorities {
            for resident in residents.by_ref().take(per_authority) {
                accounts.assign(resident.id, authority.id).await?;
                info!(resident = %resident.id, authority = %authority.id, "resident assigned");
                assigned.push((resident.id, authority.id));
            }
        }
        if residents.next().is_some() {
            warn!("more unassigned residents than authority capacity");
        }
        Ok(assigned)
    }

    async fn own_bin(&self, owner: UserId) -> Result<WasteBin, BinwatchError> {
        self.backend
            .bins
            .bin_of(owner)
            .await?
            .ok_or(BinwatchError::NotFound("Waste bin"))
    }

    async fn resident_ids(&self, authority: UserId) -> Result<Vec<UserId>, BinwatchError> {
        Ok(self
            .backend
            .accounts
            .residents_of(authority)
            .await?
            .into_iter()
            .map(|user| user.id)
            .collect())
    }
}

fn with_status(bin: WasteBin) -> BinStatus {
    let status = classify_reading(&bin.reading);
    if status.alert_triggered {
        warn!(
            bin = bin.id.0,
            overall_fill = status.overall_fill,
            "bin needs emptying"
        );
    }
    BinStatus { bin, status }
}

fn require_authority(session: &Session) -> Result<(), BinwatchError> {
    if session.role == Role::Authority {
        Ok(())
    } else {
        Err(BinwatchError::Forbidden("authority role required"))
    }
}

fn require_resident(session: &Session) -> Result<(), BinwatchError> {
    if session.role == Role::User {
        Ok(())
    } else {
        Err(BinwatchError::Forbidden("resident role required"))
    }
}
