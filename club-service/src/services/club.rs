//! Club lifecycle: creation with the founding owner, profile updates,
//! discovery listing, and status transitions.

use std::sync::Arc;

use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use super::error::ClubError;
use super::{
    clamp_limit, load_club, page_from, require_club_capability, require_club_view, require_user,
};
use crate::auth::{
    AuthContext, AuthorizationService, ClubCapability, ClubRole, SystemCapability,
};
use crate::config::PaginationConfig;
use crate::models::{
    ChangeClubStatusRequest, Club, ClubStatus, CreateClubRequest, Membership, UpdateClubRequest,
};
use crate::repos::clubs::ClubFilter;
use crate::repos::{ClubsRepo, MembershipsRepo, PagedResult};
use crate::store::StoreError;

#[derive(Clone)]
pub struct ClubService {
    clubs: ClubsRepo,
    memberships: MembershipsRepo,
    authz: Arc<AuthorizationService>,
    pagination: PaginationConfig,
}

impl ClubService {
    pub fn new(
        clubs: ClubsRepo,
        memberships: MembershipsRepo,
        authz: Arc<AuthorizationService>,
        pagination: PaginationConfig,
    ) -> Self {
        Self {
            clubs,
            memberships,
            authz,
            pagination,
        }
    }

    /// Create a club. The creator becomes the owner; the club record and the
    /// owner's active membership commit in one transaction, so a club never
    /// exists without its owner.
    pub async fn create(
        &self,
        auth: &AuthContext,
        request: CreateClubRequest,
    ) -> Result<Club, AppError> {
        let user_id = require_user(auth)?;
        request.validate()?;

        let club = Club::new(
            request.name.trim().to_string(),
            request.description,
            request.city,
            request.logo_url,
            user_id,
        );
        let owner = Membership::active(club.club_id, user_id, ClubRole::Owner);

        self.clubs
            .create(&club, self.memberships.create_ops(&owner)?)
            .await
            .map_err(|err| match err {
                StoreError::TransactionCancelled { .. } => ClubError::NameConflict {
                    name: club.name.clone(),
                }
                .into(),
                other => AppError::from(other),
            })?;

        tracing::info!(club_id = %club.club_id, owner = %user_id, name = %club.name, "club created");
        Ok(club)
    }

    /// Public club lookup. Club metadata is discoverable by anyone; only
    /// internals (members, rides, invitations) are membership-gated.
    pub async fn get(&self, club_id: Uuid) -> Result<Club, AppError> {
        load_club(&self.clubs, club_id).await
    }

    /// Public discovery listing with optional status and city filters.
    pub async fn list(
        &self,
        limit: Option<usize>,
        cursor: Option<&str>,
        filter: ClubFilter,
    ) -> Result<PagedResult<Club>, AppError> {
        let limit = clamp_limit(limit, &self.pagination);
        let page = page_from(limit, cursor, "CLUBS")?;
        Ok(self.clubs.list(&page, &filter).await?)
    }

    /// Update profile fields. Requires the profile-editing club capability,
    /// or the club-management system capability for site admins.
    pub async fn update(
        &self,
        auth: &AuthContext,
        club_id: Uuid,
        request: UpdateClubRequest,
    ) -> Result<Club, AppError> {
        request.validate()?;

        let (mut club, membership) = self.resolve_for_admin(auth, club_id).await?;
        if !auth.is_site_admin() {
            require_club_capability(membership.as_ref(), ClubCapability::EditClubProfile)?;
        }

        if request.is_empty() {
            return Ok(club);
        }

        let previous_name = club.name.clone();
        if let Some(name) = request.name {
            let name = name.trim().to_string();
            if Club::name_key(&name) != Club::name_key(&previous_name)
                && self.clubs.name_taken_by_other(&name, club_id).await?
            {
                return Err(ClubError::NameConflict { name }.into());
            }
            club.name = name;
        }
        if let Some(description) = request.description {
            club.description = Some(description);
        }
        if let Some(city) = request.city {
            club.city = Some(city);
        }
        if let Some(logo_url) = request.logo_url {
            club.logo_url = Some(logo_url);
        }
        club.updated_at = chrono::Utc::now();

        self.clubs
            .update(&club, &previous_name)
            .await
            .map_err(|err| match err {
                StoreError::TransactionCancelled { .. } => ClubError::NameConflict {
                    name: club.name.clone(),
                }
                .into(),
                other => AppError::from(other),
            })?;

        tracing::info!(club_id = %club.club_id, "club profile updated");
        Ok(club)
    }

    /// Move a club to a new lifecycle status.
    ///
    /// Suspension and reinstatement are site-admin operations. Archival is
    /// available to site admins and to the club owner.
    pub async fn change_status(
        &self,
        auth: &AuthContext,
        club_id: Uuid,
        request: ChangeClubStatusRequest,
    ) -> Result<Club, AppError> {
        let (mut club, membership) = self.resolve_for_admin(auth, club_id).await?;

        match request.status {
            ClubStatus::Archived => {
                let site_admin = self
                    .authz
                    .authorize(auth, SystemCapability::ArchiveClubs, Some("club"))
                    .granted;
                if !site_admin {
                    require_club_capability(membership.as_ref(), ClubCapability::ArchiveClub)?;
                }
            }
            ClubStatus::Suspended | ClubStatus::Active => {
                let check = self
                    .authz
                    .authorize(auth, SystemCapability::SuspendClubs, Some("club"))
                    .into_denied();
                if let Some(check) = check {
                    return Err(check.into_forbidden());
                }
            }
        }

        if !club.status.can_transition_to(request.status) {
            return Err(ClubError::InvalidStatusTransition {
                from: club.status,
                to: request.status,
            }
            .into());
        }

        let from = club.status;
        club.status = request.status;
        club.updated_at = chrono::Utc::now();
        self.clubs.update(&club, &club.name.clone()).await?;

        tracing::info!(club_id = %club.club_id, %from, to = %club.status, "club status changed");
        Ok(club)
    }

    /// Load the club for a privileged operation. Site admins bypass the
    /// membership gate; everyone else goes through the visibility check.
    async fn resolve_for_admin(
        &self,
        auth: &AuthContext,
        club_id: Uuid,
    ) -> Result<(Club, Option<Membership>), AppError> {
        if auth.is_site_admin() {
            require_user(auth)?;
            let club = load_club(&self.clubs, club_id).await?;
            Ok((club, None))
        } else {
            require_club_view(&self.clubs, &self.memberships, auth, club_id).await
        }
    }
}
