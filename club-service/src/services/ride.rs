//! Ride lifecycle and participation.
//!
//! Rides start as drafts, move forward through publish/start/complete, and
//! can be cancelled before they start. Joins and leaves pair a participant
//! row with a counter-conditioned ride update, so the capacity cap holds
//! under concurrent joins.

use chrono::Utc;
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use super::error::{ClubError, RideError};
use super::{
    clamp_limit, load_club, page_from, require_club_capability, require_club_view, require_user,
};
use crate::auth::club_capabilities::role_has_capability;
use crate::auth::{AuthContext, ClubCapability};
use crate::config::PaginationConfig;
use crate::models::{
    CancelRideRequest, Club, ClubStatus, CreateRideRequest, Membership, Participant, Ride,
    RideAudience, RideStatus,
};
use crate::repos::{ClubsRepo, MembershipsRepo, PagedResult, RidesRepo};

#[derive(Clone)]
pub struct RideService {
    clubs: ClubsRepo,
    memberships: MembershipsRepo,
    rides: RidesRepo,
    pagination: PaginationConfig,
}

impl RideService {
    pub fn new(
        clubs: ClubsRepo,
        memberships: MembershipsRepo,
        rides: RidesRepo,
        pagination: PaginationConfig,
    ) -> Self {
        Self {
            clubs,
            memberships,
            rides,
            pagination,
        }
    }

    /// Create a ride as a draft. Requires the ride-creation capability and
    /// an active club.
    pub async fn create(
        &self,
        auth: &AuthContext,
        club_id: Uuid,
        request: CreateRideRequest,
    ) -> Result<Ride, AppError> {
        request.validate()?;

        let (club, caller) =
            require_club_view(&self.clubs, &self.memberships, auth, club_id).await?;
        if !auth.is_site_admin() {
            require_club_capability(caller.as_ref(), ClubCapability::CreateRides)?;
        }
        if club.status != ClubStatus::Active {
            return Err(ClubError::NotActive {
                status: club.status,
            }
            .into());
        }

        let created_by = require_user(auth)?;
        let ride = Ride::new(
            club_id,
            request.title.trim().to_string(),
            request.description,
            request.audience,
            created_by,
            request.start_at,
            request.max_participants,
        );
        self.rides.create(&ride).await?;

        tracing::info!(club_id = %club_id, ride_id = %ride.ride_id, created_by = %created_by, "ride created");
        Ok(ride)
    }

    /// Fetch a ride. Members (and site admins) see every ride of the club;
    /// other authenticated users only see open-audience rides that have
    /// left draft.
    pub async fn get(
        &self,
        auth: &AuthContext,
        club_id: Uuid,
        ride_id: Uuid,
    ) -> Result<Ride, AppError> {
        let (ride, _, _) = self.resolve_visible(auth, club_id, ride_id).await?;
        Ok(ride)
    }

    /// Rides of a club, for active members and site admins. Drafts are only
    /// shown to callers who can create rides (filtered per fetched page, so
    /// a page may carry fewer than `limit` rides for plain members).
    pub async fn list(
        &self,
        auth: &AuthContext,
        club_id: Uuid,
        limit: Option<usize>,
        cursor: Option<&str>,
    ) -> Result<PagedResult<Ride>, AppError> {
        let (_, caller) =
            require_club_view(&self.clubs, &self.memberships, auth, club_id).await?;
        let sees_drafts = auth.is_site_admin()
            || caller
                .as_ref()
                .is_some_and(|m| role_has_capability(m.role, ClubCapability::CreateRides));

        let limit = clamp_limit(limit, &self.pagination);
        let page = page_from(limit, cursor, &crate::repos::club_pk(club_id))?;
        let mut result = self.rides.list(club_id, &page).await?;
        if !sees_drafts {
            result.items.retain(|r| r.status != RideStatus::Draft);
        }
        Ok(result)
    }

    /// Publish a draft ride, opening it for joins.
    pub async fn publish(
        &self,
        auth: &AuthContext,
        club_id: Uuid,
        ride_id: Uuid,
    ) -> Result<Ride, AppError> {
        self.transition(auth, club_id, ride_id, RideStatus::Published, ClubCapability::PublishOfficialRides)
            .await
    }

    /// Mark a published ride as underway.
    pub async fn start(
        &self,
        auth: &AuthContext,
        club_id: Uuid,
        ride_id: Uuid,
    ) -> Result<Ride, AppError> {
        self.transition(auth, club_id, ride_id, RideStatus::Active, ClubCapability::CreateRides)
            .await
    }

    /// Mark an active ride as completed.
    pub async fn complete(
        &self,
        auth: &AuthContext,
        club_id: Uuid,
        ride_id: Uuid,
    ) -> Result<Ride, AppError> {
        self.transition(auth, club_id, ride_id, RideStatus::Completed, ClubCapability::CreateRides)
            .await
    }

    /// Cancel a ride before it starts, recording who cancelled and why.
    pub async fn cancel(
        &self,
        auth: &AuthContext,
        club_id: Uuid,
        ride_id: Uuid,
        request: CancelRideRequest,
    ) -> Result<Ride, AppError> {
        request.validate()?;

        let (_, caller) =
            require_club_view(&self.clubs, &self.memberships, auth, club_id).await?;
        if !auth.is_site_admin() {
            require_club_capability(caller.as_ref(), ClubCapability::CancelRides)?;
        }

        let mut ride = self.load_ride(club_id, ride_id).await?;
        if !ride.status.can_transition_to(RideStatus::Cancelled) {
            return Err(RideError::InvalidStatusTransition {
                from: ride.status,
                to: RideStatus::Cancelled,
            }
            .into());
        }

        let from = ride.status;
        let now = Utc::now();
        ride.status = RideStatus::Cancelled;
        ride.cancelled_by = auth.user_id;
        ride.cancelled_at = Some(now);
        ride.cancellation_reason = request.reason;
        ride.updated_at = now;
        self.rides.update_status(&ride, from).await?;

        tracing::info!(club_id = %club_id, ride_id = %ride_id, %from, "ride cancelled");
        Ok(ride)
    }

    /// Join a published ride as a rider.
    ///
    /// Members-only rides require an active membership with the join
    /// capability; open rides accept any authenticated user while the club
    /// is active.
    pub async fn join(
        &self,
        auth: &AuthContext,
        club_id: Uuid,
        ride_id: Uuid,
    ) -> Result<Participant, AppError> {
        let user_id = require_user(auth)?;
        let (mut ride, club, caller) = self.resolve_visible(auth, club_id, ride_id).await?;

        if ride.audience == RideAudience::MembersOnly && !auth.is_site_admin() {
            require_club_capability(caller.as_ref(), ClubCapability::JoinRides)?;
        }
        if club.status != ClubStatus::Active {
            return Err(ClubError::NotActive {
                status: club.status,
            }
            .into());
        }
        if !ride.accepts_joins() {
            return Err(RideError::NotOpenForJoining {
                status: ride.status,
            }
            .into());
        }
        if !ride.has_capacity() {
            return Err(RideError::Full {
                max_participants: ride.max_participants.unwrap_or(0),
            }
            .into());
        }
        if self.rides.get_participant(ride_id, user_id).await?.is_some() {
            return Err(RideError::AlreadyJoined { user_id }.into());
        }

        let participant = Participant::rider(user_id);
        let observed_count = ride.participant_count;
        ride.participant_count = observed_count + 1;
        ride.updated_at = Utc::now();
        // A cancellation here means a concurrent writer moved the count or
        // the status; both surface as a retryable conflict.
        self.rides.join(&ride, &participant, observed_count).await?;

        tracing::info!(club_id = %club_id, ride_id = %ride_id, user = %user_id, "joined ride");
        Ok(participant)
    }

    /// Leave a published ride.
    pub async fn leave(
        &self,
        auth: &AuthContext,
        club_id: Uuid,
        ride_id: Uuid,
    ) -> Result<(), AppError> {
        let user_id = require_user(auth)?;
        let (mut ride, _, _) = self.resolve_visible(auth, club_id, ride_id).await?;

        if !ride.accepts_joins() {
            return Err(RideError::NotOpenForJoining {
                status: ride.status,
            }
            .into());
        }
        if self.rides.get_participant(ride_id, user_id).await?.is_none() {
            return Err(RideError::NotParticipant { user_id }.into());
        }

        let observed_count = ride.participant_count;
        ride.participant_count = observed_count.saturating_sub(1);
        ride.updated_at = Utc::now();
        self.rides.leave(&ride, user_id, observed_count).await?;

        tracing::info!(club_id = %club_id, ride_id = %ride_id, user = %user_id, "left ride");
        Ok(())
    }

    /// Participants of a ride, in join-key order.
    pub async fn participants(
        &self,
        auth: &AuthContext,
        club_id: Uuid,
        ride_id: Uuid,
        limit: Option<usize>,
        cursor: Option<&str>,
    ) -> Result<PagedResult<Participant>, AppError> {
        self.resolve_visible(auth, club_id, ride_id).await?;
        let limit = clamp_limit(limit, &self.pagination);
        let page = page_from(limit, cursor, &crate::repos::ride_pk(ride_id))?;
        Ok(self.rides.list_participants(ride_id, &page).await?)
    }

    async fn load_ride(&self, club_id: Uuid, ride_id: Uuid) -> Result<Ride, AppError> {
        self.rides
            .get(club_id, ride_id)
            .await?
            .ok_or_else(|| RideError::NotFound(ride_id).into())
    }

    /// Resolve a ride the caller may see. Active members and site admins see
    /// everything; other authenticated users only open-audience rides past
    /// draft, and club internals are never confirmed to anyone else.
    async fn resolve_visible(
        &self,
        auth: &AuthContext,
        club_id: Uuid,
        ride_id: Uuid,
    ) -> Result<(Ride, Club, Option<Membership>), AppError> {
        let user_id = require_user(auth)?;
        let club = load_club(&self.clubs, club_id).await?;

        let membership = self.memberships.get(club_id, user_id).await?;
        let is_member = membership.as_ref().is_some_and(|m| m.is_active());

        let ride = self.load_ride(club_id, ride_id).await?;
        if auth.is_site_admin() || is_member {
            return Ok((ride, club, membership));
        }
        if ride.audience == RideAudience::Open && ride.status != RideStatus::Draft {
            return Ok((ride, club, membership));
        }
        // Same shape as a missing club: internals stay hidden.
        Err(ClubError::NotFound(club_id).into())
    }

    /// Capability-gated forward transition shared by publish, start, and
    /// complete.
    async fn transition(
        &self,
        auth: &AuthContext,
        club_id: Uuid,
        ride_id: Uuid,
        target: RideStatus,
        needed: ClubCapability,
    ) -> Result<Ride, AppError> {
        let (_, caller) =
            require_club_view(&self.clubs, &self.memberships, auth, club_id).await?;
        if !auth.is_site_admin() {
            require_club_capability(caller.as_ref(), needed)?;
        }

        let mut ride = self.load_ride(club_id, ride_id).await?;
        if !ride.status.can_transition_to(target) {
            return Err(RideError::InvalidStatusTransition {
                from: ride.status,
                to: target,
            }
            .into());
        }

        let from = ride.status;
        ride.status = target;
        ride.updated_at = Utc::now();
        self.rides.update_status(&ride, from).await?;

        tracing::info!(club_id = %club_id, ride_id = %ride_id, %from, to = %target, "ride status changed");
        Ok(ride)
    }
}
