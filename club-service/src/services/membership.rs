//! Membership lifecycle: join requests, approval and suspension, role
//! changes, removal, and ownership transfer.

use service_core::error::AppError;
use uuid::Uuid;

use super::error::{ClubError, MembershipError};
use super::{
    clamp_limit, load_club, page_from, require_club_capability, require_club_view, require_user,
};
use crate::auth::{AuthContext, ClubCapability, ClubRole};
use crate::config::PaginationConfig;
use crate::models::{
    ChangeMembershipRoleRequest, ChangeMembershipStatusRequest, ClubStatus, Membership,
    MembershipStatus, TransferOwnershipRequest,
};
use crate::repos::{ClubsRepo, MembershipsRepo, PagedResult};
use crate::store::StoreError;

#[derive(Clone)]
pub struct MembershipService {
    clubs: ClubsRepo,
    memberships: MembershipsRepo,
    pagination: PaginationConfig,
}

impl MembershipService {
    pub fn new(
        clubs: ClubsRepo,
        memberships: MembershipsRepo,
        pagination: PaginationConfig,
    ) -> Self {
        Self {
            clubs,
            memberships,
            pagination,
        }
    }

    /// Ask to join a club. Creates a pending membership awaiting approval by
    /// club leadership. Only active clubs accept join requests.
    pub async fn request_join(
        &self,
        auth: &AuthContext,
        club_id: Uuid,
    ) -> Result<Membership, AppError> {
        let user_id = require_user(auth)?;
        let club = load_club(&self.clubs, club_id).await?;
        if club.status != ClubStatus::Active {
            return Err(ClubError::NotActive {
                status: club.status,
            }
            .into());
        }

        let membership = Membership::pending(club_id, user_id);
        self.memberships
            .create(&membership)
            .await
            .map_err(|err| match err {
                StoreError::TransactionCancelled { .. } => {
                    MembershipError::AlreadyMember { club_id, user_id }.into()
                }
                other => AppError::from(other),
            })?;

        tracing::info!(club_id = %club_id, user = %user_id, "join requested");
        Ok(membership)
    }

    /// Members of a club, visible to active members and site admins.
    pub async fn list(
        &self,
        auth: &AuthContext,
        club_id: Uuid,
        limit: Option<usize>,
        cursor: Option<&str>,
    ) -> Result<PagedResult<Membership>, AppError> {
        require_club_view(&self.clubs, &self.memberships, auth, club_id).await?;
        let limit = clamp_limit(limit, &self.pagination);
        let page = page_from(limit, cursor, &crate::repos::club_pk(club_id))?;
        Ok(self.memberships.list(club_id, &page).await?)
    }

    /// The caller's memberships across clubs.
    pub async fn list_mine(
        &self,
        auth: &AuthContext,
        limit: Option<usize>,
        cursor: Option<&str>,
    ) -> Result<PagedResult<Membership>, AppError> {
        let user_id = require_user(auth)?;
        let limit = clamp_limit(limit, &self.pagination);
        let page = page_from(limit, cursor, &crate::repos::user_pk(user_id))?;
        Ok(self.memberships.list_for_user(user_id, &page).await?)
    }

    /// Approve, suspend, reinstate, or remove a member.
    ///
    /// Approval (pending -> active) needs the approval capability; every
    /// other status change needs member management. The owner's membership
    /// is immutable here: ownership must be transferred first.
    pub async fn change_status(
        &self,
        auth: &AuthContext,
        club_id: Uuid,
        target_user_id: Uuid,
        request: ChangeMembershipStatusRequest,
    ) -> Result<Membership, AppError> {
        let (_, caller) =
            require_club_view(&self.clubs, &self.memberships, auth, club_id).await?;

        let mut target = self
            .memberships
            .get(club_id, target_user_id)
            .await?
            .ok_or(MembershipError::NotFound {
                club_id,
                user_id: target_user_id,
            })?;

        let needed = if target.status == MembershipStatus::Pending
            && request.status == MembershipStatus::Active
        {
            ClubCapability::ApproveJoinRequests
        } else {
            ClubCapability::ManageMembers
        };
        if !auth.is_site_admin() {
            require_club_capability(caller.as_ref(), needed)?;
        }

        if target.role == ClubRole::Owner {
            return Err(MembershipError::CannotRemoveOwner.into());
        }
        if !target.status.can_transition_to(request.status) {
            return Err(MembershipError::InvalidStatusTransition {
                from: target.status,
                to: request.status,
            }
            .into());
        }

        let from = target.status;
        target.status = request.status;
        if request.status == MembershipStatus::Removed {
            self.memberships.remove(&target, from).await?;
        } else {
            self.memberships.update(&target, from).await?;
        }

        tracing::info!(
            club_id = %club_id,
            user = %target_user_id,
            %from,
            to = %target.status,
            "membership status changed"
        );
        Ok(target)
    }

    /// Leave a club voluntarily. Owners cannot leave; they transfer
    /// ownership first.
    pub async fn leave(&self, auth: &AuthContext, club_id: Uuid) -> Result<(), AppError> {
        let user_id = require_user(auth)?;
        let mut membership = self
            .memberships
            .get(club_id, user_id)
            .await?
            .ok_or(MembershipError::NotFound { club_id, user_id })?;

        if membership.role == ClubRole::Owner {
            return Err(MembershipError::CannotRemoveOwner.into());
        }
        if !membership.status.can_transition_to(MembershipStatus::Removed) {
            return Err(MembershipError::InvalidStatusTransition {
                from: membership.status,
                to: MembershipStatus::Removed,
            }
            .into());
        }

        let from = membership.status;
        membership.status = MembershipStatus::Removed;
        self.memberships.remove(&membership, from).await?;

        tracing::info!(club_id = %club_id, user = %user_id, "member left club");
        Ok(())
    }

    /// Change a member's role between member and admin. Ownership is never
    /// granted here; only the transfer operation moves it.
    pub async fn change_role(
        &self,
        auth: &AuthContext,
        club_id: Uuid,
        target_user_id: Uuid,
        request: ChangeMembershipRoleRequest,
    ) -> Result<Membership, AppError> {
        let (_, caller) =
            require_club_view(&self.clubs, &self.memberships, auth, club_id).await?;
        if !auth.is_site_admin() {
            require_club_capability(caller.as_ref(), ClubCapability::ManageMembers)?;
        }

        let mut target = self
            .memberships
            .get(club_id, target_user_id)
            .await?
            .ok_or(MembershipError::NotFound {
                club_id,
                user_id: target_user_id,
            })?;

        if !target.is_active() {
            return Err(MembershipError::NotActive {
                status: target.status,
            }
            .into());
        }
        if !target.role.can_transition_to(request.role) {
            return Err(MembershipError::InvalidRoleTransition {
                from: target.role,
                to: request.role,
            }
            .into());
        }

        let from = target.role;
        target.role = request.role;
        self.memberships
            .update(&target, MembershipStatus::Active)
            .await?;

        tracing::info!(
            club_id = %club_id,
            user = %target_user_id,
            from = %from,
            to = %target.role,
            "membership role changed"
        );
        Ok(target)
    }

    /// Transfer club ownership to another active member. The caller must be
    /// the current owner; the swap commits atomically so the club has
    /// exactly one owner at every point in time.
    pub async fn transfer_ownership(
        &self,
        auth: &AuthContext,
        club_id: Uuid,
        request: TransferOwnershipRequest,
    ) -> Result<Membership, AppError> {
        let (mut club, caller) =
            require_club_view(&self.clubs, &self.memberships, auth, club_id).await?;
        let caller = require_club_capability(caller.as_ref(), ClubCapability::TransferOwnership)?;

        let target_user_id = request.new_owner_user_id;
        if target_user_id == caller.user_id {
            return Err(MembershipError::TransferTargetNotActive {
                user_id: target_user_id,
            }
            .into());
        }

        let target = self
            .memberships
            .get(club_id, target_user_id)
            .await?
            .ok_or(MembershipError::NotFound {
                club_id,
                user_id: target_user_id,
            })?;
        if !target.is_active() {
            return Err(MembershipError::TransferTargetNotActive {
                user_id: target_user_id,
            }
            .into());
        }

        let mut outgoing = caller.clone();
        outgoing.role = ClubRole::Admin;
        let mut incoming = target;
        incoming.role = ClubRole::Owner;
        club.owner_user_id = incoming.user_id;
        club.updated_at = chrono::Utc::now();

        self.memberships
            .transfer_ownership(&club, &outgoing, &incoming)
            .await?;
        // Keep the discovery projection's owner in sync.
        self.clubs.update(&club, &club.name.clone()).await?;

        tracing::info!(
            club_id = %club_id,
            outgoing = %outgoing.user_id,
            incoming = %incoming.user_id,
            "ownership transferred"
        );
        Ok(incoming)
    }
}
