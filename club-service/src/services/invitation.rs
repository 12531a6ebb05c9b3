//! Invitation lifecycle: issuing, responding by token, and revocation.
//!
//! Expiry is lazy: a pending invitation past its deadline is reported (and
//! persisted) as expired the first time anything touches it.

use chrono::Utc;
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use super::error::{ClubError, InvitationError, MembershipError};
use super::{clamp_limit, page_from, require_club_capability, require_club_view, require_user};
use crate::auth::{AuthContext, ClubCapability, ClubRole};
use crate::config::{InvitationConfig, PaginationConfig};
use crate::models::{
    ClubStatus, CreateInvitationRequest, Invitation, InvitationStatus, Membership,
};
use crate::repos::{ClubsRepo, InvitationsRepo, MembershipsRepo, PagedResult};
use crate::store::StoreError;

#[derive(Clone)]
pub struct InvitationService {
    clubs: ClubsRepo,
    memberships: MembershipsRepo,
    invitations: InvitationsRepo,
    config: InvitationConfig,
    pagination: PaginationConfig,
}

impl InvitationService {
    pub fn new(
        clubs: ClubsRepo,
        memberships: MembershipsRepo,
        invitations: InvitationsRepo,
        config: InvitationConfig,
        pagination: PaginationConfig,
    ) -> Self {
        Self {
            clubs,
            memberships,
            invitations,
            config,
            pagination,
        }
    }

    /// Issue an invitation. At most one pending invitation may exist per
    /// (club, invitee email); the guard row enforces this against concurrent
    /// issuers after the courtesy precheck.
    pub async fn create(
        &self,
        auth: &AuthContext,
        club_id: Uuid,
        mut request: CreateInvitationRequest,
    ) -> Result<Invitation, AppError> {
        // Normalize before validating, so a padded address reaches the
        // duplicate guard instead of bouncing off the email format check.
        request.email = request.email.trim().to_string();
        request.validate()?;

        let (club, caller) =
            require_club_view(&self.clubs, &self.memberships, auth, club_id).await?;
        if !auth.is_site_admin() {
            require_club_capability(caller.as_ref(), ClubCapability::InviteMembers)?;
        }
        if club.status != ClubStatus::Active {
            return Err(ClubError::NotActive {
                status: club.status,
            }
            .into());
        }

        if let Some(invited_user_id) = request.invited_user_id {
            if let Some(existing) = self.memberships.get(club_id, invited_user_id).await? {
                if existing.is_active() {
                    return Err(InvitationError::AlreadyMember {
                        email: request.email,
                    }
                    .into());
                }
            }
        }
        if self.invitations.pending_exists(club_id, &request.email).await? {
            return Err(InvitationError::AlreadyInvited {
                email: request.email,
            }
            .into());
        }

        let created_by = require_user(auth)?;
        let invitation = Invitation::new(
            club_id,
            request.email.trim().to_string(),
            request.invited_user_id,
            created_by,
            request
                .expires_in_hours
                .unwrap_or(self.config.default_expiry_hours),
        );

        self.invitations
            .create(&invitation)
            .await
            .map_err(|err| match err {
                StoreError::TransactionCancelled { .. } => InvitationError::AlreadyInvited {
                    email: invitation.invited_email.clone(),
                }
                .into(),
                other => AppError::from(other),
            })?;

        tracing::info!(
            club_id = %club_id,
            invitation_id = %invitation.invitation_id,
            invited_by = %created_by,
            "invitation created"
        );
        Ok(invitation)
    }

    /// Accept an invitation by token, joining the club as an active member.
    /// The status flip, guard and token deletes, and the membership rows
    /// commit in one transaction, so the token is never burned without the
    /// membership existing afterwards.
    pub async fn accept(
        &self,
        auth: &AuthContext,
        token: &str,
    ) -> Result<Membership, AppError> {
        let user_id = require_user(auth)?;
        let invitation = self.resolve_for_response(auth, token).await?;

        // If the invitee joined through another path since the invite was
        // issued, report that without consuming the token.
        if self.memberships.get(invitation.club_id, user_id).await?.is_some() {
            return Err(MembershipError::AlreadyMember {
                club_id: invitation.club_id,
                user_id,
            }
            .into());
        }

        let mut accepted = invitation;
        accepted.status = InvitationStatus::Accepted;
        accepted.invited_user_id = Some(user_id);
        accepted.responded_at = Some(Utc::now());

        let membership = Membership::active(accepted.club_id, user_id, ClubRole::Member);
        self.invitations
            .accept(&accepted, self.memberships.create_ops(&membership)?)
            .await
            .map_err(|err| match err {
                StoreError::TransactionCancelled { .. } => MembershipError::AlreadyMember {
                    club_id: accepted.club_id,
                    user_id,
                }
                .into(),
                other => AppError::from(other),
            })?;

        tracing::info!(
            club_id = %accepted.club_id,
            invitation_id = %accepted.invitation_id,
            user = %user_id,
            "invitation accepted"
        );
        Ok(membership)
    }

    /// Decline an invitation by token.
    pub async fn decline(&self, auth: &AuthContext, token: &str) -> Result<(), AppError> {
        let invitation = self.resolve_for_response(auth, token).await?;

        let mut declined = invitation;
        declined.status = InvitationStatus::Declined;
        declined.responded_at = Some(Utc::now());
        self.invitations.finalize(&declined).await?;

        tracing::info!(
            club_id = %declined.club_id,
            invitation_id = %declined.invitation_id,
            "invitation declined"
        );
        Ok(())
    }

    /// Revoke a pending invitation, invalidating its token.
    pub async fn revoke(
        &self,
        auth: &AuthContext,
        club_id: Uuid,
        invitation_id: Uuid,
    ) -> Result<Invitation, AppError> {
        let (_, caller) =
            require_club_view(&self.clubs, &self.memberships, auth, club_id).await?;
        if !auth.is_site_admin() {
            require_club_capability(caller.as_ref(), ClubCapability::RevokeInvitations)?;
        }

        let invitation = self
            .invitations
            .get(club_id, invitation_id)
            .await?
            .ok_or(InvitationError::NotFound)?;
        if invitation.status != InvitationStatus::Pending {
            return Err(InvitationError::NotPending {
                status: invitation.status,
            }
            .into());
        }
        if invitation.is_expired(Utc::now()) {
            return Err(self.expire(invitation).await);
        }

        let mut revoked = invitation;
        revoked.status = InvitationStatus::Revoked;
        revoked.responded_at = Some(Utc::now());
        self.invitations.finalize(&revoked).await?;

        tracing::info!(
            club_id = %club_id,
            invitation_id = %revoked.invitation_id,
            "invitation revoked"
        );
        Ok(revoked)
    }

    /// Invitations of a club, visible to holders of the invite capability.
    pub async fn list(
        &self,
        auth: &AuthContext,
        club_id: Uuid,
        limit: Option<usize>,
        cursor: Option<&str>,
    ) -> Result<PagedResult<Invitation>, AppError> {
        let (_, caller) =
            require_club_view(&self.clubs, &self.memberships, auth, club_id).await?;
        if !auth.is_site_admin() {
            require_club_capability(caller.as_ref(), ClubCapability::InviteMembers)?;
        }
        let limit = clamp_limit(limit, &self.pagination);
        let page = page_from(limit, cursor, &crate::repos::club_pk(club_id))?;
        Ok(self.invitations.list(club_id, &page).await?)
    }

    /// Common resolution for accept and decline: token lookup, addressee
    /// check, pending check, lazy expiry.
    async fn resolve_for_response(
        &self,
        auth: &AuthContext,
        token: &str,
    ) -> Result<Invitation, AppError> {
        let user_id = require_user(auth)?;
        let invitation = self
            .invitations
            .get_by_token(token)
            .await?
            .ok_or(InvitationError::NotFound)?;

        // An invitation is only actionable by its addressee. A mismatch is
        // reported as not-found so tokens cannot be probed.
        let addressed_to_caller = match invitation.invited_user_id {
            Some(invited) => invited == user_id,
            None => match &auth.email {
                Some(email) => {
                    Invitation::email_key(email) == Invitation::email_key(&invitation.invited_email)
                }
                None => false,
            },
        };
        if !addressed_to_caller {
            return Err(InvitationError::NotFound.into());
        }

        if invitation.status != InvitationStatus::Pending {
            return Err(InvitationError::NotPending {
                status: invitation.status,
            }
            .into());
        }
        if invitation.is_expired(Utc::now()) {
            return Err(self.expire(invitation).await);
        }
        Ok(invitation)
    }

    /// Persist the expired status and report the expiry. Losing the write to
    /// a concurrent responder changes nothing for this caller: the token is
    /// dead either way.
    async fn expire(&self, invitation: Invitation) -> AppError {
        let expired_at = invitation.expires_at;
        let mut expired = invitation;
        expired.status = InvitationStatus::Expired;
        if let Err(err) = self.invitations.finalize(&expired).await {
            tracing::debug!(
                invitation_id = %expired.invitation_id,
                error = %err,
                "lazy expiry write lost, continuing"
            );
        }
        InvitationError::Expired { expired_at }.into()
    }
}
