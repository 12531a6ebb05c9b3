//! Per-domain error variants and their mapping onto the HTTP-facing
//! taxonomy. Every variant carries the identifying context (ids, statuses)
//! a client or auditor needs to act without re-querying.

use serde_json::json;
use service_core::error::{AppError, ErrorDetail};
use thiserror::Error;
use uuid::Uuid;

use crate::auth::{ClubCapability, ClubRole};
use crate::models::{ClubStatus, InvitationStatus, MembershipStatus, RideStatus};
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ClubError {
    #[error("club {0} not found")]
    NotFound(Uuid),

    #[error("club name '{name}' is already taken")]
    NameConflict { name: String },

    #[error("invalid club status transition: {from} -> {to}")]
    InvalidStatusTransition { from: ClubStatus, to: ClubStatus },

    #[error("club is {status}; this operation requires an active club")]
    NotActive { status: ClubStatus },
}

impl From<ClubError> for AppError {
    fn from(err: ClubError) -> Self {
        match err {
            ClubError::NotFound(club_id) => AppError::NotFound(
                ErrorDetail::new("CLUB_NOT_FOUND", err.to_string())
                    .with_details(json!({ "club_id": club_id })),
            ),
            ClubError::NameConflict { ref name } => AppError::Conflict(
                ErrorDetail::new("CLUB_NAME_CONFLICT", err.to_string())
                    .with_details(json!({ "name": name })),
            ),
            ClubError::InvalidStatusTransition { from, to } => AppError::OperationNotAllowed(
                ErrorDetail::new("CLUB_STATUS_TRANSITION_INVALID", err.to_string())
                    .with_details(json!({ "from": from, "to": to })),
            ),
            ClubError::NotActive { status } => AppError::OperationNotAllowed(
                ErrorDetail::new("CLUB_NOT_ACTIVE", err.to_string())
                    .with_details(json!({ "status": status })),
            ),
        }
    }
}

#[derive(Debug, Error)]
pub enum MembershipError {
    #[error("membership of user {user_id} in club {club_id} not found")]
    NotFound { club_id: Uuid, user_id: Uuid },

    #[error("user {user_id} already has a membership in club {club_id}")]
    AlreadyMember { club_id: Uuid, user_id: Uuid },

    #[error("invalid membership status transition: {from} -> {to}")]
    InvalidStatusTransition {
        from: MembershipStatus,
        to: MembershipStatus,
    },

    #[error("invalid role transition: {from} -> {to}")]
    InvalidRoleTransition { from: ClubRole, to: ClubRole },

    #[error("role changes require an active membership (current status: {status})")]
    NotActive { status: MembershipStatus },

    #[error("the club owner cannot be removed; transfer ownership first")]
    CannotRemoveOwner,

    #[error("ownership transfer target {user_id} is not an active member")]
    TransferTargetNotActive { user_id: Uuid },
}

impl From<MembershipError> for AppError {
    fn from(err: MembershipError) -> Self {
        match err {
            MembershipError::NotFound { club_id, user_id } => AppError::NotFound(
                ErrorDetail::new("MEMBERSHIP_NOT_FOUND", err.to_string())
                    .with_details(json!({ "club_id": club_id, "user_id": user_id })),
            ),
            MembershipError::AlreadyMember { club_id, user_id } => AppError::Conflict(
                ErrorDetail::new("ALREADY_MEMBER", err.to_string())
                    .with_details(json!({ "club_id": club_id, "user_id": user_id })),
            ),
            MembershipError::InvalidStatusTransition { from, to } => {
                AppError::OperationNotAllowed(
                    ErrorDetail::new("MEMBERSHIP_STATUS_TRANSITION_INVALID", err.to_string())
                        .with_details(json!({ "from": from, "to": to })),
                )
            }
            MembershipError::InvalidRoleTransition { from, to } => AppError::OperationNotAllowed(
                ErrorDetail::new("INVALID_ROLE_TRANSITION", err.to_string())
                    .with_details(json!({ "from": from, "to": to })),
            ),
            MembershipError::NotActive { status } => AppError::OperationNotAllowed(
                ErrorDetail::new("MEMBERSHIP_NOT_ACTIVE", err.to_string())
                    .with_details(json!({ "status": status })),
            ),
            MembershipError::CannotRemoveOwner => AppError::OperationNotAllowed(
                ErrorDetail::new("CANNOT_REMOVE_OWNER", err.to_string()),
            ),
            MembershipError::TransferTargetNotActive { user_id } => AppError::OperationNotAllowed(
                ErrorDetail::new("OWNERSHIP_TRANSFER_TARGET_INACTIVE", err.to_string())
                    .with_details(json!({ "user_id": user_id })),
            ),
        }
    }
}

#[derive(Debug, Error)]
pub enum InvitationError {
    #[error("invitation not found")]
    NotFound,

    #[error("a pending invitation for {email} already exists in this club")]
    AlreadyInvited { email: String },

    #[error("{email} already holds an active membership in this club")]
    AlreadyMember { email: String },

    #[error("invitation expired at {expired_at}")]
    Expired { expired_at: chrono::DateTime<chrono::Utc> },

    #[error("invitation is {status}, not pending")]
    NotPending { status: InvitationStatus },
}

impl From<InvitationError> for AppError {
    fn from(err: InvitationError) -> Self {
        match err {
            InvitationError::NotFound => {
                // Also covers token mismatches: an unknown token is
                // indistinguishable from a missing invitation.
                AppError::NotFound(ErrorDetail::new("INVITATION_NOT_FOUND", err.to_string()))
            }
            InvitationError::AlreadyInvited { ref email } => AppError::Conflict(
                ErrorDetail::new("USER_ALREADY_INVITED", err.to_string())
                    .with_details(json!({ "email": email })),
            ),
            InvitationError::AlreadyMember { ref email } => AppError::Conflict(
                ErrorDetail::new("CANNOT_INVITE_EXISTING_MEMBER", err.to_string())
                    .with_details(json!({ "email": email })),
            ),
            InvitationError::Expired { expired_at } => AppError::Gone(
                ErrorDetail::new("INVITATION_EXPIRED", err.to_string())
                    .with_details(json!({ "expired_at": expired_at })),
            ),
            InvitationError::NotPending { status } => AppError::OperationNotAllowed(
                ErrorDetail::new("INVITATION_NOT_PENDING", err.to_string())
                    .with_details(json!({ "status": status })),
            ),
        }
    }
}

#[derive(Debug, Error)]
pub enum RideError {
    #[error("ride {0} not found")]
    NotFound(Uuid),

    #[error("invalid ride status transition: {from} -> {to}")]
    InvalidStatusTransition { from: RideStatus, to: RideStatus },

    #[error("ride is full ({max_participants} participants)")]
    Full { max_participants: u32 },

    #[error("user {user_id} already joined this ride")]
    AlreadyJoined { user_id: Uuid },

    #[error("user {user_id} is not a participant of this ride")]
    NotParticipant { user_id: Uuid },

    #[error("ride is {status}; joins and leaves require a published ride")]
    NotOpenForJoining { status: RideStatus },
}

impl From<RideError> for AppError {
    fn from(err: RideError) -> Self {
        match err {
            RideError::NotFound(ride_id) => AppError::NotFound(
                ErrorDetail::new("RIDE_NOT_FOUND", err.to_string())
                    .with_details(json!({ "ride_id": ride_id })),
            ),
            RideError::InvalidStatusTransition { from, to } => AppError::OperationNotAllowed(
                ErrorDetail::new("RIDE_STATUS_TRANSITION_INVALID", err.to_string())
                    .with_details(json!({ "from": from, "to": to })),
            ),
            RideError::Full { max_participants } => AppError::Conflict(
                ErrorDetail::new("RIDE_FULL", err.to_string())
                    .with_details(json!({ "max_participants": max_participants })),
            ),
            RideError::AlreadyJoined { user_id } => AppError::Conflict(
                ErrorDetail::new("ALREADY_JOINED", err.to_string())
                    .with_details(json!({ "user_id": user_id })),
            ),
            RideError::NotParticipant { user_id } => AppError::NotFound(
                ErrorDetail::new("PARTICIPANT_NOT_FOUND", err.to_string())
                    .with_details(json!({ "user_id": user_id })),
            ),
            RideError::NotOpenForJoining { status } => AppError::OperationNotAllowed(
                ErrorDetail::new("RIDE_NOT_OPEN", err.to_string())
                    .with_details(json!({ "status": status })),
            ),
        }
    }
}

/// Authorization failures raised by the domain services.
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("authentication required")]
    NotAuthenticated,

    #[error("missing capability {capability}")]
    MissingCapability { capability: ClubCapability },
}

impl From<AccessError> for AppError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::NotAuthenticated => AppError::Unauthorized(ErrorDetail::new(
                "NOT_AUTHENTICATED",
                err.to_string(),
            )),
            AccessError::MissingCapability { capability } => AppError::Forbidden(
                ErrorDetail::new("INSUFFICIENT_PRIVILEGES", err.to_string())
                    .with_details(json!({ "capability": capability })),
            ),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            // Conditions are pre-validated by the services; a cancellation
            // here means a concurrent writer won the race.
            StoreError::TransactionCancelled { reason } => AppError::Conflict(
                ErrorDetail::new("CONFLICT", "Concurrent modification, please retry")
                    .with_details(json!({ "reason": reason })),
            ),
            StoreError::InvalidCursor => AppError::BadRequest(ErrorDetail::new(
                "INVALID_CURSOR",
                "Pagination cursor is invalid",
            )),
            other => AppError::Internal(anyhow::Error::new(other)),
        }
    }
}
