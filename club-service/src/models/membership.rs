//! Membership entity: per-club role and status state machines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::ClubRole;

/// Membership lifecycle status. `removed` is terminal for the record; a user
/// who rejoins gets a fresh membership record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    Pending,
    Active,
    Suspended,
    Removed,
}

impl MembershipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipStatus::Pending => "pending",
            MembershipStatus::Active => "active",
            MembershipStatus::Suspended => "suspended",
            MembershipStatus::Removed => "removed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, MembershipStatus::Removed)
    }

    /// Transition table: pending -> active | removed; active -> suspended |
    /// removed; suspended -> active | removed.
    pub fn can_transition_to(&self, target: MembershipStatus) -> bool {
        matches!(
            (self, target),
            (MembershipStatus::Pending, MembershipStatus::Active)
                | (MembershipStatus::Pending, MembershipStatus::Removed)
                | (MembershipStatus::Active, MembershipStatus::Suspended)
                | (MembershipStatus::Active, MembershipStatus::Removed)
                | (MembershipStatus::Suspended, MembershipStatus::Active)
                | (MembershipStatus::Suspended, MembershipStatus::Removed)
        )
    }
}

impl std::fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Membership entity. At most one non-removed membership exists per
/// (club, user); the repository enforces this with the current-membership
/// key, archiving removed records under a history key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    pub membership_id: Uuid,
    pub club_id: Uuid,
    pub user_id: Uuid,
    pub role: ClubRole,
    pub status: MembershipStatus,
    pub joined_at: DateTime<Utc>,
}

impl Membership {
    /// Membership created by a join request, awaiting approval.
    pub fn pending(club_id: Uuid, user_id: Uuid) -> Self {
        Self {
            membership_id: Uuid::new_v4(),
            club_id,
            user_id,
            role: ClubRole::Member,
            status: MembershipStatus::Pending,
            joined_at: Utc::now(),
        }
    }

    /// Active membership with a given role, used for the founding owner and
    /// for accepted invitations.
    pub fn active(club_id: Uuid, user_id: Uuid, role: ClubRole) -> Self {
        Self {
            membership_id: Uuid::new_v4(),
            club_id,
            user_id,
            role,
            status: MembershipStatus::Active,
            joined_at: Utc::now(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == MembershipStatus::Active
    }
}

/// Request to change a member's status (approve, suspend, reinstate).
#[derive(Debug, Deserialize)]
pub struct ChangeMembershipStatusRequest {
    pub status: MembershipStatus,
}

/// Request to change a member's role. Ownership is excluded: it moves only
/// through the transfer operation.
#[derive(Debug, Deserialize)]
pub struct ChangeMembershipRoleRequest {
    pub role: ClubRole,
}

/// Request to transfer club ownership to another active member.
#[derive(Debug, Deserialize)]
pub struct TransferOwnershipRequest {
    pub new_owner_user_id: Uuid,
}

/// Membership response for API.
#[derive(Debug, Serialize)]
pub struct MembershipResponse {
    pub membership_id: Uuid,
    pub club_id: Uuid,
    pub user_id: Uuid,
    pub role: ClubRole,
    pub status: MembershipStatus,
    pub joined_at: DateTime<Utc>,
}

impl From<Membership> for MembershipResponse {
    fn from(m: Membership) -> Self {
        Self {
            membership_id: m.membership_id,
            club_id: m.club_id,
            user_id: m.user_id,
            role: m.role,
            status: m.status,
            joined_at: m.joined_at,
        }
    }
}
