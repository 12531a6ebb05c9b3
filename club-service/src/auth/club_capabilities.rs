//! Club-scoped role -> capability matrix.
//!
//! Each role's list is complete and explicit rather than computed from the
//! role below it, so a capability added to `member` but forgotten on `admin`
//! shows up as a test failure instead of silent drift. The structural
//! superset property (owner ⊇ admin ⊇ member) is asserted in tests.
//!
//! Club capabilities only apply to callers holding an *active* membership in
//! the club; pending, suspended, and removed memberships grant nothing.

use serde::{Deserialize, Serialize};

/// Per-club role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClubRole {
    Member,
    Admin,
    Owner,
}

impl ClubRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClubRole::Member => "member",
            ClubRole::Admin => "admin",
            ClubRole::Owner => "owner",
        }
    }

    /// Roles that may create and manage rides without holding
    /// `PUBLISH_OFFICIAL_RIDES` explicitly.
    pub fn is_leadership(&self) -> bool {
        matches!(self, ClubRole::Admin | ClubRole::Owner)
    }

    /// Direct role changes permitted by the role-transition table.
    ///
    /// `owner` is reachable only through the explicit ownership-transfer
    /// operation, never through a plain role change.
    pub fn can_transition_to(&self, target: ClubRole) -> bool {
        matches!(
            (self, target),
            (ClubRole::Member, ClubRole::Admin) | (ClubRole::Admin, ClubRole::Member)
        )
    }
}

impl std::fmt::Display for ClubRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capability scoped to a single club.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClubCapability {
    ViewClubDetails,
    ViewMembers,
    ViewRides,
    JoinRides,
    LeaveRides,
    CreateRides,
    PublishOfficialRides,
    CancelRides,
    ManageMembers,
    ApproveJoinRequests,
    InviteMembers,
    RevokeInvitations,
    EditClubProfile,
    ManageClubSettings,
    TransferOwnership,
    ArchiveClub,
}

impl ClubCapability {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClubCapability::ViewClubDetails => "VIEW_CLUB_DETAILS",
            ClubCapability::ViewMembers => "VIEW_MEMBERS",
            ClubCapability::ViewRides => "VIEW_RIDES",
            ClubCapability::JoinRides => "JOIN_RIDES",
            ClubCapability::LeaveRides => "LEAVE_RIDES",
            ClubCapability::CreateRides => "CREATE_RIDES",
            ClubCapability::PublishOfficialRides => "PUBLISH_OFFICIAL_RIDES",
            ClubCapability::CancelRides => "CANCEL_RIDES",
            ClubCapability::ManageMembers => "MANAGE_MEMBERS",
            ClubCapability::ApproveJoinRequests => "APPROVE_JOIN_REQUESTS",
            ClubCapability::InviteMembers => "INVITE_MEMBERS",
            ClubCapability::RevokeInvitations => "REVOKE_INVITATIONS",
            ClubCapability::EditClubProfile => "EDIT_CLUB_PROFILE",
            ClubCapability::ManageClubSettings => "MANAGE_CLUB_SETTINGS",
            ClubCapability::TransferOwnership => "TRANSFER_OWNERSHIP",
            ClubCapability::ArchiveClub => "ARCHIVE_CLUB",
        }
    }
}

impl std::fmt::Display for ClubCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const MEMBER_CAPABILITIES: &[ClubCapability] = &[
    ClubCapability::ViewClubDetails,
    ClubCapability::ViewMembers,
    ClubCapability::ViewRides,
    ClubCapability::JoinRides,
    ClubCapability::LeaveRides,
];

pub const ADMIN_CAPABILITIES: &[ClubCapability] = &[
    ClubCapability::ViewClubDetails,
    ClubCapability::ViewMembers,
    ClubCapability::ViewRides,
    ClubCapability::JoinRides,
    ClubCapability::LeaveRides,
    ClubCapability::CreateRides,
    ClubCapability::PublishOfficialRides,
    ClubCapability::CancelRides,
    ClubCapability::ManageMembers,
    ClubCapability::ApproveJoinRequests,
    ClubCapability::InviteMembers,
    ClubCapability::RevokeInvitations,
    ClubCapability::EditClubProfile,
];

pub const OWNER_CAPABILITIES: &[ClubCapability] = &[
    ClubCapability::ViewClubDetails,
    ClubCapability::ViewMembers,
    ClubCapability::ViewRides,
    ClubCapability::JoinRides,
    ClubCapability::LeaveRides,
    ClubCapability::CreateRides,
    ClubCapability::PublishOfficialRides,
    ClubCapability::CancelRides,
    ClubCapability::ManageMembers,
    ClubCapability::ApproveJoinRequests,
    ClubCapability::InviteMembers,
    ClubCapability::RevokeInvitations,
    ClubCapability::EditClubProfile,
    ClubCapability::ManageClubSettings,
    ClubCapability::TransferOwnership,
    ClubCapability::ArchiveClub,
];

/// Total club-role -> capability mapping.
pub fn club_capabilities(role: ClubRole) -> &'static [ClubCapability] {
    match role {
        ClubRole::Member => MEMBER_CAPABILITIES,
        ClubRole::Admin => ADMIN_CAPABILITIES,
        ClubRole::Owner => OWNER_CAPABILITIES,
    }
}

/// True when `role` grants `capability` in the club. The caller is
/// responsible for having checked that the membership is active.
pub fn role_has_capability(role: ClubRole, capability: ClubCapability) -> bool {
    club_capabilities(role).contains(&capability)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn as_set(caps: &'static [ClubCapability]) -> HashSet<ClubCapability> {
        caps.iter().copied().collect()
    }

    #[test]
    fn owner_is_strict_superset_of_admin() {
        let owner = as_set(OWNER_CAPABILITIES);
        let admin = as_set(ADMIN_CAPABILITIES);
        assert!(admin.is_subset(&owner));
        assert!(
            !owner.difference(&admin).collect::<Vec<_>>().is_empty(),
            "owner must hold capabilities admin does not"
        );
    }

    #[test]
    fn admin_is_strict_superset_of_member() {
        let admin = as_set(ADMIN_CAPABILITIES);
        let member = as_set(MEMBER_CAPABILITIES);
        assert!(member.is_subset(&admin));
        assert!(!admin.difference(&member).collect::<Vec<_>>().is_empty());
    }

    #[test]
    fn matrices_contain_no_duplicates() {
        for caps in [MEMBER_CAPABILITIES, ADMIN_CAPABILITIES, OWNER_CAPABILITIES] {
            assert_eq!(caps.len(), as_set(caps).len());
        }
    }

    #[test]
    fn role_transition_table() {
        assert!(ClubRole::Member.can_transition_to(ClubRole::Admin));
        assert!(ClubRole::Admin.can_transition_to(ClubRole::Member));
        // Owner is only reachable via ownership transfer.
        assert!(!ClubRole::Member.can_transition_to(ClubRole::Owner));
        assert!(!ClubRole::Admin.can_transition_to(ClubRole::Owner));
        assert!(!ClubRole::Owner.can_transition_to(ClubRole::Admin));
        assert!(!ClubRole::Owner.can_transition_to(ClubRole::Member));
        assert!(!ClubRole::Member.can_transition_to(ClubRole::Member));
    }

    #[test]
    fn leadership_roles() {
        assert!(!ClubRole::Member.is_leadership());
        assert!(ClubRole::Admin.is_leadership());
        assert!(ClubRole::Owner.is_leadership());
    }

    #[test]
    fn publish_official_rides_requires_leadership() {
        assert!(!role_has_capability(
            ClubRole::Member,
            ClubCapability::PublishOfficialRides
        ));
        assert!(role_has_capability(
            ClubRole::Admin,
            ClubCapability::PublishOfficialRides
        ));
        assert!(role_has_capability(
            ClubRole::Owner,
            ClubCapability::PublishOfficialRides
        ));
    }
}
