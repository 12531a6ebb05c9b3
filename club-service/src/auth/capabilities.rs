//! System-wide role -> capability matrix.
//!
//! The matrix is a total function over [`SystemRole`]: every role maps to a
//! fixed, explicitly listed capability set. Regular users hold no system
//! capabilities; club-scoped permissions live in
//! [`super::club_capabilities`].

use serde::{Deserialize, Serialize};

/// Platform-wide role, independent of any club.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemRole {
    User,
    SiteAdmin,
}

impl SystemRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            SystemRole::User => "user",
            SystemRole::SiteAdmin => "site_admin",
        }
    }

    /// Map a raw role claim to a role. Unrecognized values fall back to
    /// `User`, whose system capability set is empty (fail closed).
    pub fn from_claim(raw: &str) -> Self {
        match raw {
            "site_admin" => SystemRole::SiteAdmin,
            _ => SystemRole::User,
        }
    }
}

impl std::fmt::Display for SystemRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Platform-wide capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SystemCapability {
    ManageClubs,
    SuspendClubs,
    ArchiveClubs,
    ViewAllClubs,
    ManageUsers,
    ViewAuditLogs,
}

impl SystemCapability {
    pub fn as_str(&self) -> &'static str {
        match self {
            SystemCapability::ManageClubs => "MANAGE_CLUBS",
            SystemCapability::SuspendClubs => "SUSPEND_CLUBS",
            SystemCapability::ArchiveClubs => "ARCHIVE_CLUBS",
            SystemCapability::ViewAllClubs => "VIEW_ALL_CLUBS",
            SystemCapability::ManageUsers => "MANAGE_USERS",
            SystemCapability::ViewAuditLogs => "VIEW_AUDIT_LOGS",
        }
    }
}

impl std::fmt::Display for SystemCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Regular users hold no system-wide capabilities.
pub const USER_CAPABILITIES: &[SystemCapability] = &[];

pub const SITE_ADMIN_CAPABILITIES: &[SystemCapability] = &[
    SystemCapability::ManageClubs,
    SystemCapability::SuspendClubs,
    SystemCapability::ArchiveClubs,
    SystemCapability::ViewAllClubs,
    SystemCapability::ManageUsers,
    SystemCapability::ViewAuditLogs,
];

/// Total role -> capability mapping. Never fails; never allocates.
pub fn system_capabilities(role: SystemRole) -> &'static [SystemCapability] {
    match role {
        SystemRole::User => USER_CAPABILITIES,
        SystemRole::SiteAdmin => SITE_ADMIN_CAPABILITIES,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn matrix_is_deterministic_and_total() {
        for role in [SystemRole::User, SystemRole::SiteAdmin] {
            assert_eq!(system_capabilities(role), system_capabilities(role));
        }
    }

    #[test]
    fn user_capability_set_is_empty() {
        assert!(system_capabilities(SystemRole::User).is_empty());
    }

    #[test]
    fn site_admin_is_superset_of_user() {
        let user: HashSet<_> = system_capabilities(SystemRole::User).iter().collect();
        let admin: HashSet<_> = system_capabilities(SystemRole::SiteAdmin).iter().collect();
        assert!(user.is_subset(&admin));
        assert!(admin.len() > user.len());
    }

    #[test]
    fn unknown_claim_maps_to_user() {
        assert_eq!(SystemRole::from_claim("superuser"), SystemRole::User);
        assert_eq!(SystemRole::from_claim(""), SystemRole::User);
        assert_eq!(SystemRole::from_claim("site_admin"), SystemRole::SiteAdmin);
    }
}
