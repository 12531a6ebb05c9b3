//! Club entity and status state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Club lifecycle status. `archived` is terminal and doubles as logical
/// deletion; clubs are never hard-deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClubStatus {
    Active,
    Suspended,
    Archived,
}

impl ClubStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClubStatus::Active => "active",
            ClubStatus::Suspended => "suspended",
            ClubStatus::Archived => "archived",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ClubStatus::Archived)
    }

    /// Transition table: active <-> suspended, either -> archived, archived
    /// transitions to nothing.
    pub fn can_transition_to(&self, target: ClubStatus) -> bool {
        matches!(
            (self, target),
            (ClubStatus::Active, ClubStatus::Suspended)
                | (ClubStatus::Active, ClubStatus::Archived)
                | (ClubStatus::Suspended, ClubStatus::Active)
                | (ClubStatus::Suspended, ClubStatus::Archived)
        )
    }
}

impl std::fmt::Display for ClubStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Club entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Club {
    pub club_id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    pub status: ClubStatus,
    /// Anchor for the single-owner invariant; kept in lockstep with the
    /// owner membership record by the ownership-transfer transaction.
    pub owner_user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Club {
    pub fn new(
        name: String,
        description: Option<String>,
        city: Option<String>,
        logo_url: Option<String>,
        owner_user_id: Uuid,
    ) -> Self {
        let now = Utc::now();
        Self {
            club_id: Uuid::new_v4(),
            name,
            description,
            city,
            logo_url,
            status: ClubStatus::Active,
            owner_user_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Canonical key for case-insensitive global name uniqueness.
    pub fn name_key(name: &str) -> String {
        name.trim().to_lowercase()
    }
}

/// Request to create a club.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateClubRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(url)]
    pub logo_url: Option<String>,
}

/// Request to update club profile fields. Absent fields are left unchanged.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateClubRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(url)]
    pub logo_url: Option<String>,
}

impl UpdateClubRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.city.is_none()
            && self.logo_url.is_none()
    }
}

/// Request to move a club to a new lifecycle status.
#[derive(Debug, Deserialize)]
pub struct ChangeClubStatusRequest {
    pub status: ClubStatus,
}

/// Club response for API.
#[derive(Debug, Serialize)]
pub struct ClubResponse {
    pub club_id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    pub status: ClubStatus,
    pub owner_user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Club> for ClubResponse {
    fn from(c: Club) -> Self {
        Self {
            club_id: c.club_id,
            name: c.name,
            description: c.description,
            city: c.city,
            logo_url: c.logo_url,
            status: c.status,
            owner_user_id: c.owner_user_id,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}
