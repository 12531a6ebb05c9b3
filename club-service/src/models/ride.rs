//! Ride entity, participant sub-entity, and the ride state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Ride lifecycle status. Transitions are monotonic forward except
/// cancellation, which is reachable from draft or published only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RideStatus {
    Draft,
    Published,
    Active,
    Completed,
    Cancelled,
}

impl RideStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RideStatus::Draft => "draft",
            RideStatus::Published => "published",
            RideStatus::Active => "active",
            RideStatus::Completed => "completed",
            RideStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RideStatus::Completed | RideStatus::Cancelled)
    }

    pub fn can_transition_to(&self, target: RideStatus) -> bool {
        matches!(
            (self, target),
            (RideStatus::Draft, RideStatus::Published)
                | (RideStatus::Draft, RideStatus::Cancelled)
                | (RideStatus::Published, RideStatus::Active)
                | (RideStatus::Published, RideStatus::Cancelled)
                | (RideStatus::Active, RideStatus::Completed)
        )
    }
}

impl std::fmt::Display for RideStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who may see and join the ride.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RideAudience {
    MembersOnly,
    Open,
}

/// Role a participant holds on a ride.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantRole {
    Rider,
    Leader,
}

/// Ride entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ride {
    pub ride_id: Uuid,
    pub club_id: Uuid,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub audience: RideAudience,
    pub status: RideStatus,
    pub created_by: Uuid,
    pub start_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_participants: Option<u32>,
    pub participant_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_by: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ride {
    pub fn new(
        club_id: Uuid,
        title: String,
        description: Option<String>,
        audience: RideAudience,
        created_by: Uuid,
        start_at: DateTime<Utc>,
        max_participants: Option<u32>,
    ) -> Self {
        let now = Utc::now();
        Self {
            ride_id: Uuid::new_v4(),
            club_id,
            title,
            description,
            audience,
            status: RideStatus::Draft,
            created_by,
            start_at,
            max_participants,
            participant_count: 0,
            cancelled_by: None,
            cancelled_at: None,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// True when another participant fits under the cap (or no cap is set).
    pub fn has_capacity(&self) -> bool {
        match self.max_participants {
            Some(max) => self.participant_count < max,
            None => true,
        }
    }

    pub fn accepts_joins(&self) -> bool {
        self.status == RideStatus::Published
    }
}

/// Ride participant sub-entity, unique per (ride, user).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub user_id: Uuid,
    pub role: ParticipantRole,
    pub joined_at: DateTime<Utc>,
}

impl Participant {
    pub fn rider(user_id: Uuid) -> Self {
        Self {
            user_id,
            role: ParticipantRole::Rider,
            joined_at: Utc::now(),
        }
    }
}

/// Request to create a ride (always created as draft).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRideRequest {
    #[validate(length(min = 1, max = 150))]
    pub title: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub audience: RideAudience,
    pub start_at: DateTime<Utc>,
    #[validate(range(min = 1))]
    pub max_participants: Option<u32>,
}

/// Request to cancel a ride.
#[derive(Debug, Deserialize, Validate)]
pub struct CancelRideRequest {
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

/// Ride response for API.
#[derive(Debug, Serialize)]
pub struct RideResponse {
    pub ride_id: Uuid,
    pub club_id: Uuid,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub audience: RideAudience,
    pub status: RideStatus,
    pub created_by: Uuid,
    pub start_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_participants: Option<u32>,
    pub participant_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_by: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Ride> for RideResponse {
    fn from(r: Ride) -> Self {
        Self {
            ride_id: r.ride_id,
            club_id: r.club_id,
            title: r.title,
            description: r.description,
            audience: r.audience,
            status: r.status,
            created_by: r.created_by,
            start_at: r.start_at,
            max_participants: r.max_participants,
            participant_count: r.participant_count,
            cancelled_by: r.cancelled_by,
            cancelled_at: r.cancelled_at,
            cancellation_reason: r.cancellation_reason,
            created_at: r.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ride(max: Option<u32>) -> Ride {
        Ride::new(
            Uuid::new_v4(),
            "Saturday hills loop".to_string(),
            None,
            RideAudience::MembersOnly,
            Uuid::new_v4(),
            Utc::now() + chrono::Duration::days(2),
            max,
        )
    }

    #[test]
    fn forward_transitions() {
        assert!(RideStatus::Draft.can_transition_to(RideStatus::Published));
        assert!(RideStatus::Published.can_transition_to(RideStatus::Active));
        assert!(RideStatus::Active.can_transition_to(RideStatus::Completed));
    }

    #[test]
    fn cancellation_only_from_draft_or_published() {
        assert!(RideStatus::Draft.can_transition_to(RideStatus::Cancelled));
        assert!(RideStatus::Published.can_transition_to(RideStatus::Cancelled));
        assert!(!RideStatus::Active.can_transition_to(RideStatus::Cancelled));
        assert!(!RideStatus::Completed.can_transition_to(RideStatus::Cancelled));
        assert!(!RideStatus::Cancelled.can_transition_to(RideStatus::Cancelled));
    }

    #[test]
    fn no_backward_transitions() {
        assert!(!RideStatus::Published.can_transition_to(RideStatus::Draft));
        assert!(!RideStatus::Active.can_transition_to(RideStatus::Published));
        assert!(!RideStatus::Completed.can_transition_to(RideStatus::Active));
    }

    #[test]
    fn terminal_states() {
        assert!(RideStatus::Completed.is_terminal());
        assert!(RideStatus::Cancelled.is_terminal());
        assert!(!RideStatus::Published.is_terminal());
    }

    #[test]
    fn capacity_with_and_without_cap() {
        let mut capped = ride(Some(2));
        assert!(capped.has_capacity());
        capped.participant_count = 2;
        assert!(!capped.has_capacity());

        let mut uncapped = ride(None);
        uncapped.participant_count = 10_000;
        assert!(uncapped.has_capacity());
    }

    #[test]
    fn new_rides_start_as_draft_and_reject_joins() {
        let r = ride(None);
        assert_eq!(r.status, RideStatus::Draft);
        assert!(!r.accepts_joins());
    }
}
