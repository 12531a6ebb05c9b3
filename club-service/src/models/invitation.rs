//! Invitation entity and lifecycle.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Invitation lifecycle status. Everything except `pending` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Declined,
    Expired,
    Revoked,
}

impl InvitationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationStatus::Pending => "pending",
            InvitationStatus::Accepted => "accepted",
            InvitationStatus::Declined => "declined",
            InvitationStatus::Expired => "expired",
            InvitationStatus::Revoked => "revoked",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, InvitationStatus::Pending)
    }

    pub fn can_transition_to(&self, target: InvitationStatus) -> bool {
        *self == InvitationStatus::Pending && target != InvitationStatus::Pending
    }
}

impl std::fmt::Display for InvitationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Invitation entity. The token is single-use and only valid while the
/// invitation is pending and unexpired.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invitation {
    pub invitation_id: Uuid,
    pub club_id: Uuid,
    pub invited_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invited_user_id: Option<Uuid>,
    pub status: InvitationStatus,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responded_at: Option<DateTime<Utc>>,
}

impl Invitation {
    pub fn new(
        club_id: Uuid,
        invited_email: String,
        invited_user_id: Option<Uuid>,
        created_by: Uuid,
        expiry_hours: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            invitation_id: Uuid::new_v4(),
            club_id,
            invited_email,
            invited_user_id,
            status: InvitationStatus::Pending,
            token: Uuid::new_v4().simple().to_string(),
            expires_at: now + Duration::hours(expiry_hours),
            created_by,
            created_at: now,
            responded_at: None,
        }
    }

    /// Expiry is time-driven and checked lazily at read time; the stored
    /// status may still read `pending` after the deadline has passed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn is_acceptable(&self, now: DateTime<Utc>) -> bool {
        self.status == InvitationStatus::Pending && !self.is_expired(now)
    }

    /// Canonical key for the one-pending-invitation-per-invitee guard.
    pub fn email_key(email: &str) -> String {
        email.trim().to_lowercase()
    }
}

/// Request to invite a user to a club.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvitationRequest {
    #[validate(email)]
    pub email: String,
    pub invited_user_id: Option<Uuid>,
    #[validate(range(min = 1))]
    pub expires_in_hours: Option<i64>,
}

/// Request to accept an invitation by token.
#[derive(Debug, Deserialize)]
pub struct AcceptInvitationRequest {
    pub token: String,
}

/// Invitation response for API. The token is only disclosed at creation.
#[derive(Debug, Serialize)]
pub struct InvitationResponse {
    pub invitation_id: Uuid,
    pub club_id: Uuid,
    pub invited_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invited_user_id: Option<Uuid>,
    pub status: InvitationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl InvitationResponse {
    pub fn with_token(invitation: Invitation) -> Self {
        let token = invitation.token.clone();
        let mut response = Self::from(invitation);
        response.token = Some(token);
        response
    }
}

impl From<Invitation> for InvitationResponse {
    fn from(i: Invitation) -> Self {
        Self {
            invitation_id: i.invitation_id,
            club_id: i.club_id,
            invited_email: i.invited_email,
            invited_user_id: i.invited_user_id,
            status: i.status,
            token: None,
            expires_at: i.expires_at,
            created_at: i.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invitation() -> Invitation {
        Invitation::new(
            Uuid::new_v4(),
            "rider@example.com".to_string(),
            None,
            Uuid::new_v4(),
            168,
        )
    }

    #[test]
    fn pending_can_reach_every_terminal_state() {
        for target in [
            InvitationStatus::Accepted,
            InvitationStatus::Declined,
            InvitationStatus::Expired,
            InvitationStatus::Revoked,
        ] {
            assert!(InvitationStatus::Pending.can_transition_to(target));
        }
    }

    #[test]
    fn terminal_states_transition_to_nothing() {
        for from in [
            InvitationStatus::Accepted,
            InvitationStatus::Declined,
            InvitationStatus::Expired,
            InvitationStatus::Revoked,
        ] {
            for to in [
                InvitationStatus::Pending,
                InvitationStatus::Accepted,
                InvitationStatus::Revoked,
            ] {
                assert!(!from.can_transition_to(to));
            }
        }
    }

    #[test]
    fn expiry_is_lazy_and_time_driven() {
        let inv = invitation();
        assert!(!inv.is_expired(Utc::now()));
        assert!(inv.is_acceptable(Utc::now()));

        let after_deadline = inv.expires_at + Duration::seconds(1);
        assert!(inv.is_expired(after_deadline));
        // Status is still nominally pending; acceptability must still fail.
        assert_eq!(inv.status, InvitationStatus::Pending);
        assert!(!inv.is_acceptable(after_deadline));
    }

    #[test]
    fn email_key_normalizes_case_and_whitespace() {
        assert_eq!(
            Invitation::email_key(" Rider@Example.COM "),
            "rider@example.com"
        );
    }

    #[test]
    fn response_hides_token_unless_requested() {
        let inv = invitation();
        let token = inv.token.clone();
        assert!(InvitationResponse::from(inv.clone()).token.is_none());
        assert_eq!(InvitationResponse::with_token(inv).token, Some(token));
    }
}
