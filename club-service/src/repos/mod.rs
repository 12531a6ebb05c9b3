//! Entity repositories over the shared single-table keyspace.
//!
//! Key schema:
//!
//! | Entity / index            | pk                    | sk                          |
//! |---------------------------|-----------------------|-----------------------------|
//! | Club metadata             | `CLUB#{club_id}`      | `META`                      |
//! | Club name guard           | `CLUBNAME#{name_key}` | `GUARD`                     |
//! | Club discovery projection | `CLUBS`               | `CLUB#{club_id}`            |
//! | Membership (current)      | `CLUB#{club_id}`      | `MEMBER#{user_id}`          |
//! | Membership (archived)     | `CLUB#{club_id}`      | `XMEMBER#{user}#{m_id}`     |
//! | User membership projection| `USER#{user_id}`      | `MEMBERSHIP#{club_id}`      |
//! | Invitation                | `CLUB#{club_id}`      | `INVITE#{invitation_id}`    |
//! | Pending-invite guard      | `CLUB#{club_id}`      | `INVITEGUARD#{email_key}`   |
//! | Invitation token lookup   | `INVITETOKEN#{token}` | `META`                      |
//! | Ride                      | `CLUB#{club_id}`      | `RIDE#{ride_id}`            |
//! | Participant               | `RIDE#{ride_id}`      | `PART#{user_id}`            |
//!
//! Guard and projection rows are written in the same transaction as their
//! primary row, so uniqueness invariants hold or the whole write cancels.

pub mod clubs;
pub mod invitations;
pub mod memberships;
pub mod rides;

pub use clubs::ClubsRepo;
pub use invitations::InvitationsRepo;
pub use memberships::MembershipsRepo;
pub use rides::RidesRepo;

use serde::Serialize;
use uuid::Uuid;

use crate::store::Cursor;

pub(crate) fn club_pk(club_id: Uuid) -> String {
    format!("CLUB#{club_id}")
}

pub(crate) fn ride_pk(ride_id: Uuid) -> String {
    format!("RIDE#{ride_id}")
}

pub(crate) fn user_pk(user_id: Uuid) -> String {
    format!("USER#{user_id}")
}

/// One page of decoded entities.
#[derive(Debug, Serialize)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub has_more: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl<T> PagedResult<T> {
    pub(crate) fn new(items: Vec<T>, has_more: bool, cursor: Option<Cursor>) -> Self {
        Self {
            items,
            has_more,
            next_cursor: cursor.map(|c| c.encode()),
        }
    }
}
