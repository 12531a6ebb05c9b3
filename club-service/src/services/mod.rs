//! Domain services: authorization checks, state-machine validation, then
//! transactional persistence, in that order. Validation failures are raised
//! before any write; storage-level condition failures surface as conflicts.

pub mod club;
pub mod error;
pub mod invitation;
pub mod membership;
pub mod ride;

pub use club::ClubService;
pub use error::{AccessError, ClubError, InvitationError, MembershipError, RideError};
pub use invitation::InvitationService;
pub use membership::MembershipService;
pub use ride::RideService;

use service_core::error::AppError;
use uuid::Uuid;

use crate::auth::club_capabilities::role_has_capability;
use crate::auth::{AuthContext, ClubCapability};
use crate::models::{Club, Membership};
use crate::repos::{ClubsRepo, MembershipsRepo};
use crate::store::{Cursor, Page};

/// Identity of the caller, or 401 for anonymous requests.
pub(crate) fn require_user(auth: &AuthContext) -> Result<Uuid, AppError> {
    match (auth.is_authenticated, auth.user_id) {
        (true, Some(user_id)) => Ok(user_id),
        _ => Err(AccessError::NotAuthenticated.into()),
    }
}

/// Load a club or 404. Used for public lookups and as the first step of
/// every club-scoped operation.
pub(crate) async fn load_club(clubs: &ClubsRepo, club_id: Uuid) -> Result<Club, AppError> {
    clubs
        .get(club_id)
        .await?
        .ok_or_else(|| ClubError::NotFound(club_id).into())
}

/// Resolve the caller's view of a club's internals.
///
/// Site admins see every club. Everyone else needs an active membership;
/// callers without one get the same `CLUB_NOT_FOUND` a nonexistent club
/// produces, so existence is not leaked (anonymous callers get 401 so they
/// know to authenticate first).
pub(crate) async fn require_club_view(
    clubs: &ClubsRepo,
    memberships: &MembershipsRepo,
    auth: &AuthContext,
    club_id: Uuid,
) -> Result<(Club, Option<Membership>), AppError> {
    let user_id = require_user(auth)?;
    let club = load_club(clubs, club_id).await?;

    if auth.is_site_admin() {
        let membership = memberships.get(club_id, user_id).await?;
        return Ok((club, membership));
    }

    match memberships.get(club_id, user_id).await? {
        Some(m) if m.is_active() => Ok((club, Some(m))),
        _ => Err(ClubError::NotFound(club_id).into()),
    }
}

/// Check a club capability against the caller's active membership. Pending,
/// suspended, and removed memberships grant nothing regardless of role.
pub(crate) fn require_club_capability(
    membership: Option<&Membership>,
    capability: ClubCapability,
) -> Result<&Membership, AppError> {
    match membership {
        Some(m) if m.is_active() && role_has_capability(m.role, capability) => Ok(m),
        _ => Err(AccessError::MissingCapability { capability }.into()),
    }
}

/// Build a [`Page`] from client pagination input, validating the cursor
/// against the partition it is expected to resume in.
pub(crate) fn page_from(
    limit: usize,
    cursor: Option<&str>,
    expected_pk: &str,
) -> Result<Page, AppError> {
    let start_after = match cursor {
        None => None,
        Some(token) => {
            let cursor = Cursor::decode(token)?;
            if cursor.pk != expected_pk {
                return Err(crate::store::StoreError::InvalidCursor.into());
            }
            Some(cursor.sk)
        }
    };
    Ok(Page { limit, start_after })
}

/// Clamp a client-requested page size to configured bounds.
pub(crate) fn clamp_limit(
    requested: Option<usize>,
    config: &crate::config::PaginationConfig,
) -> usize {
    requested
        .unwrap_or(config.default_page_size)
        .clamp(1, config.max_page_size)
}
