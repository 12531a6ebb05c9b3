//! Membership repository.
//!
//! The current membership for a (club, user) pair lives at a fixed key, which
//! is what makes "at most one non-removed membership per club" a write
//! condition instead of a scan. Removing a member archives the record under a
//! history key and frees the current key for a future rejoin. A user-keyed
//! projection row is kept in the same transactions for "my clubs" lookups.

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use super::{club_pk, user_pk, PagedResult};
use crate::auth::ClubRole;
use crate::models::{Club, Membership, MembershipStatus};
use crate::store::{Item, Page, StoreError, TableStore, TransactOp};

const CLUB_META_SK: &str = "META";

fn member_sk(user_id: Uuid) -> String {
    format!("MEMBER#{user_id}")
}

fn archive_sk(user_id: Uuid, membership_id: Uuid) -> String {
    format!("XMEMBER#{user_id}#{membership_id}")
}

fn user_projection_sk(club_id: Uuid) -> String {
    format!("MEMBERSHIP#{club_id}")
}

#[derive(Clone)]
pub struct MembershipsRepo {
    store: Arc<dyn TableStore>,
}

impl MembershipsRepo {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self { store }
    }

    /// Insert a new membership record. Cancels if the user already holds a
    /// non-removed membership in the club.
    pub async fn create(&self, membership: &Membership) -> Result<(), StoreError> {
        let ops = self.create_ops(membership)?;
        self.store.transact_write(ops).await
    }

    /// The write operations behind [`Self::create`], for callers that need
    /// the membership to commit inside a larger transaction (club creation,
    /// invitation acceptance).
    pub(crate) fn create_ops(
        &self,
        membership: &Membership,
    ) -> Result<Vec<TransactOp>, StoreError> {
        let record = Item::encode(
            club_pk(membership.club_id),
            member_sk(membership.user_id),
            membership,
        )?;
        let projection = Item::encode(
            user_pk(membership.user_id),
            user_projection_sk(membership.club_id),
            membership,
        )?;
        Ok(vec![
            TransactOp::put_if_absent(record),
            TransactOp::put_if_absent(projection),
        ])
    }

    pub async fn get(
        &self,
        club_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Membership>, StoreError> {
        match self.store.get(&club_pk(club_id), &member_sk(user_id)).await? {
            Some(item) => Ok(Some(item.decode()?)),
            None => Ok(None),
        }
    }

    /// Persist a status or role change, conditioned on the stored status the
    /// caller validated the transition from.
    pub async fn update(
        &self,
        membership: &Membership,
        expected_status: MembershipStatus,
    ) -> Result<(), StoreError> {
        let record = Item::encode(
            club_pk(membership.club_id),
            member_sk(membership.user_id),
            membership,
        )?;
        let projection = Item::encode(
            user_pk(membership.user_id),
            user_projection_sk(membership.club_id),
            membership,
        )?;
        self.store
            .transact_write(vec![
                TransactOp::put_if_field(record, "status", json!(expected_status.as_str())),
                TransactOp::put_if_exists(projection),
            ])
            .await
    }

    /// Remove a member: archive the record (status already set to removed by
    /// the caller) and free the current-membership key.
    pub async fn remove(
        &self,
        membership: &Membership,
        expected_status: MembershipStatus,
    ) -> Result<(), StoreError> {
        let archived = Item::encode(
            club_pk(membership.club_id),
            archive_sk(membership.user_id, membership.membership_id),
            membership,
        )?;
        self.store
            .transact_write(vec![
                TransactOp::delete_if_field(
                    club_pk(membership.club_id),
                    member_sk(membership.user_id),
                    "status",
                    json!(expected_status.as_str()),
                ),
                TransactOp::put_if_absent(archived),
                TransactOp::delete_if_exists(
                    user_pk(membership.user_id),
                    user_projection_sk(membership.club_id),
                ),
            ])
            .await
    }

    /// Atomically move ownership: club metadata's owner anchor, the outgoing
    /// owner's demotion, and the incoming owner's promotion all commit
    /// together, keeping exactly one owner at every point in time.
    pub async fn transfer_ownership(
        &self,
        club: &Club,
        outgoing: &Membership,
        incoming: &Membership,
    ) -> Result<(), StoreError> {
        debug_assert_eq!(outgoing.role, ClubRole::Admin, "outgoing owner is demoted");
        debug_assert_eq!(incoming.role, ClubRole::Owner);

        let meta = Item::encode(club_pk(club.club_id), CLUB_META_SK, club)?;
        let outgoing_record = Item::encode(
            club_pk(outgoing.club_id),
            member_sk(outgoing.user_id),
            outgoing,
        )?;
        let outgoing_projection = Item::encode(
            user_pk(outgoing.user_id),
            user_projection_sk(outgoing.club_id),
            outgoing,
        )?;
        let incoming_record = Item::encode(
            club_pk(incoming.club_id),
            member_sk(incoming.user_id),
            incoming,
        )?;
        let incoming_projection = Item::encode(
            user_pk(incoming.user_id),
            user_projection_sk(incoming.club_id),
            incoming,
        )?;

        self.store
            .transact_write(vec![
                TransactOp::put_if_field(
                    meta,
                    "owner_user_id",
                    json!(outgoing.user_id.to_string()),
                ),
                TransactOp::put_if_field(
                    outgoing_record,
                    "role",
                    json!(ClubRole::Owner.as_str()),
                ),
                TransactOp::put_if_field(
                    incoming_record,
                    "status",
                    json!(MembershipStatus::Active.as_str()),
                ),
                TransactOp::put_if_exists(outgoing_projection),
                TransactOp::put_if_exists(incoming_projection),
            ])
            .await
    }

    /// Current (non-removed) memberships of a club, in user-id order.
    pub async fn list(
        &self,
        club_id: Uuid,
        page: &Page,
    ) -> Result<PagedResult<Membership>, StoreError> {
        let out = self.store.query(&club_pk(club_id), "MEMBER#", page).await?;
        let mut memberships = Vec::with_capacity(out.items.len());
        for item in &out.items {
            memberships.push(item.decode()?);
        }
        Ok(PagedResult::new(memberships, out.has_more, out.next_cursor))
    }

    /// A user's current memberships across clubs.
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        page: &Page,
    ) -> Result<PagedResult<Membership>, StoreError> {
        let out = self
            .store
            .query(&user_pk(user_id), "MEMBERSHIP#", page)
            .await?;
        let mut memberships = Vec::with_capacity(out.items.len());
        for item in &out.items {
            memberships.push(item.decode()?);
        }
        Ok(PagedResult::new(memberships, out.has_more, out.next_cursor))
    }
}
