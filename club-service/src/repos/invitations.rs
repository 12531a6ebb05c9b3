//! Invitation repository.
//!
//! A pending-invite guard row enforces at most one pending invitation per
//! (club, invitee email); a token-keyed row supports acceptance by token
//! without knowing the club. Both rows exist only while the invitation is
//! pending: every terminal transition deletes them in the same transaction
//! that flips the status, which is what makes token consumption single-use.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::{club_pk, PagedResult};
use crate::models::{Invitation, InvitationStatus};
use crate::store::{Item, Page, StoreError, TableStore, TransactOp};

fn invite_sk(invitation_id: Uuid) -> String {
    format!("INVITE#{invitation_id}")
}

fn guard_sk(email_key: &str) -> String {
    format!("INVITEGUARD#{email_key}")
}

fn token_pk(token: &str) -> String {
    format!("INVITETOKEN#{token}")
}

const TOKEN_SK: &str = "META";

/// Body of the token lookup row.
#[derive(Debug, Deserialize)]
struct TokenPointer {
    club_id: Uuid,
    invitation_id: Uuid,
}

#[derive(Clone)]
pub struct InvitationsRepo {
    store: Arc<dyn TableStore>,
}

impl InvitationsRepo {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self { store }
    }

    /// Create an invitation, its pending guard, and its token pointer
    /// atomically. Cancels if a pending invitation already exists for the
    /// invitee.
    pub async fn create(&self, invitation: &Invitation) -> Result<(), StoreError> {
        let email_key = Invitation::email_key(&invitation.invited_email);
        let record = Item::encode(
            club_pk(invitation.club_id),
            invite_sk(invitation.invitation_id),
            invitation,
        )?;
        let guard = Item::encode(
            club_pk(invitation.club_id),
            guard_sk(&email_key),
            &json!({ "invitation_id": invitation.invitation_id }),
        )?;
        let pointer = Item::encode(
            token_pk(&invitation.token),
            TOKEN_SK,
            &json!({
                "club_id": invitation.club_id,
                "invitation_id": invitation.invitation_id,
            }),
        )?;

        self.store
            .transact_write(vec![
                TransactOp::put_if_absent(record),
                TransactOp::put_if_absent(guard),
                TransactOp::put_if_absent(pointer),
            ])
            .await
    }

    pub async fn get(
        &self,
        club_id: Uuid,
        invitation_id: Uuid,
    ) -> Result<Option<Invitation>, StoreError> {
        match self
            .store
            .get(&club_pk(club_id), &invite_sk(invitation_id))
            .await?
        {
            Some(item) => Ok(Some(item.decode()?)),
            None => Ok(None),
        }
    }

    /// Resolve an invitation by its acceptance token.
    pub async fn get_by_token(&self, token: &str) -> Result<Option<Invitation>, StoreError> {
        let pointer = match self.store.get(&token_pk(token), TOKEN_SK).await? {
            Some(item) => item.decode::<TokenPointer>()?,
            None => return Ok(None),
        };
        self.get(pointer.club_id, pointer.invitation_id).await
    }

    /// Commit a terminal transition. The status flip is conditioned on the
    /// stored record still being pending, and the guard and token rows are
    /// deleted in the same transaction: a concurrent acceptance makes the
    /// whole write cancel (read-check-write, no double acceptance).
    pub async fn finalize(&self, invitation: &Invitation) -> Result<(), StoreError> {
        let ops = self.finalize_ops(invitation)?;
        self.store.transact_write(ops).await
    }

    /// Finalize as accepted and commit the new membership in the same
    /// transaction: the token is consumed if and only if the membership rows
    /// are written. A cancellation leaves the invitation pending.
    pub async fn accept(
        &self,
        invitation: &Invitation,
        membership_ops: Vec<TransactOp>,
    ) -> Result<(), StoreError> {
        debug_assert_eq!(invitation.status, InvitationStatus::Accepted);

        let mut ops = self.finalize_ops(invitation)?;
        ops.extend(membership_ops);
        self.store.transact_write(ops).await
    }

    fn finalize_ops(&self, invitation: &Invitation) -> Result<Vec<TransactOp>, StoreError> {
        debug_assert!(invitation.status.is_terminal());

        let email_key = Invitation::email_key(&invitation.invited_email);
        let record = Item::encode(
            club_pk(invitation.club_id),
            invite_sk(invitation.invitation_id),
            invitation,
        )?;

        Ok(vec![
            TransactOp::put_if_field(
                record,
                "status",
                json!(InvitationStatus::Pending.as_str()),
            ),
            TransactOp::delete_if_exists(club_pk(invitation.club_id), guard_sk(&email_key)),
            TransactOp::delete_if_exists(token_pk(&invitation.token), TOKEN_SK),
        ])
    }

    /// True when a pending invitation exists for this invitee.
    pub async fn pending_exists(
        &self,
        club_id: Uuid,
        email: &str,
    ) -> Result<bool, StoreError> {
        let email_key = Invitation::email_key(email);
        Ok(self
            .store
            .get(&club_pk(club_id), &guard_sk(&email_key))
            .await?
            .is_some())
    }

    pub async fn list(
        &self,
        club_id: Uuid,
        page: &Page,
    ) -> Result<PagedResult<Invitation>, StoreError> {
        let out = self.store.query(&club_pk(club_id), "INVITE#", page).await?;
        let mut invitations = Vec::with_capacity(out.items.len());
        for item in &out.items {
            invitations.push(item.decode()?);
        }
        Ok(PagedResult::new(invitations, out.has_more, out.next_cursor))
    }
}
