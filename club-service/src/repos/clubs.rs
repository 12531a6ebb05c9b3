//! Club repository: metadata, global name uniqueness, discovery projection.

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use super::{club_pk, PagedResult};
use crate::models::{Club, ClubStatus};
use crate::store::{Item, Page, StoreError, TableStore, TransactOp};

const META_SK: &str = "META";
const GUARD_SK: &str = "GUARD";
const DISCOVERY_PK: &str = "CLUBS";

fn name_guard_pk(name_key: &str) -> String {
    format!("CLUBNAME#{name_key}")
}

fn discovery_sk(club_id: Uuid) -> String {
    format!("CLUB#{club_id}")
}

/// Optional server-side filters for club listing.
///
/// Known limitation: the discovery partition is keyed by club id only, so
/// these filters are applied in memory to each fetched page; a page may carry
/// fewer than `limit` matches while `has_more` remains true.
#[derive(Debug, Default, Clone)]
pub struct ClubFilter {
    pub status: Option<ClubStatus>,
    pub city: Option<String>,
}

impl ClubFilter {
    fn matches(&self, club: &Club) -> bool {
        if let Some(status) = self.status {
            if club.status != status {
                return false;
            }
        }
        if let Some(city) = &self.city {
            match &club.city {
                Some(club_city) if club_city.eq_ignore_ascii_case(city) => {}
                _ => return false,
            }
        }
        true
    }
}

#[derive(Clone)]
pub struct ClubsRepo {
    store: Arc<dyn TableStore>,
}

impl ClubsRepo {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self { store }
    }

    /// Create a club, its name guard, its discovery projection, and the
    /// founding owner's membership rows in one transaction, so a club never
    /// exists without its owner holding a membership. Cancels entirely if
    /// the name guard already exists.
    pub async fn create(
        &self,
        club: &Club,
        owner_ops: Vec<TransactOp>,
    ) -> Result<(), StoreError> {
        let name_key = Club::name_key(&club.name);
        let meta = Item::encode(club_pk(club.club_id), META_SK, club)?;
        let guard = Item::encode(
            name_guard_pk(&name_key),
            GUARD_SK,
            &json!({ "club_id": club.club_id }),
        )?;
        let projection = Item::encode(DISCOVERY_PK, discovery_sk(club.club_id), club)?;

        let mut ops = vec![
            TransactOp::put_if_absent(meta),
            TransactOp::put_if_absent(guard),
            TransactOp::put_if_absent(projection),
        ];
        ops.extend(owner_ops);
        self.store.transact_write(ops).await
    }

    pub async fn get(&self, club_id: Uuid) -> Result<Option<Club>, StoreError> {
        match self.store.get(&club_pk(club_id), META_SK).await? {
            Some(item) => Ok(Some(item.decode()?)),
            None => Ok(None),
        }
    }

    /// Persist updated club state, keeping the projection in sync. When the
    /// name changed, the new guard is claimed and the old one released in the
    /// same transaction; a conflict on the new guard cancels everything.
    pub async fn update(&self, club: &Club, previous_name: &str) -> Result<(), StoreError> {
        let meta = Item::encode(club_pk(club.club_id), META_SK, club)?;
        let projection = Item::encode(DISCOVERY_PK, discovery_sk(club.club_id), club)?;

        let mut ops = vec![
            TransactOp::put_if_exists(meta),
            TransactOp::put_if_exists(projection),
        ];

        let old_key = Club::name_key(previous_name);
        let new_key = Club::name_key(&club.name);
        if old_key != new_key {
            let guard = Item::encode(
                name_guard_pk(&new_key),
                GUARD_SK,
                &json!({ "club_id": club.club_id }),
            )?;
            ops.push(TransactOp::put_if_absent(guard));
            ops.push(TransactOp::delete_if_exists(name_guard_pk(&old_key), GUARD_SK));
        }

        self.store.transact_write(ops).await
    }

    /// True when a different club already holds this name.
    pub async fn name_taken_by_other(
        &self,
        name: &str,
        club_id: Uuid,
    ) -> Result<bool, StoreError> {
        let guard = self
            .store
            .get(&name_guard_pk(&Club::name_key(name)), GUARD_SK)
            .await?;
        match guard {
            None => Ok(false),
            Some(item) => {
                let holder: Uuid = item
                    .body
                    .get("club_id")
                    .and_then(|v| v.as_str())
                    .and_then(|s| Uuid::parse_str(s).ok())
                    .ok_or_else(|| StoreError::Decode {
                        pk: item.pk.clone(),
                        sk: item.sk.clone(),
                        source: serde::de::Error::custom("guard missing club_id"),
                    })?;
                Ok(holder != club_id)
            }
        }
    }

    pub async fn list(
        &self,
        page: &Page,
        filter: &ClubFilter,
    ) -> Result<PagedResult<Club>, StoreError> {
        let out = self.store.query(DISCOVERY_PK, "CLUB#", page).await?;
        let mut clubs = Vec::with_capacity(out.items.len());
        for item in &out.items {
            let club: Club = item.decode()?;
            if filter.matches(&club) {
                clubs.push(club);
            }
        }
        Ok(PagedResult::new(clubs, out.has_more, out.next_cursor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::ClubRole;
    use crate::models::Membership;
    use crate::repos::MembershipsRepo;
    use crate::store::InMemoryTable;

    fn new_club(name: &str, owner: Uuid) -> Club {
        Club::new(name.to_string(), None, None, None, owner)
    }

    #[tokio::test]
    async fn create_commits_club_and_owner_membership_together() {
        let store: Arc<dyn TableStore> = Arc::new(InMemoryTable::new());
        let clubs = ClubsRepo::new(Arc::clone(&store));
        let memberships = MembershipsRepo::new(Arc::clone(&store));

        let owner_id = Uuid::new_v4();
        let club = new_club("Harbour Riders", owner_id);
        let owner = Membership::active(club.club_id, owner_id, ClubRole::Owner);
        clubs
            .create(&club, memberships.create_ops(&owner).unwrap())
            .await
            .unwrap();

        let stored = memberships.get(club.club_id, owner_id).await.unwrap().unwrap();
        assert_eq!(stored.role, ClubRole::Owner);
    }

    #[tokio::test]
    async fn name_conflict_leaves_no_orphan_membership() {
        let store: Arc<dyn TableStore> = Arc::new(InMemoryTable::new());
        let clubs = ClubsRepo::new(Arc::clone(&store));
        let memberships = MembershipsRepo::new(Arc::clone(&store));

        let first_owner = Uuid::new_v4();
        let first = new_club("Harbour Riders", first_owner);
        let first_membership = Membership::active(first.club_id, first_owner, ClubRole::Owner);
        clubs
            .create(&first, memberships.create_ops(&first_membership).unwrap())
            .await
            .unwrap();

        let second_owner = Uuid::new_v4();
        let second = new_club("harbour riders", second_owner);
        let second_membership = Membership::active(second.club_id, second_owner, ClubRole::Owner);
        let result = clubs
            .create(&second, memberships.create_ops(&second_membership).unwrap())
            .await;

        assert!(matches!(
            result,
            Err(StoreError::TransactionCancelled { .. })
        ));
        // All-or-nothing: no club row and no membership rows for the loser.
        assert!(clubs.get(second.club_id).await.unwrap().is_none());
        assert!(memberships
            .get(second.club_id, second_owner)
            .await
            .unwrap()
            .is_none());
    }
}
