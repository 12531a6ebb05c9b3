//! Ride repository: rides under their club partition, participants under the
//! ride partition. Joins and leaves pair the participant row mutation with a
//! counter-conditioned update of the ride row, so capacity can never be
//! oversubscribed by concurrent joins.

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use super::{club_pk, ride_pk, PagedResult};
use crate::models::{Participant, Ride, RideStatus};
use crate::store::{Item, Page, StoreError, TableStore, TransactOp};

fn ride_sk(ride_id: Uuid) -> String {
    format!("RIDE#{ride_id}")
}

fn participant_sk(user_id: Uuid) -> String {
    format!("PART#{user_id}")
}

#[derive(Clone)]
pub struct RidesRepo {
    store: Arc<dyn TableStore>,
}

impl RidesRepo {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, ride: &Ride) -> Result<(), StoreError> {
        let record = Item::encode(club_pk(ride.club_id), ride_sk(ride.ride_id), ride)?;
        self.store
            .transact_write(vec![TransactOp::put_if_absent(record)])
            .await
    }

    pub async fn get(&self, club_id: Uuid, ride_id: Uuid) -> Result<Option<Ride>, StoreError> {
        match self.store.get(&club_pk(club_id), &ride_sk(ride_id)).await? {
            Some(item) => Ok(Some(item.decode()?)),
            None => Ok(None),
        }
    }

    /// Persist a status transition, conditioned on the status the caller
    /// validated against. A concurrent transition cancels the write.
    pub async fn update_status(
        &self,
        ride: &Ride,
        expected_status: RideStatus,
    ) -> Result<(), StoreError> {
        let record = Item::encode(club_pk(ride.club_id), ride_sk(ride.ride_id), ride)?;
        self.store
            .transact_write(vec![TransactOp::put_if_field(
                record,
                "status",
                json!(expected_status.as_str()),
            )])
            .await
    }

    /// Add a participant. The ride row update is conditioned on the
    /// participant count observed when capacity was checked and on the ride
    /// still being published: a concurrent join bumps the count and cancels
    /// this transaction instead of oversubscribing the ride, and a concurrent
    /// status transition cancels it instead of being overwritten by the
    /// stale ride view.
    pub async fn join(
        &self,
        ride: &Ride,
        participant: &Participant,
        observed_count: u32,
    ) -> Result<(), StoreError> {
        let record = Item::encode(club_pk(ride.club_id), ride_sk(ride.ride_id), ride)?;
        let participant_row = Item::encode(
            ride_pk(ride.ride_id),
            participant_sk(participant.user_id),
            participant,
        )?;
        self.store
            .transact_write(vec![
                TransactOp::put_if_absent(participant_row),
                TransactOp::put_if_fields(
                    record,
                    vec![
                        ("status", json!(RideStatus::Published.as_str())),
                        ("participant_count", json!(observed_count)),
                    ],
                ),
            ])
            .await
    }

    /// Remove a participant, decrementing the counter under the same
    /// optimistic conditions as joins.
    pub async fn leave(
        &self,
        ride: &Ride,
        user_id: Uuid,
        observed_count: u32,
    ) -> Result<(), StoreError> {
        let record = Item::encode(club_pk(ride.club_id), ride_sk(ride.ride_id), ride)?;
        self.store
            .transact_write(vec![
                TransactOp::delete_if_exists(ride_pk(ride.ride_id), participant_sk(user_id)),
                TransactOp::put_if_fields(
                    record,
                    vec![
                        ("status", json!(RideStatus::Published.as_str())),
                        ("participant_count", json!(observed_count)),
                    ],
                ),
            ])
            .await
    }

    pub async fn get_participant(
        &self,
        ride_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Participant>, StoreError> {
        match self
            .store
            .get(&ride_pk(ride_id), &participant_sk(user_id))
            .await?
        {
            Some(item) => Ok(Some(item.decode()?)),
            None => Ok(None),
        }
    }

    pub async fn list(
        &self,
        club_id: Uuid,
        page: &Page,
    ) -> Result<PagedResult<Ride>, StoreError> {
        let out = self.store.query(&club_pk(club_id), "RIDE#", page).await?;
        let mut rides = Vec::with_capacity(out.items.len());
        for item in &out.items {
            rides.push(item.decode()?);
        }
        Ok(PagedResult::new(rides, out.has_more, out.next_cursor))
    }

    pub async fn list_participants(
        &self,
        ride_id: Uuid,
        page: &Page,
    ) -> Result<PagedResult<Participant>, StoreError> {
        let out = self.store.query(&ride_pk(ride_id), "PART#", page).await?;
        let mut participants = Vec::with_capacity(out.items.len());
        for item in &out.items {
            participants.push(item.decode()?);
        }
        Ok(PagedResult::new(participants, out.has_more, out.next_cursor))
    }
}
