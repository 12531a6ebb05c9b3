use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use service_core::error::AppError;
use uuid::Uuid;

use super::PageQuery;
use crate::middleware::Auth;
use crate::models::{CancelRideRequest, CreateRideRequest, Participant, RideResponse};
use crate::repos::PagedResult;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ParticipantResponse {
    pub user_id: Uuid,
    pub role: crate::models::ParticipantRole,
    pub joined_at: chrono::DateTime<chrono::Utc>,
}

impl From<Participant> for ParticipantResponse {
    fn from(p: Participant) -> Self {
        Self {
            user_id: p.user_id,
            role: p.role,
            joined_at: p.joined_at,
        }
    }
}

pub async fn create_ride(
    State(state): State<AppState>,
    Auth(auth): Auth,
    Path(club_id): Path<Uuid>,
    Json(request): Json<CreateRideRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ride = state.rides.create(&auth, club_id, request).await?;
    Ok((StatusCode::CREATED, Json(RideResponse::from(ride))))
}

pub async fn get_ride(
    State(state): State<AppState>,
    Auth(auth): Auth,
    Path((club_id, ride_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<RideResponse>, AppError> {
    let ride = state.rides.get(&auth, club_id, ride_id).await?;
    Ok(Json(RideResponse::from(ride)))
}

pub async fn list_rides(
    State(state): State<AppState>,
    Auth(auth): Auth,
    Path(club_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PagedResult<RideResponse>>, AppError> {
    let page = state
        .rides
        .list(&auth, club_id, query.limit, query.cursor.as_deref())
        .await?;
    Ok(Json(PagedResult {
        items: page.items.into_iter().map(RideResponse::from).collect(),
        has_more: page.has_more,
        next_cursor: page.next_cursor,
    }))
}

pub async fn publish_ride(
    State(state): State<AppState>,
    Auth(auth): Auth,
    Path((club_id, ride_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<RideResponse>, AppError> {
    let ride = state.rides.publish(&auth, club_id, ride_id).await?;
    Ok(Json(RideResponse::from(ride)))
}

pub async fn start_ride(
    State(state): State<AppState>,
    Auth(auth): Auth,
    Path((club_id, ride_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<RideResponse>, AppError> {
    let ride = state.rides.start(&auth, club_id, ride_id).await?;
    Ok(Json(RideResponse::from(ride)))
}

pub async fn complete_ride(
    State(state): State<AppState>,
    Auth(auth): Auth,
    Path((club_id, ride_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<RideResponse>, AppError> {
    let ride = state.rides.complete(&auth, club_id, ride_id).await?;
    Ok(Json(RideResponse::from(ride)))
}

pub async fn cancel_ride(
    State(state): State<AppState>,
    Auth(auth): Auth,
    Path((club_id, ride_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<CancelRideRequest>,
) -> Result<Json<RideResponse>, AppError> {
    let ride = state.rides.cancel(&auth, club_id, ride_id, request).await?;
    Ok(Json(RideResponse::from(ride)))
}

pub async fn join_ride(
    State(state): State<AppState>,
    Auth(auth): Auth,
    Path((club_id, ride_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let participant = state.rides.join(&auth, club_id, ride_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(ParticipantResponse::from(participant)),
    ))
}

pub async fn leave_ride(
    State(state): State<AppState>,
    Auth(auth): Auth,
    Path((club_id, ride_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    state.rides.leave(&auth, club_id, ride_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_participants(
    State(state): State<AppState>,
    Auth(auth): Auth,
    Path((club_id, ride_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PagedResult<ParticipantResponse>>, AppError> {
    let page = state
        .rides
        .participants(&auth, club_id, ride_id, query.limit, query.cursor.as_deref())
        .await?;
    Ok(Json(PagedResult {
        items: page
            .items
            .into_iter()
            .map(ParticipantResponse::from)
            .collect(),
        has_more: page.has_more,
        next_cursor: page.next_cursor,
    }))
}
