use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use service_core::error::AppError;
use uuid::Uuid;

use crate::middleware::Auth;
use crate::models::{
    ChangeClubStatusRequest, ClubResponse, ClubStatus, CreateClubRequest, UpdateClubRequest,
};
use crate::repos::clubs::ClubFilter;
use crate::repos::PagedResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ClubListQuery {
    pub limit: Option<usize>,
    pub cursor: Option<String>,
    pub status: Option<ClubStatus>,
    pub city: Option<String>,
}

pub async fn create_club(
    State(state): State<AppState>,
    Auth(auth): Auth,
    Json(request): Json<CreateClubRequest>,
) -> Result<impl IntoResponse, AppError> {
    let club = state.clubs.create(&auth, request).await?;
    Ok((StatusCode::CREATED, Json(ClubResponse::from(club))))
}

pub async fn get_club(
    State(state): State<AppState>,
    Path(club_id): Path<Uuid>,
) -> Result<Json<ClubResponse>, AppError> {
    let club = state.clubs.get(club_id).await?;
    Ok(Json(ClubResponse::from(club)))
}

pub async fn list_clubs(
    State(state): State<AppState>,
    Query(query): Query<ClubListQuery>,
) -> Result<Json<PagedResult<ClubResponse>>, AppError> {
    let filter = ClubFilter {
        status: query.status,
        city: query.city,
    };
    let page = state
        .clubs
        .list(query.limit, query.cursor.as_deref(), filter)
        .await?;
    Ok(Json(PagedResult {
        items: page.items.into_iter().map(ClubResponse::from).collect(),
        has_more: page.has_more,
        next_cursor: page.next_cursor,
    }))
}

pub async fn update_club(
    State(state): State<AppState>,
    Auth(auth): Auth,
    Path(club_id): Path<Uuid>,
    Json(request): Json<UpdateClubRequest>,
) -> Result<Json<ClubResponse>, AppError> {
    let club = state.clubs.update(&auth, club_id, request).await?;
    Ok(Json(ClubResponse::from(club)))
}

pub async fn change_club_status(
    State(state): State<AppState>,
    Auth(auth): Auth,
    Path(club_id): Path<Uuid>,
    Json(request): Json<ChangeClubStatusRequest>,
) -> Result<Json<ClubResponse>, AppError> {
    let club = state.clubs.change_status(&auth, club_id, request).await?;
    Ok(Json(ClubResponse::from(club)))
}
