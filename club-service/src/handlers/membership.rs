use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use service_core::error::AppError;
use uuid::Uuid;

use super::PageQuery;
use crate::middleware::Auth;
use crate::models::{
    ChangeMembershipRoleRequest, ChangeMembershipStatusRequest, MembershipResponse,
    TransferOwnershipRequest,
};
use crate::repos::PagedResult;
use crate::AppState;

pub async fn request_join(
    State(state): State<AppState>,
    Auth(auth): Auth,
    Path(club_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let membership = state.memberships.request_join(&auth, club_id).await?;
    Ok((StatusCode::CREATED, Json(MembershipResponse::from(membership))))
}

pub async fn list_members(
    State(state): State<AppState>,
    Auth(auth): Auth,
    Path(club_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PagedResult<MembershipResponse>>, AppError> {
    let page = state
        .memberships
        .list(&auth, club_id, query.limit, query.cursor.as_deref())
        .await?;
    Ok(Json(PagedResult {
        items: page.items.into_iter().map(MembershipResponse::from).collect(),
        has_more: page.has_more,
        next_cursor: page.next_cursor,
    }))
}

pub async fn list_my_memberships(
    State(state): State<AppState>,
    Auth(auth): Auth,
    Query(query): Query<PageQuery>,
) -> Result<Json<PagedResult<MembershipResponse>>, AppError> {
    let page = state
        .memberships
        .list_mine(&auth, query.limit, query.cursor.as_deref())
        .await?;
    Ok(Json(PagedResult {
        items: page.items.into_iter().map(MembershipResponse::from).collect(),
        has_more: page.has_more,
        next_cursor: page.next_cursor,
    }))
}

pub async fn change_membership_status(
    State(state): State<AppState>,
    Auth(auth): Auth,
    Path((club_id, user_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<ChangeMembershipStatusRequest>,
) -> Result<Json<MembershipResponse>, AppError> {
    let membership = state
        .memberships
        .change_status(&auth, club_id, user_id, request)
        .await?;
    Ok(Json(MembershipResponse::from(membership)))
}

pub async fn change_membership_role(
    State(state): State<AppState>,
    Auth(auth): Auth,
    Path((club_id, user_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<ChangeMembershipRoleRequest>,
) -> Result<Json<MembershipResponse>, AppError> {
    let membership = state
        .memberships
        .change_role(&auth, club_id, user_id, request)
        .await?;
    Ok(Json(MembershipResponse::from(membership)))
}

pub async fn leave_club(
    State(state): State<AppState>,
    Auth(auth): Auth,
    Path(club_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.memberships.leave(&auth, club_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn transfer_ownership(
    State(state): State<AppState>,
    Auth(auth): Auth,
    Path(club_id): Path<Uuid>,
    Json(request): Json<TransferOwnershipRequest>,
) -> Result<Json<MembershipResponse>, AppError> {
    let new_owner = state
        .memberships
        .transfer_ownership(&auth, club_id, request)
        .await?;
    Ok(Json(MembershipResponse::from(new_owner)))
}
