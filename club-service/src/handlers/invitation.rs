use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use service_core::error::AppError;
use uuid::Uuid;

use super::PageQuery;
use crate::middleware::Auth;
use crate::models::{
    AcceptInvitationRequest, CreateInvitationRequest, InvitationResponse, MembershipResponse,
};
use crate::repos::PagedResult;
use crate::AppState;

pub async fn create_invitation(
    State(state): State<AppState>,
    Auth(auth): Auth,
    Path(club_id): Path<Uuid>,
    Json(request): Json<CreateInvitationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let invitation = state.invitations.create(&auth, club_id, request).await?;
    // The token is disclosed exactly once, in this response.
    Ok((
        StatusCode::CREATED,
        Json(InvitationResponse::with_token(invitation)),
    ))
}

pub async fn list_invitations(
    State(state): State<AppState>,
    Auth(auth): Auth,
    Path(club_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PagedResult<InvitationResponse>>, AppError> {
    let page = state
        .invitations
        .list(&auth, club_id, query.limit, query.cursor.as_deref())
        .await?;
    Ok(Json(PagedResult {
        items: page.items.into_iter().map(InvitationResponse::from).collect(),
        has_more: page.has_more,
        next_cursor: page.next_cursor,
    }))
}

pub async fn accept_invitation(
    State(state): State<AppState>,
    Auth(auth): Auth,
    Json(request): Json<AcceptInvitationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let membership = state.invitations.accept(&auth, &request.token).await?;
    Ok((StatusCode::CREATED, Json(MembershipResponse::from(membership))))
}

pub async fn decline_invitation(
    State(state): State<AppState>,
    Auth(auth): Auth,
    Json(request): Json<AcceptInvitationRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.invitations.decline(&auth, &request.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn revoke_invitation(
    State(state): State<AppState>,
    Auth(auth): Auth,
    Path((club_id, invitation_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<InvitationResponse>, AppError> {
    let invitation = state
        .invitations
        .revoke(&auth, club_id, invitation_id)
        .await?;
    Ok(Json(InvitationResponse::from(invitation)))
}
