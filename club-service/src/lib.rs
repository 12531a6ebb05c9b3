//! Club and ride membership platform core service.
//!
//! Request flow: claims middleware builds an [`auth::AuthContext`], handlers
//! decode input, domain services enforce capabilities and state machines,
//! repositories commit conditional transactions against the shared table.

pub mod auth;
pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repos;
pub mod services;
pub mod store;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::AuthorizationService;
use crate::config::{ClubConfig, SecurityConfig};
use crate::handlers::{club, context, invitation, membership, ride};
use crate::middleware::auth_context_middleware;
use crate::repos::{ClubsRepo, InvitationsRepo, MembershipsRepo, RidesRepo};
use crate::services::{ClubService, InvitationService, MembershipService, RideService};
use crate::store::TableStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ClubConfig>,
    pub authz: Arc<AuthorizationService>,
    pub clubs: ClubService,
    pub memberships: MembershipService,
    pub invitations: InvitationService,
    pub rides: RideService,
}

impl AppState {
    pub fn new(config: ClubConfig, store: Arc<dyn TableStore>) -> Self {
        let authz = Arc::new(AuthorizationService::new(&config.authz));

        let clubs_repo = ClubsRepo::new(Arc::clone(&store));
        let memberships_repo = MembershipsRepo::new(Arc::clone(&store));
        let invitations_repo = InvitationsRepo::new(Arc::clone(&store));
        let rides_repo = RidesRepo::new(store);

        let clubs = ClubService::new(
            clubs_repo.clone(),
            memberships_repo.clone(),
            Arc::clone(&authz),
            config.pagination.clone(),
        );
        let memberships = MembershipService::new(
            clubs_repo.clone(),
            memberships_repo.clone(),
            config.pagination.clone(),
        );
        let invitations = InvitationService::new(
            clubs_repo.clone(),
            memberships_repo.clone(),
            invitations_repo,
            config.invitations.clone(),
            config.pagination.clone(),
        );
        let rides = RideService::new(
            clubs_repo,
            memberships_repo,
            rides_repo,
            config.pagination.clone(),
        );

        Self {
            config: Arc::new(config),
            authz,
            clubs,
            memberships,
            invitations,
            rides,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.security);

    Router::new()
        .route("/health", get(health_check))
        .route("/whoami", get(context::whoami))
        .route("/capabilities", get(context::capability_matrix))
        .route("/authz/check", post(context::check_capability))
        .route("/clubs", post(club::create_club).get(club::list_clubs))
        .route(
            "/clubs/:club_id",
            get(club::get_club).patch(club::update_club),
        )
        .route("/clubs/:club_id/status", post(club::change_club_status))
        .route(
            "/clubs/:club_id/memberships",
            post(membership::request_join).get(membership::list_members),
        )
        .route(
            "/clubs/:club_id/memberships/me",
            delete(membership::leave_club),
        )
        .route(
            "/clubs/:club_id/memberships/:user_id/status",
            post(membership::change_membership_status),
        )
        .route(
            "/clubs/:club_id/memberships/:user_id/role",
            post(membership::change_membership_role),
        )
        .route(
            "/clubs/:club_id/ownership",
            post(membership::transfer_ownership),
        )
        .route("/me/memberships", get(membership::list_my_memberships))
        .route(
            "/clubs/:club_id/invitations",
            post(invitation::create_invitation).get(invitation::list_invitations),
        )
        .route(
            "/clubs/:club_id/invitations/:invitation_id",
            delete(invitation::revoke_invitation),
        )
        .route("/invitations/accept", post(invitation::accept_invitation))
        .route("/invitations/decline", post(invitation::decline_invitation))
        .route(
            "/clubs/:club_id/rides",
            post(ride::create_ride).get(ride::list_rides),
        )
        .route("/clubs/:club_id/rides/:ride_id", get(ride::get_ride))
        .route(
            "/clubs/:club_id/rides/:ride_id/publish",
            post(ride::publish_ride),
        )
        .route(
            "/clubs/:club_id/rides/:ride_id/start",
            post(ride::start_ride),
        )
        .route(
            "/clubs/:club_id/rides/:ride_id/complete",
            post(ride::complete_ride),
        )
        .route(
            "/clubs/:club_id/rides/:ride_id/cancel",
            post(ride::cancel_ride),
        )
        .route(
            "/clubs/:club_id/rides/:ride_id/participants",
            post(ride::join_ride).get(ride::list_participants),
        )
        .route(
            "/clubs/:club_id/rides/:ride_id/participants/me",
            delete(ride::leave_ride),
        )
        .with_state(state)
        .layer(axum::middleware::from_fn(auth_context_middleware))
        .layer(axum::middleware::from_fn(
            service_core::middleware::tracing::request_id_middleware,
        ))
        .layer(axum::middleware::from_fn(
            service_core::middleware::security_headers::security_headers_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if security.allowed_origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = security
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
