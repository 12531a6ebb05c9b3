//! Identity and authorization introspection endpoints.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use uuid::Uuid;

use crate::auth::{
    club_capabilities, system_capabilities, CapabilityCheck, ClubRole, SystemCapability,
    SystemRole,
};
use crate::middleware::Auth;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct WhoAmIResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub system_role: SystemRole,
    pub capabilities: Vec<&'static str>,
}

/// Who the platform thinks the caller is, with their derived system
/// capabilities.
pub async fn whoami(
    State(state): State<AppState>,
    Auth(auth): Auth,
) -> Result<Json<WhoAmIResponse>, AppError> {
    let capabilities = match (auth.is_authenticated, auth.user_id) {
        (true, Some(user_id)) => {
            let mut caps: Vec<&'static str> = state
                .authz
                .derive_capabilities(user_id, auth.system_role)
                .map_err(AppError::Internal)?
                .into_iter()
                .map(|c| c.as_str())
                .collect();
            caps.sort_unstable();
            caps
        }
        _ => Vec::new(),
    };

    Ok(Json(WhoAmIResponse {
        authenticated: auth.is_authenticated,
        user_id: auth.user_id,
        email: auth.email,
        system_role: auth.system_role,
        capabilities,
    }))
}

#[derive(Debug, Serialize)]
pub struct RoleCapabilities {
    pub role: &'static str,
    pub capabilities: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct CapabilityMatrixResponse {
    pub system: Vec<RoleCapabilities>,
    pub club: Vec<RoleCapabilities>,
}

/// The full role -> capability matrices, for client-side feature gating.
pub async fn capability_matrix() -> Json<CapabilityMatrixResponse> {
    let system = [SystemRole::User, SystemRole::SiteAdmin]
        .into_iter()
        .map(|role| RoleCapabilities {
            role: role.as_str(),
            capabilities: system_capabilities(role).iter().map(|c| c.as_str()).collect(),
        })
        .collect();
    let club = [ClubRole::Member, ClubRole::Admin, ClubRole::Owner]
        .into_iter()
        .map(|role| RoleCapabilities {
            role: role.as_str(),
            capabilities: club_capabilities(role).iter().map(|c| c.as_str()).collect(),
        })
        .collect();
    Json(CapabilityMatrixResponse { system, club })
}

#[derive(Debug, Deserialize)]
pub struct CheckCapabilityRequest {
    pub capability: SystemCapability,
    pub resource: Option<String>,
}

/// Evaluate a system capability for the caller, returning the decision with
/// its reason rather than a bare 403. Grants and denies both come back 200.
pub async fn check_capability(
    State(state): State<AppState>,
    Auth(auth): Auth,
    Json(request): Json<CheckCapabilityRequest>,
) -> Json<CapabilityCheck> {
    let check = state
        .authz
        .authorize(&auth, request.capability, request.resource.as_deref());
    Json(check)
}
