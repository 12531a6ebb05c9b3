//! Request authentication middleware.
//!
//! The edge gateway verifies the bearer token and forwards the validated
//! claim bag as a JSON header. This middleware parses that header into an
//! [`AuthContext`] and stores it in request extensions; requests without the
//! header proceed anonymously and are gated per-operation by the services.

use axum::extract::{FromRequestParts, Request};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde_json::Value;
use service_core::async_trait::async_trait;
use service_core::error::AppError;

use crate::auth::{extract_auth_context, AuthContext, ClaimsError};

/// Header carrying the gateway-verified claim bag as JSON.
pub const VERIFIED_CLAIMS_HEADER: &str = "x-verified-claims";

pub async fn auth_context_middleware(mut request: Request, next: Next) -> Response {
    let claims: Option<Value> = match request.headers().get(VERIFIED_CLAIMS_HEADER) {
        None => None,
        Some(value) => {
            let parsed = value
                .to_str()
                .map_err(|e| ClaimsError::InvalidClaim {
                    name: "claims",
                    reason: e.to_string(),
                })
                .and_then(|raw| {
                    serde_json::from_str(raw).map_err(|e| ClaimsError::InvalidClaim {
                        name: "claims",
                        reason: e.to_string(),
                    })
                });
            match parsed {
                Ok(v) => Some(v),
                Err(err) => return AppError::from(err).into_response(),
            }
        }
    };

    match extract_auth_context(claims.as_ref(), Utc::now()) {
        Ok(ctx) => {
            request.extensions_mut().insert(ctx);
            next.run(request).await
        }
        Err(err) => AppError::from(err).into_response(),
    }
}

/// Extractor handing handlers the context the middleware stored.
pub struct Auth(pub AuthContext);

#[async_trait]
impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(Auth)
            .ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!(
                    "auth context missing; auth middleware not installed"
                ))
            })
    }
}
