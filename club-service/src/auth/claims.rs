//! Claims extraction: verified claim bag -> AuthContext.
//!
//! The upstream gateway authorizer has already verified the token signature;
//! this module only validates shape and freshness. Any missing or malformed
//! required claim fails closed. An absent claim bag is not an error: public
//! endpoints serve anonymous callers.

use chrono::{DateTime, Utc};
use serde_json::Value;
use service_core::error::{AppError, ErrorDetail};
use thiserror::Error;
use uuid::Uuid;

use super::capabilities::SystemRole;

/// Custom claim carrying the platform-wide role.
pub const SYSTEM_ROLE_CLAIM: &str = "custom:system_role";

#[derive(Debug, Error)]
pub enum ClaimsError {
    #[error("missing required claim: {0}")]
    MissingClaim(&'static str),

    #[error("invalid claim {name}: {reason}")]
    InvalidClaim { name: &'static str, reason: String },

    #[error("token expired at {expired_at}")]
    ExpiredToken { expired_at: i64 },
}

impl From<ClaimsError> for AppError {
    fn from(err: ClaimsError) -> Self {
        let code = match err {
            ClaimsError::MissingClaim(_) => "MISSING_CLAIM",
            ClaimsError::InvalidClaim { .. } => "INVALID_CLAIM",
            ClaimsError::ExpiredToken { .. } => "EXPIRED_TOKEN",
        };
        AppError::Unauthorized(ErrorDetail::new(code, err.to_string()))
    }
}

/// Per-request identity derived from verified claims. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: Option<Uuid>,
    pub email: Option<String>,
    pub system_role: SystemRole,
    pub is_authenticated: bool,
    /// Epoch seconds.
    pub issued_at: Option<i64>,
    /// Epoch seconds.
    pub expires_at: Option<i64>,
}

impl AuthContext {
    /// Context for a request with no authorizer block.
    pub fn anonymous() -> Self {
        Self {
            user_id: None,
            email: None,
            system_role: SystemRole::User,
            is_authenticated: false,
            issued_at: None,
            expires_at: None,
        }
    }

    pub fn is_site_admin(&self) -> bool {
        self.is_authenticated && self.system_role == SystemRole::SiteAdmin
    }
}

/// Build an [`AuthContext`] from the gateway's verified claim bag.
///
/// `claims` is the raw authorizer output: `None` means no authorizer ran and
/// yields an anonymous context rather than an error.
pub fn extract_auth_context(
    claims: Option<&Value>,
    now: DateTime<Utc>,
) -> Result<AuthContext, ClaimsError> {
    let bag = match claims {
        None => return Ok(AuthContext::anonymous()),
        Some(v) => v.as_object().ok_or(ClaimsError::InvalidClaim {
            name: "claims",
            reason: "claim bag is not an object".to_string(),
        })?,
    };

    let sub = require_string(bag, "sub")?;
    let user_id = Uuid::parse_str(sub).map_err(|e| ClaimsError::InvalidClaim {
        name: "sub",
        reason: e.to_string(),
    })?;
    let email = require_string(bag, "email")?.to_string();
    let issued_at = epoch_seconds(bag, "iat")?;
    let expires_at = epoch_seconds(bag, "exp")?;

    if expires_at < now.timestamp() {
        return Err(ClaimsError::ExpiredToken {
            expired_at: expires_at,
        });
    }

    // Unknown or absent role strings fall back to the empty-capability role.
    let system_role = bag
        .get(SYSTEM_ROLE_CLAIM)
        .and_then(|v| v.as_str())
        .map(SystemRole::from_claim)
        .unwrap_or(SystemRole::User);

    Ok(AuthContext {
        user_id: Some(user_id),
        email: Some(email),
        system_role,
        is_authenticated: true,
        issued_at: Some(issued_at),
        expires_at: Some(expires_at),
    })
}

fn require_string<'a>(
    bag: &'a serde_json::Map<String, Value>,
    name: &'static str,
) -> Result<&'a str, ClaimsError> {
    match bag.get(name) {
        None | Some(Value::Null) => Err(ClaimsError::MissingClaim(name)),
        Some(Value::String(s)) if !s.is_empty() => Ok(s),
        Some(_) => Err(ClaimsError::InvalidClaim {
            name,
            reason: "expected a non-empty string".to_string(),
        }),
    }
}

/// Accepts numeric epoch seconds or an ISO-8601 string, normalized to epoch.
fn epoch_seconds(
    bag: &serde_json::Map<String, Value>,
    name: &'static str,
) -> Result<i64, ClaimsError> {
    match bag.get(name) {
        None | Some(Value::Null) => Err(ClaimsError::MissingClaim(name)),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .ok_or(ClaimsError::InvalidClaim {
                name,
                reason: "numeric timestamp out of range".to_string(),
            }),
        Some(Value::String(s)) => s
            .parse::<DateTime<Utc>>()
            .map(|dt| dt.timestamp())
            .map_err(|e| ClaimsError::InvalidClaim {
                name,
                reason: e.to_string(),
            }),
        Some(_) => Err(ClaimsError::InvalidClaim {
            name,
            reason: "expected epoch seconds or ISO-8601 string".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_bag(now: DateTime<Utc>) -> Value {
        json!({
            "sub": Uuid::new_v4().to_string(),
            "email": "rider@example.com",
            "iat": now.timestamp(),
            "exp": now.timestamp() + 3600,
            "custom:system_role": "site_admin",
        })
    }

    #[test]
    fn absent_claims_yield_anonymous_context() {
        let ctx = extract_auth_context(None, Utc::now()).unwrap();
        assert!(!ctx.is_authenticated);
        assert!(ctx.user_id.is_none());
        assert_eq!(ctx.system_role, SystemRole::User);
    }

    #[test]
    fn valid_claims_build_authenticated_context() {
        let now = Utc::now();
        let ctx = extract_auth_context(Some(&valid_bag(now)), now).unwrap();
        assert!(ctx.is_authenticated);
        assert!(ctx.user_id.is_some());
        assert_eq!(ctx.email.as_deref(), Some("rider@example.com"));
        assert_eq!(ctx.system_role, SystemRole::SiteAdmin);
        assert_eq!(ctx.expires_at, Some(now.timestamp() + 3600));
    }

    #[test]
    fn missing_sub_fails_closed() {
        let now = Utc::now();
        let mut bag = valid_bag(now);
        bag.as_object_mut().unwrap().remove("sub");
        let err = extract_auth_context(Some(&bag), now).unwrap_err();
        assert!(matches!(err, ClaimsError::MissingClaim("sub")));
    }

    #[test]
    fn missing_email_fails_closed() {
        let now = Utc::now();
        let mut bag = valid_bag(now);
        bag.as_object_mut().unwrap().remove("email");
        let err = extract_auth_context(Some(&bag), now).unwrap_err();
        assert!(matches!(err, ClaimsError::MissingClaim("email")));
    }

    #[test]
    fn non_uuid_subject_is_invalid() {
        let now = Utc::now();
        let mut bag = valid_bag(now);
        bag["sub"] = json!("not-a-uuid");
        let err = extract_auth_context(Some(&bag), now).unwrap_err();
        assert!(matches!(err, ClaimsError::InvalidClaim { name: "sub", .. }));
    }

    #[test]
    fn expired_token_is_rejected() {
        let now = Utc::now();
        let mut bag = valid_bag(now);
        bag["exp"] = json!(now.timestamp() - 10);
        let err = extract_auth_context(Some(&bag), now).unwrap_err();
        assert!(matches!(err, ClaimsError::ExpiredToken { .. }));
    }

    #[test]
    fn iso_8601_timestamps_are_normalized() {
        let now = Utc::now();
        let exp = now + chrono::Duration::hours(1);
        let bag = json!({
            "sub": Uuid::new_v4().to_string(),
            "email": "rider@example.com",
            "iat": now.to_rfc3339(),
            "exp": exp.to_rfc3339(),
        });
        let ctx = extract_auth_context(Some(&bag), now).unwrap();
        assert_eq!(ctx.issued_at, Some(now.timestamp()));
        assert_eq!(ctx.expires_at, Some(exp.timestamp()));
    }

    #[test]
    fn unknown_role_resolves_to_user() {
        let now = Utc::now();
        let mut bag = valid_bag(now);
        bag["custom:system_role"] = json!("galactic_overlord");
        let ctx = extract_auth_context(Some(&bag), now).unwrap();
        assert_eq!(ctx.system_role, SystemRole::User);
    }
}
