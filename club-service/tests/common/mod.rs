//! Shared harness for router-level tests: an app over a fresh in-memory
//! table, driven through `tower::ServiceExt::oneshot` with gateway-style
//! claims headers.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use club_service::config::ClubConfig;
use club_service::store::InMemoryTable;
use club_service::{build_router, AppState};

/// A test user identity, rendered into the verified-claims header.
#[derive(Clone)]
pub struct TestUser {
    pub user_id: Uuid,
    pub email: String,
    pub system_role: &'static str,
}

impl TestUser {
    pub fn member(email: &str) -> Self {
        Self {
            user_id: Uuid::new_v4(),
            email: email.to_string(),
            system_role: "user",
        }
    }

    pub fn site_admin() -> Self {
        Self {
            user_id: Uuid::new_v4(),
            email: "admin@platform.example".to_string(),
            system_role: "site_admin",
        }
    }

    pub fn claims(&self) -> String {
        let now = chrono::Utc::now().timestamp();
        json!({
            "sub": self.user_id.to_string(),
            "email": self.email,
            "iat": now,
            "exp": now + 3600,
            "custom:system_role": self.system_role,
        })
        .to_string()
    }
}

pub struct TestApp {
    pub router: Router,
}

pub fn test_app() -> TestApp {
    test_app_with_store(Arc::new(InMemoryTable::new()))
}

/// Build an app over a caller-owned store, for tests that seed rows the API
/// cannot produce (e.g. already-expired invitations).
pub fn test_app_with_store(store: Arc<dyn club_service::store::TableStore>) -> TestApp {
    let state = AppState::new(ClubConfig::for_tests(), store);
    TestApp {
        router: build_router(state),
    }
}

impl TestApp {
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        user: Option<&TestUser>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header("x-verified-claims", user.claims());
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, user: Option<&TestUser>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, user, None).await
    }

    pub async fn post(
        &self,
        uri: &str,
        user: Option<&TestUser>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        self.request(Method::POST, uri, user, body).await
    }

    pub async fn patch(
        &self,
        uri: &str,
        user: Option<&TestUser>,
        body: Value,
    ) -> (StatusCode, Value) {
        self.request(Method::PATCH, uri, user, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, user: Option<&TestUser>) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, user, None).await
    }

    /// Create a club owned by `owner` and return its id.
    pub async fn create_club(&self, owner: &TestUser, name: &str) -> Uuid {
        let (status, body) = self
            .post("/clubs", Some(owner), Some(json!({ "name": name })))
            .await;
        assert_eq!(status, StatusCode::CREATED, "club creation failed: {body}");
        Uuid::parse_str(body["club_id"].as_str().unwrap()).unwrap()
    }

    /// Invite `invitee` and accept the invitation, yielding an active member.
    pub async fn add_member(&self, inviter: &TestUser, club_id: Uuid, invitee: &TestUser) {
        let (status, body) = self
            .post(
                &format!("/clubs/{club_id}/invitations"),
                Some(inviter),
                Some(json!({
                    "email": invitee.email,
                    "invited_user_id": invitee.user_id,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "invitation failed: {body}");
        let token = body["token"].as_str().unwrap().to_string();

        let (status, body) = self
            .post(
                "/invitations/accept",
                Some(invitee),
                Some(json!({ "token": token })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "acceptance failed: {body}");
    }

    /// Promote an active member to club admin.
    pub async fn promote_to_admin(&self, owner: &TestUser, club_id: Uuid, member: &TestUser) {
        let (status, body) = self
            .post(
                &format!("/clubs/{club_id}/memberships/{}/role", member.user_id),
                Some(owner),
                Some(json!({ "role": "admin" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "promotion failed: {body}");
    }
}

/// The machine-readable error code from an error envelope.
pub fn error_code(body: &Value) -> &str {
    body["error"].as_str().unwrap_or("")
}
