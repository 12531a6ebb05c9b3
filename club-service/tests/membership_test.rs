mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{error_code, test_app, TestUser};

#[tokio::test]
async fn join_request_creates_pending_membership() {
    let app = test_app();
    let owner = TestUser::member("owner@example.com");
    let rider = TestUser::member("rider@example.com");
    let club_id = app.create_club(&owner, "Harbour Riders").await;

    let (status, body) = app
        .post(&format!("/clubs/{club_id}/memberships"), Some(&rider), None)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["role"], "member");
}

#[tokio::test]
async fn duplicate_join_request_conflicts() {
    let app = test_app();
    let owner = TestUser::member("owner@example.com");
    let rider = TestUser::member("rider@example.com");
    let club_id = app.create_club(&owner, "Harbour Riders").await;

    app.post(&format!("/clubs/{club_id}/memberships"), Some(&rider), None)
        .await;
    let (status, body) = app
        .post(&format!("/clubs/{club_id}/memberships"), Some(&rider), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "ALREADY_MEMBER");
}

#[tokio::test]
async fn owner_approves_pending_member() {
    let app = test_app();
    let owner = TestUser::member("owner@example.com");
    let rider = TestUser::member("rider@example.com");
    let club_id = app.create_club(&owner, "Harbour Riders").await;
    app.post(&format!("/clubs/{club_id}/memberships"), Some(&rider), None)
        .await;

    let (status, body) = app
        .post(
            &format!("/clubs/{club_id}/memberships/{}/status", rider.user_id),
            Some(&owner),
            Some(json!({ "status": "active" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "active");
}

#[tokio::test]
async fn pending_member_cannot_see_member_list() {
    let app = test_app();
    let owner = TestUser::member("owner@example.com");
    let rider = TestUser::member("rider@example.com");
    let club_id = app.create_club(&owner, "Harbour Riders").await;
    app.post(&format!("/clubs/{club_id}/memberships"), Some(&rider), None)
        .await;

    // Club internals stay hidden: same shape as a nonexistent club.
    let (status, body) = app
        .get(&format!("/clubs/{club_id}/memberships"), Some(&rider))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "CLUB_NOT_FOUND");
}

#[tokio::test]
async fn active_member_sees_member_list() {
    let app = test_app();
    let owner = TestUser::member("owner@example.com");
    let member = TestUser::member("member@example.com");
    let club_id = app.create_club(&owner, "Harbour Riders").await;
    app.add_member(&owner, club_id, &member).await;

    let (status, body) = app
        .get(&format!("/clubs/{club_id}/memberships"), Some(&member))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn site_admin_sees_member_list_without_membership() {
    let app = test_app();
    let owner = TestUser::member("owner@example.com");
    let club_id = app.create_club(&owner, "Harbour Riders").await;

    let admin = TestUser::site_admin();
    let (status, _) = app
        .get(&format!("/clubs/{club_id}/memberships"), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn member_can_be_suspended_and_reinstated() {
    let app = test_app();
    let owner = TestUser::member("owner@example.com");
    let member = TestUser::member("member@example.com");
    let club_id = app.create_club(&owner, "Harbour Riders").await;
    app.add_member(&owner, club_id, &member).await;

    let uri = format!("/clubs/{club_id}/memberships/{}/status", member.user_id);
    let (status, body) = app
        .post(&uri, Some(&owner), Some(json!({ "status": "suspended" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "suspended");

    let (status, body) = app
        .post(&uri, Some(&owner), Some(json!({ "status": "active" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "active");
}

#[tokio::test]
async fn suspended_member_loses_access() {
    let app = test_app();
    let owner = TestUser::member("owner@example.com");
    let member = TestUser::member("member@example.com");
    let club_id = app.create_club(&owner, "Harbour Riders").await;
    app.add_member(&owner, club_id, &member).await;

    app.post(
        &format!("/clubs/{club_id}/memberships/{}/status", member.user_id),
        Some(&owner),
        Some(json!({ "status": "suspended" })),
    )
    .await;

    let (status, _) = app
        .get(&format!("/clubs/{club_id}/memberships"), Some(&member))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn removed_member_can_rejoin() {
    let app = test_app();
    let owner = TestUser::member("owner@example.com");
    let member = TestUser::member("member@example.com");
    let club_id = app.create_club(&owner, "Harbour Riders").await;
    app.add_member(&owner, club_id, &member).await;

    let (status, _) = app
        .post(
            &format!("/clubs/{club_id}/memberships/{}/status", member.user_id),
            Some(&owner),
            Some(json!({ "status": "removed" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .post(&format!("/clubs/{club_id}/memberships"), Some(&member), None)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "pending");
}

#[tokio::test]
async fn owner_cannot_be_removed() {
    let app = test_app();
    let owner = TestUser::member("owner@example.com");
    let member = TestUser::member("member@example.com");
    let club_id = app.create_club(&owner, "Harbour Riders").await;
    app.add_member(&owner, club_id, &member).await;
    app.promote_to_admin(&owner, club_id, &member).await;

    let (status, body) = app
        .post(
            &format!("/clubs/{club_id}/memberships/{}/status", owner.user_id),
            Some(&member),
            Some(json!({ "status": "removed" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "CANNOT_REMOVE_OWNER");
}

#[tokio::test]
async fn owner_cannot_leave_without_transfer() {
    let app = test_app();
    let owner = TestUser::member("owner@example.com");
    let club_id = app.create_club(&owner, "Harbour Riders").await;

    let (status, body) = app
        .delete(&format!("/clubs/{club_id}/memberships/me"), Some(&owner))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "CANNOT_REMOVE_OWNER");
}

#[tokio::test]
async fn member_can_leave() {
    let app = test_app();
    let owner = TestUser::member("owner@example.com");
    let member = TestUser::member("member@example.com");
    let club_id = app.create_club(&owner, "Harbour Riders").await;
    app.add_member(&owner, club_id, &member).await;

    let (status, _) = app
        .delete(&format!("/clubs/{club_id}/memberships/me"), Some(&member))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .get(&format!("/clubs/{club_id}/memberships"), Some(&member))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn role_changes_between_member_and_admin_only() {
    let app = test_app();
    let owner = TestUser::member("owner@example.com");
    let member = TestUser::member("member@example.com");
    let club_id = app.create_club(&owner, "Harbour Riders").await;
    app.add_member(&owner, club_id, &member).await;

    let uri = format!("/clubs/{club_id}/memberships/{}/role", member.user_id);
    let (status, body) = app
        .post(&uri, Some(&owner), Some(json!({ "role": "admin" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "admin");

    // Ownership is never granted through a role change.
    let (status, body) = app
        .post(&uri, Some(&owner), Some(json!({ "role": "owner" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "INVALID_ROLE_TRANSITION");

    let (status, body) = app
        .post(&uri, Some(&owner), Some(json!({ "role": "member" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "member");
}

#[tokio::test]
async fn ownership_transfer_swaps_roles() {
    let app = test_app();
    let owner = TestUser::member("owner@example.com");
    let member = TestUser::member("member@example.com");
    let club_id = app.create_club(&owner, "Harbour Riders").await;
    app.add_member(&owner, club_id, &member).await;

    let (status, body) = app
        .post(
            &format!("/clubs/{club_id}/ownership"),
            Some(&owner),
            Some(json!({ "new_owner_user_id": member.user_id })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "owner");
    assert_eq!(body["user_id"], member.user_id.to_string());

    let (_, club) = app.get(&format!("/clubs/{club_id}"), None).await;
    assert_eq!(club["owner_user_id"], member.user_id.to_string());

    // The previous owner is now a removable admin.
    let (_, members) = app
        .get(&format!("/clubs/{club_id}/memberships"), Some(&member))
        .await;
    let old = members["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|m| m["user_id"] == owner.user_id.to_string())
        .unwrap();
    assert_eq!(old["role"], "admin");
}

#[tokio::test]
async fn transfer_requires_active_target() {
    let app = test_app();
    let owner = TestUser::member("owner@example.com");
    let rider = TestUser::member("rider@example.com");
    let club_id = app.create_club(&owner, "Harbour Riders").await;
    app.post(&format!("/clubs/{club_id}/memberships"), Some(&rider), None)
        .await;

    let (status, body) = app
        .post(
            &format!("/clubs/{club_id}/ownership"),
            Some(&owner),
            Some(json!({ "new_owner_user_id": rider.user_id })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "OWNERSHIP_TRANSFER_TARGET_INACTIVE");
}

#[tokio::test]
async fn non_owner_cannot_transfer_ownership() {
    let app = test_app();
    let owner = TestUser::member("owner@example.com");
    let member = TestUser::member("member@example.com");
    let club_id = app.create_club(&owner, "Harbour Riders").await;
    app.add_member(&owner, club_id, &member).await;
    app.promote_to_admin(&owner, club_id, &member).await;

    let (status, body) = app
        .post(
            &format!("/clubs/{club_id}/ownership"),
            Some(&member),
            Some(json!({ "new_owner_user_id": member.user_id })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "INSUFFICIENT_PRIVILEGES");
}

#[tokio::test]
async fn my_memberships_lists_all_clubs() {
    let app = test_app();
    let owner = TestUser::member("owner@example.com");
    let member = TestUser::member("member@example.com");
    let first = app.create_club(&owner, "First Club").await;
    let second = app.create_club(&owner, "Second Club").await;
    app.add_member(&owner, first, &member).await;
    app.add_member(&owner, second, &member).await;

    let (status, body) = app.get("/me/memberships", Some(&member)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
}
