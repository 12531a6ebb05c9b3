mod common;

use axum::http::StatusCode;
use std::collections::HashSet;

use common::{error_code, test_app, TestUser};

#[tokio::test]
async fn club_listing_pages_without_overlap_or_gaps() {
    let app = test_app();
    let owner = TestUser::member("owner@example.com");
    for i in 0..7 {
        app.create_club(&owner, &format!("Club Number {i}")).await;
    }

    let mut seen: HashSet<String> = HashSet::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0;

    loop {
        let uri = match &cursor {
            Some(c) => format!("/clubs?limit=3&cursor={c}"),
            None => "/clubs?limit=3".to_string(),
        };
        let (status, body) = app.get(&uri, None).await;
        assert_eq!(status, StatusCode::OK);
        pages += 1;

        for club in body["items"].as_array().unwrap() {
            let id = club["club_id"].as_str().unwrap().to_string();
            assert!(seen.insert(id), "club appeared on two pages");
        }

        match body["next_cursor"].as_str() {
            Some(next) => {
                assert_eq!(body["has_more"], true);
                cursor = Some(next.to_string());
            }
            None => {
                assert_eq!(body["has_more"], false);
                break;
            }
        }
    }

    assert_eq!(seen.len(), 7);
    assert_eq!(pages, 3);
}

#[tokio::test]
async fn exact_page_boundary_reports_no_more() {
    let app = test_app();
    let owner = TestUser::member("owner@example.com");
    for i in 0..3 {
        app.create_club(&owner, &format!("Boundary Club {i}")).await;
    }

    let (_, body) = app.get("/clubs?limit=3", None).await;
    assert_eq!(body["items"].as_array().unwrap().len(), 3);
    assert_eq!(body["has_more"], false);
    assert!(body["next_cursor"].is_null());
}

#[tokio::test]
async fn garbage_cursor_is_a_bad_request() {
    let app = test_app();
    let (status, body) = app.get("/clubs?cursor=%21%21not-a-cursor", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "INVALID_CURSOR");
}

#[tokio::test]
async fn cursor_from_another_listing_is_rejected() {
    let app = test_app();
    let owner = TestUser::member("owner@example.com");
    let member = TestUser::member("member@example.com");
    let club_id = app.create_club(&owner, "Harbour Riders").await;
    app.add_member(&owner, club_id, &member).await;

    // A member-listing cursor resumes in the club partition, not the
    // discovery partition; using it against /clubs must fail loudly.
    let (_, body) = app
        .get(
            &format!("/clubs/{club_id}/memberships?limit=1"),
            Some(&owner),
        )
        .await;
    let foreign = body["next_cursor"].as_str().unwrap().to_string();

    let (status, body) = app.get(&format!("/clubs?cursor={foreign}"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "INVALID_CURSOR");
}

#[tokio::test]
async fn member_listing_pages_in_stable_order() {
    let app = test_app();
    let owner = TestUser::member("owner@example.com");
    let club_id = app.create_club(&owner, "Harbour Riders").await;
    for i in 0..4 {
        let member = TestUser::member(&format!("member{i}@example.com"));
        app.add_member(&owner, club_id, &member).await;
    }

    let (_, first) = app
        .get(&format!("/clubs/{club_id}/memberships?limit=2"), Some(&owner))
        .await;
    assert_eq!(first["items"].as_array().unwrap().len(), 2);
    assert_eq!(first["has_more"], true);

    let cursor = first["next_cursor"].as_str().unwrap();
    let (_, second) = app
        .get(
            &format!("/clubs/{club_id}/memberships?limit=10&cursor={cursor}"),
            Some(&owner),
        )
        .await;
    assert_eq!(second["items"].as_array().unwrap().len(), 3);
    assert_eq!(second["has_more"], false);

    let first_ids: HashSet<_> = first["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["user_id"].as_str().unwrap().to_string())
        .collect();
    for m in second["items"].as_array().unwrap() {
        assert!(!first_ids.contains(m["user_id"].as_str().unwrap()));
    }
}

#[tokio::test]
async fn limit_is_clamped_to_configured_maximum() {
    let app = test_app();
    let owner = TestUser::member("owner@example.com");
    app.create_club(&owner, "Only Club").await;

    // Far beyond max_page_size; must not error, just clamp.
    let (status, body) = app.get("/clubs?limit=100000", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
}
