//! The role/ownership permission matrix over the HTTP surface. Access is
//! default-deny: anything not granted below must come back 401/403.

mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use donorlift_api::entities::organisation;
use sea_orm::{EntityTrait, Set};
use serde_json::json;

async fn seed_org(app: &TestApp, name: &str) -> i32 {
    let row = organisation::Entity::insert(organisation::ActiveModel {
        name: Set(name.to_string()),
        ..Default::default()
    })
    .exec_with_returning(&*app.state.db)
    .await
    .expect("seed organisation");
    row.id
}

#[tokio::test]
async fn anonymous_requests_are_unauthorized() {
    let app = TestApp::new().await;

    for uri in [
        "/api/v1/offers",
        "/api/v1/requests",
        "/api/v1/items",
        "/api/v1/changes",
        "/api/v1/shipments",
    ] {
        let response = app.request(Method::GET, uri, None, None).await;
        assert_eq!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "expected 401 for {uri}"
        );
    }
}

#[tokio::test]
async fn logistics_surfaces_are_staff_only() {
    let app = TestApp::new().await;
    let donor = app
        .seed_user("donor@example.org", None, false, true, false)
        .await;

    for uri in [
        "/api/v1/items",
        "/api/v1/changes",
        "/api/v1/shipments",
        "/api/v1/locations",
        "/api/v1/claims",
        "/api/v1/equipment",
    ] {
        let response = app.request(Method::GET, uri, None, Some(&donor.token)).await;
        assert_eq!(
            response.status(),
            StatusCode::FORBIDDEN,
            "expected 403 for {uri}"
        );
    }
}

#[tokio::test]
async fn offered_items_are_visible_to_requesters_not_donors() {
    let app = TestApp::new().await;
    let requester = app
        .seed_user("req@example.org", None, false, false, true)
        .await;
    let donor = app
        .seed_user("donor@example.org", None, false, true, false)
        .await;

    let ok = app
        .request(Method::GET, "/api/v1/offer-items", None, Some(&requester.token))
        .await;
    assert_eq!(ok.status(), StatusCode::OK);

    let denied = app
        .request(Method::GET, "/api/v1/offer-items", None, Some(&donor.token))
        .await;
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn requested_items_are_visible_to_donors_not_requesters() {
    let app = TestApp::new().await;
    let requester = app
        .seed_user("req@example.org", None, false, false, true)
        .await;
    let donor = app
        .seed_user("donor@example.org", None, false, true, false)
        .await;

    let ok = app
        .request(Method::GET, "/api/v1/request-items", None, Some(&donor.token))
        .await;
    assert_eq!(ok.status(), StatusCode::OK);

    let denied = app
        .request(
            Method::GET,
            "/api/v1/request-items",
            None,
            Some(&requester.token),
        )
        .await;
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn offers_are_scoped_to_contact_and_organisation() {
    let app = TestApp::new().await;
    let org = seed_org(&app, "School Aid").await;

    let owner = app
        .seed_user("owner@example.org", Some(org), false, true, false)
        .await;
    let colleague = app
        .seed_user("colleague@example.org", Some(org), false, false, false)
        .await;
    let stranger = app
        .seed_user("stranger@example.org", None, false, false, false)
        .await;

    let offer = TestApp::expect_data(
        app.request(
            Method::POST,
            "/api/v1/offers",
            Some(json!({ "description": "Desks", "items": [] })),
            Some(&owner.token),
        )
        .await,
    )
    .await;
    let offer_id = offer["id"].as_i64().unwrap();

    // Owner and same-organisation colleague can read it.
    for user in [&owner, &colleague] {
        let response = app
            .request(
                Method::GET,
                &format!("/api/v1/offers/{offer_id}"),
                None,
                Some(&user.token),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    // A stranger cannot.
    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/offers/{offer_id}"),
            None,
            Some(&stranger.token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Nor can the stranger edit or delete it.
    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/offers/{offer_id}"),
            None,
            Some(&stranger.token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The list only shows the stranger their own (none).
    let listed = TestApp::expect_data(
        app.request(Method::GET, "/api/v1/offers", None, Some(&stranger.token))
            .await,
    )
    .await;
    assert_eq!(listed["total"].as_u64(), Some(0));
}

#[tokio::test]
async fn internal_notes_are_redacted_for_non_staff() {
    let app = TestApp::new().await;
    let staff = app.seed_staff().await;
    let donor = app
        .seed_user("donor@example.org", None, false, true, false)
        .await;

    let offer = TestApp::expect_data(
        app.request(
            Method::POST,
            "/api/v1/offers",
            Some(json!({
                "contact_id": donor.contact.id,
                "description": "Printers",
                "internal_notes": "verify serials before pickup",
                "items": [],
            })),
            Some(&staff.token),
        )
        .await,
    )
    .await;
    let offer_id = offer["id"].as_i64().unwrap();

    let as_staff = TestApp::expect_data(
        app.request(
            Method::GET,
            &format!("/api/v1/offers/{offer_id}"),
            None,
            Some(&staff.token),
        )
        .await,
    )
    .await;
    assert_eq!(
        as_staff["internal_notes"].as_str(),
        Some("verify serials before pickup")
    );

    let as_owner = TestApp::expect_data(
        app.request(
            Method::GET,
            &format!("/api/v1/offers/{offer_id}"),
            None,
            Some(&donor.token),
        )
        .await,
    )
    .await;
    assert!(as_owner.get("internal_notes").is_none());
}

#[tokio::test]
async fn acting_for_another_contact_requires_staff() {
    let app = TestApp::new().await;
    let donor = app
        .seed_user("donor@example.org", None, false, true, false)
        .await;
    let other = app
        .seed_user("other@example.org", None, false, true, false)
        .await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/offers",
            Some(json!({
                "contact_id": other.contact.id,
                "description": "Sneaky",
                "items": [],
            })),
            Some(&donor.token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn bulk_actions_are_staff_only() {
    let app = TestApp::new().await;
    let requester = app
        .seed_user("req@example.org", None, false, false, true)
        .await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/offer-items/set-type/hardware",
            Some(json!({ "item_ids": [1, 2] })),
            Some(&requester.token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
