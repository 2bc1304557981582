//! The two-phase assignment workflow: selection validation, target
//! restriction, commit lineage and the in-transaction availability guard.

mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::{json, Value};

struct Fixture {
    staff_token: String,
    warehouse: i64,
    site: i64,
}

async fn setup(app: &TestApp) -> Fixture {
    let staff = app.seed_staff().await;
    let warehouse = create_location(app, &staff.token, "Hamburg warehouse").await;
    let site = create_location(app, &staff.token, "Lviv site").await;
    Fixture {
        staff_token: staff.token,
        warehouse,
        site,
    }
}

async fn create_location(app: &TestApp, token: &str, name: &str) -> i64 {
    TestApp::expect_data(
        app.request(
            Method::POST,
            "/api/v1/locations",
            Some(json!({ "name": name, "kind": "warehouse" })),
            Some(token),
        )
        .await,
    )
    .await["id"]
        .as_i64()
        .unwrap()
}

async fn create_shipment(app: &TestApp, token: &str, name: &str, from: i64, to: i64) -> i64 {
    TestApp::expect_data(
        app.request(
            Method::POST,
            "/api/v1/shipments",
            Some(json!({
                "name": name,
                "from_location_id": from,
                "to_location_id": to,
            })),
            Some(token),
        )
        .await,
    )
    .await["id"]
        .as_i64()
        .unwrap()
}

/// Offer + item + parked root ledger row at `location`; returns the
/// ledger row id.
async fn seed_parked_row(
    app: &TestApp,
    token: &str,
    brand: &str,
    amount: i32,
    location: i64,
) -> i64 {
    let offer = TestApp::expect_data(
        app.request(
            Method::POST,
            "/api/v1/offers",
            Some(json!({
                "description": format!("{brand} batch"),
                "items": [{"item_type": "hardware", "brand": brand, "model": "M", "amount": amount}],
            })),
            Some(token),
        )
        .await,
    )
    .await;
    let offer_id = offer["id"].as_i64().unwrap();
    let detail = TestApp::expect_data(
        app.request(
            Method::GET,
            &format!("/api/v1/offers/{offer_id}"),
            None,
            Some(token),
        )
        .await,
    )
    .await;
    let item_id = detail["items"][0]["id"].as_i64().unwrap();

    TestApp::expect_data(
        app.request(
            Method::POST,
            "/api/v1/items/intake",
            Some(json!({
                "offer_item_id": item_id,
                "amount": amount,
                "location_id": location,
            })),
            Some(token),
        )
        .await,
    )
    .await["id"]
        .as_i64()
        .unwrap()
}

#[tokio::test]
async fn selection_spanning_two_locations_is_rejected() {
    let app = TestApp::new().await;
    let fx = setup(&app).await;

    let row_a = seed_parked_row(&app, &fx.staff_token, "Cisco", 5, fx.warehouse).await;
    let row_b = seed_parked_row(&app, &fx.staff_token, "HP", 5, fx.site).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/items/assignments/validate",
            Some(json!({ "item_ids": [row_a, row_b] })),
            Some(&fx.staff_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = TestApp::json_body(response).await;
    let details: Vec<String> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect();
    assert!(details
        .iter()
        .any(|m| m == "Chosen items are in different locations."));
}

#[tokio::test]
async fn selection_on_undelivered_shipment_is_rejected() {
    let app = TestApp::new().await;
    let fx = setup(&app).await;

    let shipment = create_shipment(
        &app,
        &fx.staff_token,
        "In transit",
        fx.warehouse,
        fx.site,
    )
    .await;

    // Park a row and move it onto the (undelivered) shipment.
    let row = seed_parked_row(&app, &fx.staff_token, "Lenovo", 6, fx.warehouse).await;
    let moved = TestApp::expect_data(
        app.request(
            Method::POST,
            "/api/v1/items/assignments",
            Some(json!({
                "shipment_id": shipment,
                "items": [{"item_id": row, "amount": 6}],
            })),
            Some(&fx.staff_token),
        )
        .await,
    )
    .await;
    let moved_row = moved[0]["id"].as_i64().unwrap();

    // The child row sits on an undelivered shipment; re-shipping it must
    // be rejected.
    let response = app
        .request(
            Method::POST,
            "/api/v1/items/assignments/validate",
            Some(json!({ "item_ids": [moved_row] })),
            Some(&fx.staff_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = TestApp::json_body(response).await;
    let details: Vec<String> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect();
    assert!(details
        .iter()
        .any(|m| m == "Some of items are not delivered yet or attached to another shipment."));
}

#[tokio::test]
async fn validation_returns_shipments_departing_from_shared_location() {
    let app = TestApp::new().await;
    let fx = setup(&app).await;

    let from_here = create_shipment(&app, &fx.staff_token, "Right", fx.warehouse, fx.site).await;
    let from_elsewhere = create_shipment(&app, &fx.staff_token, "Wrong", fx.site, fx.warehouse).await;

    let row = seed_parked_row(&app, &fx.staff_token, "Zyxel", 3, fx.warehouse).await;

    let data = TestApp::expect_data(
        app.request(
            Method::POST,
            "/api/v1/items/assignments/validate",
            Some(json!({ "item_ids": [row] })),
            Some(&fx.staff_token),
        )
        .await,
    )
    .await;

    assert_eq!(data["last_location_id"].as_i64(), Some(fx.warehouse));
    let eligible: Vec<i64> = data["eligible_shipments"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_i64().unwrap())
        .collect();
    assert!(eligible.contains(&from_here));
    assert!(!eligible.contains(&from_elsewhere));
}

#[tokio::test]
async fn commit_creates_child_rows_with_lineage_and_reduces_availability() {
    let app = TestApp::new().await;
    let fx = setup(&app).await;

    let shipment = create_shipment(&app, &fx.staff_token, "Leg 1", fx.warehouse, fx.site).await;
    let row = seed_parked_row(&app, &fx.staff_token, "Ubiquiti", 10, fx.warehouse).await;

    let created = TestApp::expect_data(
        app.request(
            Method::POST,
            "/api/v1/items/assignments",
            Some(json!({
                "shipment_id": shipment,
                "items": [{"item_id": row, "amount": 4}],
            })),
            Some(&fx.staff_token),
        )
        .await,
    )
    .await;

    assert_eq!(created.as_array().unwrap().len(), 1);
    let child = &created[0];
    assert_eq!(child["parent_shipment_item"].as_i64(), Some(row));
    assert_eq!(child["shipment_id"].as_i64(), Some(shipment));
    assert_eq!(child["last_location_id"].as_i64(), Some(fx.warehouse));

    // The parent keeps 6 of 10 in the pool.
    let pool = TestApp::expect_data(
        app.request(Method::GET, "/api/v1/items", None, Some(&fx.staff_token))
            .await,
    )
    .await;
    let parent_entry = pool
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["id"].as_i64() == Some(row))
        .expect("parent still in pool");
    assert_eq!(parent_entry["available"].as_i64(), Some(6));
    assert_eq!(parent_entry["sent"].as_i64(), Some(4));
}

#[tokio::test]
async fn commit_rejects_amounts_exceeding_row_availability() {
    let app = TestApp::new().await;
    let fx = setup(&app).await;

    let shipment = create_shipment(&app, &fx.staff_token, "Leg 1", fx.warehouse, fx.site).await;
    let row = seed_parked_row(&app, &fx.staff_token, "Netgear", 3, fx.warehouse).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/items/assignments",
            Some(json!({
                "shipment_id": shipment,
                "items": [{"item_id": row, "amount": 5}],
            })),
            Some(&fx.staff_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // The rejected batch left no rows behind.
    let pool = TestApp::expect_data(
        app.request(Method::GET, "/api/v1/items", None, Some(&fx.staff_token))
            .await,
    )
    .await;
    let entry = pool
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["id"].as_i64() == Some(row))
        .expect("row untouched");
    assert_eq!(entry["available"].as_i64(), Some(3));
}

#[tokio::test]
async fn commit_rejects_target_departing_elsewhere() {
    let app = TestApp::new().await;
    let fx = setup(&app).await;

    let wrong_way = create_shipment(&app, &fx.staff_token, "Backhaul", fx.site, fx.warehouse).await;
    let row = seed_parked_row(&app, &fx.staff_token, "Aruba", 2, fx.warehouse).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/items/assignments",
            Some(json!({
                "shipment_id": wrong_way,
                "items": [{"item_id": row, "amount": 2}],
            })),
            Some(&fx.staff_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn delivered_rows_can_be_reshipped() {
    let app = TestApp::new().await;
    let fx = setup(&app).await;

    let leg1 = create_shipment(&app, &fx.staff_token, "Leg 1", fx.warehouse, fx.site).await;
    let row = seed_parked_row(&app, &fx.staff_token, "Mikrotik", 8, fx.warehouse).await;

    let moved = TestApp::expect_data(
        app.request(
            Method::POST,
            "/api/v1/items/assignments",
            Some(json!({
                "shipment_id": leg1,
                "items": [{"item_id": row, "amount": 8}],
            })),
            Some(&fx.staff_token),
        )
        .await,
    )
    .await;
    let child = moved[0]["id"].as_i64().unwrap();

    // Deliver leg 1; the child row lands at the site and becomes
    // re-shippable from there.
    TestApp::expect_data(
        app.request(
            Method::POST,
            &format!("/api/v1/shipments/{leg1}/deliver"),
            Some(json!({})),
            Some(&fx.staff_token),
        )
        .await,
    )
    .await;

    // Leg 2 departs from the warehouse (the child's last_location), so
    // the delivered child validates cleanly.
    let data = TestApp::expect_data(
        app.request(
            Method::POST,
            "/api/v1/items/assignments/validate",
            Some(json!({ "item_ids": [child] })),
            Some(&fx.staff_token),
        )
        .await,
    )
    .await;
    assert_eq!(data["last_location_id"].as_i64(), Some(fx.warehouse));
}
