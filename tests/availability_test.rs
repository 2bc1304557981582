//! Ledger arithmetic end-to-end: offered-item availability, pool
//! exclusion, and the concrete 10/3/7 drawdown scenario.

mod common;

use axum::http::Method;
use common::TestApp;
use serde_json::{json, Value};

/// Seed an offer with one item and return the item id.
async fn seed_offer_item(app: &TestApp, token: &str, brand: &str, amount: i32) -> i64 {
    let created = TestApp::expect_data(
        app.request(
            Method::POST,
            "/api/v1/offers",
            Some(json!({
                "description": format!("{brand} donation"),
                "items": [{
                    "item_type": "hardware",
                    "brand": brand,
                    "model": "M1",
                    "amount": amount,
                }],
            })),
            Some(token),
        )
        .await,
    )
    .await;
    let offer_id = created["id"].as_i64().expect("offer id");

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
    detail["items"][0]["id"].as_i64().expect("item id")
}

async fn seed_location(app: &TestApp, token: &str, name: &str) -> i64 {
    let created = TestApp::expect_data(
        app.request(
            Method::POST,
            "/api/v1/locations",
            Some(json!({ "name": name, "kind": "warehouse" })),
            Some(token),
        )
        .await,
    )
    .await;
    created["id"].as_i64().expect("location id")
}

async fn availability(app: &TestApp, token: &str, item_id: i64) -> i64 {
    let data = TestApp::expect_data(
        app.request(
            Method::GET,
            &format!("/api/v1/items/{item_id}/availability"),
            None,
            Some(token),
        )
        .await,
    )
    .await;
    data["available"].as_i64().expect("available")
}

#[tokio::test]
async fn zero_shipped_item_has_full_availability() {
    let app = TestApp::new().await;
    let staff = app.seed_staff().await;

    let item_id = seed_offer_item(&app, &staff.token, "Cisco", 10).await;
    assert_eq!(availability(&app, &staff.token, item_id).await, 10);

    let pool = TestApp::expect_data(
        app.request(
            Method::GET,
            "/api/v1/items/intake-pool",
            None,
            Some(&staff.token),
        )
        .await,
    )
    .await;
    let entry = pool
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["offered_item_id"].as_i64() == Some(item_id))
        .expect("item in intake pool");
    assert_eq!(entry["available"].as_i64(), Some(10));
    assert_eq!(entry["shipped"].as_i64(), Some(0));
}

#[tokio::test]
async fn drawdown_scenario_ten_three_seven() {
    let app = TestApp::new().await;
    let staff = app.seed_staff().await;

    let warehouse = seed_location(&app, &staff.token, "Berlin warehouse").await;
    let site = seed_location(&app, &staff.token, "Kyiv site").await;
    let item_id = seed_offer_item(&app, &staff.token, "Juniper", 10).await;

    // Prior root dispatch of 3 (parked, no shipment).
    let root = TestApp::expect_data(
        app.request(
            Method::POST,
            "/api/v1/items/intake",
            Some(json!({
                "offer_item_id": item_id,
                "amount": 3,
                "location_id": warehouse,
            })),
            Some(&staff.token),
        )
        .await,
    )
    .await;
    assert_eq!(root["parent_shipment_item"], Value::Null);
    assert_eq!(availability(&app, &staff.token, item_id).await, 7);

    // Assign the remaining 7 directly onto shipment X.
    let shipment = TestApp::expect_data(
        app.request(
            Method::POST,
            "/api/v1/shipments",
            Some(json!({
                "name": "Shipment X",
                "from_location_id": warehouse,
                "to_location_id": site,
            })),
            Some(&staff.token),
        )
        .await,
    )
    .await;
    let shipment_id = shipment["id"].as_i64().unwrap();

    TestApp::expect_data(
        app.request(
            Method::POST,
            "/api/v1/items/intake",
            Some(json!({
                "offer_item_id": item_id,
                "amount": 7,
                "shipment_id": shipment_id,
            })),
            Some(&staff.token),
        )
        .await,
    )
    .await;

    assert_eq!(availability(&app, &staff.token, item_id).await, 0);

    // Fully drawn down: gone from the intake pool.
    let pool = TestApp::expect_data(
        app.request(
            Method::GET,
            "/api/v1/items/intake-pool",
            None,
            Some(&staff.token),
        )
        .await,
    )
    .await;
    assert!(pool
        .as_array()
        .unwrap()
        .iter()
        .all(|e| e["offered_item_id"].as_i64() != Some(item_id)));
}

#[tokio::test]
async fn over_draw_is_rejected_with_conflict() {
    let app = TestApp::new().await;
    let staff = app.seed_staff().await;

    let warehouse = seed_location(&app, &staff.token, "Warsaw warehouse").await;
    let item_id = seed_offer_item(&app, &staff.token, "APC", 5).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/items/intake",
            Some(json!({
                "offer_item_id": item_id,
                "amount": 6,
                "location_id": warehouse,
            })),
            Some(&staff.token),
        )
        .await;
    assert_eq!(response.status(), axum::http::StatusCode::CONFLICT);

    // Nothing was written.
    assert_eq!(availability(&app, &staff.token, item_id).await, 5);
}

#[tokio::test]
async fn ledger_rows_with_positive_availability_form_the_pool() {
    let app = TestApp::new().await;
    let staff = app.seed_staff().await;

    let warehouse = seed_location(&app, &staff.token, "Riga warehouse").await;
    let item_id = seed_offer_item(&app, &staff.token, "Dell", 4).await;

    let root = TestApp::expect_data(
        app.request(
            Method::POST,
            "/api/v1/items/intake",
            Some(json!({
                "offer_item_id": item_id,
                "amount": 4,
                "location_id": warehouse,
            })),
            Some(&staff.token),
        )
        .await,
    )
    .await;
    let root_id = root["id"].as_i64().unwrap();

    let pool = TestApp::expect_data(
        app.request(Method::GET, "/api/v1/items", None, Some(&staff.token)).await,
    )
    .await;
    let entry = pool
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["id"].as_i64() == Some(root_id))
        .expect("root row in pool");
    assert_eq!(entry["available"].as_i64(), Some(4));
    assert_eq!(entry["sent"].as_i64(), Some(0));
    assert_eq!(entry["last_location_id"].as_i64(), Some(warehouse));
}
