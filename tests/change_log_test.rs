//! Audit-log semantics: one row per real change, none for no-op saves,
//! delete rows with an empty after snapshot.

mod common;

use axum::http::Method;
use common::TestApp;
use serde_json::{json, Value};

async fn changes(app: &TestApp, token: &str, query: &str) -> Vec<Value> {
    let data = TestApp::expect_data(
        app.request(
            Method::GET,
            &format!("/api/v1/changes{query}"),
            None,
            Some(token),
        )
        .await,
    )
    .await;
    data["items"].as_array().unwrap().clone()
}

#[tokio::test]
async fn create_update_delete_produce_exactly_one_row_each() {
    let app = TestApp::new().await;
    let staff = app.seed_staff().await;

    // Create: one add row.
    let offer = TestApp::expect_data(
        app.request(
            Method::POST,
            "/api/v1/offers",
            Some(json!({
                "description": "Rack gear",
                "items": [{"item_type": "hardware", "brand": "Cisco", "model": "2960", "amount": 2}],
            })),
            Some(&staff.token),
        )
        .await,
    )
    .await;
    let offer_id = offer["id"].as_i64().unwrap();

    let rows = changes(&app, &staff.token, "?change_type=offer").await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["action"], "add");
    assert_eq!(rows[0]["before"], "");
    assert!(rows[0]["after"].as_str().unwrap().contains("Rack gear"));
    assert_eq!(rows[0]["who"].as_i64(), Some(staff.contact.id as i64));

    // Fetch items so the no-op update can resubmit them unchanged.
    let detail = TestApp::expect_data(
        app.request(
            Method::GET,
            &format!("/api/v1/offers/{offer_id}"),
            None,
            Some(&staff.token),
        )
        .await,
    )
    .await;
    let item = &detail["items"][0];
    let unchanged_items = json!([{
        "id": item["id"],
        "item_type": item["item_type"],
        "brand": item["brand"],
        "model": item["model"],
        "amount": item["amount"],
        "notes": item["notes"],
        "received": item["received"],
        "rejected": item["rejected"],
        "claimed_by": item["claimed_by"],
    }]);

    // No-op update: no new row.
    TestApp::expect_data(
        app.request(
            Method::PUT,
            &format!("/api/v1/offers/{offer_id}"),
            Some(json!({
                "description": "Rack gear",
                "items": unchanged_items.clone(),
            })),
            Some(&staff.token),
        )
        .await,
    )
    .await;
    assert_eq!(changes(&app, &staff.token, "?change_type=offer").await.len(), 1);

    // Real update: exactly one change row.
    TestApp::expect_data(
        app.request(
            Method::PUT,
            &format!("/api/v1/offers/{offer_id}"),
            Some(json!({
                "description": "Rack gear (updated)",
                "items": unchanged_items.clone(),
            })),
            Some(&staff.token),
        )
        .await,
    )
    .await;
    let rows = changes(&app, &staff.token, "?change_type=offer&action=change").await;
    assert_eq!(rows.len(), 1);
    assert!(rows[0]["before"].as_str().unwrap().contains("Rack gear"));
    assert!(rows[0]["after"]
        .as_str()
        .unwrap()
        .contains("Rack gear (updated)"));

    // Delete: exactly one delete row with after = "".
    TestApp::expect_data(
        app.request(
            Method::DELETE,
            &format!("/api/v1/offers/{offer_id}"),
            None,
            Some(&staff.token),
        )
        .await,
    )
    .await;
    let rows = changes(&app, &staff.token, "?change_type=offer&action=delete").await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["after"], "");
    assert!(rows[0]["before"]
        .as_str()
        .unwrap()
        .contains("Rack gear (updated)"));
}

#[tokio::test]
async fn request_saves_are_logged_with_their_own_type() {
    let app = TestApp::new().await;
    let staff = app.seed_staff().await;

    let request = TestApp::expect_data(
        app.request(
            Method::POST,
            "/api/v1/requests",
            Some(json!({
                "goal": "School lab",
                "items": [{"item_type": "hardware", "brand": "Any", "model": "laptop", "amount": 20, "up_to": true}],
            })),
            Some(&staff.token),
        )
        .await,
    )
    .await;
    let request_id = request["id"].as_i64().unwrap();

    let rows = changes(&app, &staff.token, "?change_type=request").await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["action"], "add");
    assert_eq!(rows[0]["change_type"], "request");
    // The snapshot renders the up-to ceiling.
    assert!(rows[0]["after"].as_str().unwrap().contains("up to 20x"));

    TestApp::expect_data(
        app.request(
            Method::DELETE,
            &format!("/api/v1/requests/{request_id}"),
            None,
            Some(&staff.token),
        )
        .await,
    )
    .await;
    let rows = changes(&app, &staff.token, "?change_type=request&action=delete").await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["after"], "");
}

#[tokio::test]
async fn alternatives_cycle_is_rejected_at_write_time() {
    let app = TestApp::new().await;
    let staff = app.seed_staff().await;

    // Two items where the second is an alternative for the first.
    let request = TestApp::expect_data(
        app.request(
            Method::POST,
            "/api/v1/requests",
            Some(json!({
                "goal": "Routers",
                "items": [
                    {"item_type": "hardware", "brand": "Cisco", "model": "R1", "amount": 1},
                    {"item_type": "hardware", "brand": "Juniper", "model": "R2", "amount": 1},
                ],
            })),
            Some(&staff.token),
        )
        .await,
    )
    .await;
    let request_id = request["id"].as_i64().unwrap();

    let detail = TestApp::expect_data(
        app.request(
            Method::GET,
            &format!("/api/v1/requests/{request_id}"),
            None,
            Some(&staff.token),
        )
        .await,
    )
    .await;
    let first = detail["items"][0]["id"].as_i64().unwrap();
    let second = detail["items"][1]["id"].as_i64().unwrap();

    // Wiring A -> B and B -> A in one save must fail.
    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/requests/{request_id}"),
            Some(json!({
                "goal": "Routers",
                "items": [
                    {"id": first, "item_type": "hardware", "brand": "Cisco", "model": "R1",
                     "amount": 1, "alternative_for": second},
                    {"id": second, "item_type": "hardware", "brand": "Juniper", "model": "R2",
                     "amount": 1, "alternative_for": first},
                ],
            })),
            Some(&staff.token),
        )
        .await;
    assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);

    // A plain chain is accepted and rendered as an "or" line.
    TestApp::expect_data(
        app.request(
            Method::PUT,
            &format!("/api/v1/requests/{request_id}"),
            Some(json!({
                "goal": "Routers",
                "items": [
                    {"id": first, "item_type": "hardware", "brand": "Cisco", "model": "R1", "amount": 1},
                    {"id": second, "item_type": "hardware", "brand": "Juniper", "model": "R2",
                     "amount": 1, "alternative_for": first},
                ],
            })),
            Some(&staff.token),
        )
        .await,
    )
    .await;

    let detail = TestApp::expect_data(
        app.request(
            Method::GET,
            &format!("/api/v1/requests/{request_id}"),
            None,
            Some(&staff.token),
        )
        .await,
    )
    .await;
    let lines: Vec<&str> = detail["item_lines"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l.as_str().unwrap())
        .collect();
    assert_eq!(lines, vec!["1x Cisco R1 or 1x Juniper R2"]);
}
