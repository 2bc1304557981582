//! The CSV contracts: equipment import/export column set and upsert key,
//! per-row error reporting, and the claims report column order.

mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn equipment_import_upserts_on_brand_and_model() {
    let app = TestApp::new().await;
    let staff = app.seed_staff().await;

    let csv = "brand,model,width,height,depth,weight\n\
               Cisco,2960,44.5,4.4,30.0,4.5\n\
               APC,SmartUPS,43.2,8.9,66.0,24.1\n";
    let report = TestApp::expect_data(
        app.request_raw(
            Method::POST,
            "/api/v1/equipment/import",
            csv,
            "text/csv",
            &staff.token,
        )
        .await,
    )
    .await;
    assert_eq!(report["created"].as_u64(), Some(2));
    assert_eq!(report["updated"].as_u64(), Some(0));
    assert_eq!(report["errors"].as_array().unwrap().len(), 0);

    // Same key, new measurements: updates, not duplicates.
    let csv = "brand,model,width,height,depth,weight\n\
               Cisco,2960,44.5,4.4,30.0,5.0\n";
    let report = TestApp::expect_data(
        app.request_raw(
            Method::POST,
            "/api/v1/equipment/import",
            csv,
            "text/csv",
            &staff.token,
        )
        .await,
    )
    .await;
    assert_eq!(report["created"].as_u64(), Some(0));
    assert_eq!(report["updated"].as_u64(), Some(1));

    let listed = TestApp::expect_data(
        app.request(
            Method::GET,
            "/api/v1/equipment?search=Cisco",
            None,
            Some(&staff.token),
        )
        .await,
    )
    .await;
    assert_eq!(listed["total"].as_u64(), Some(1));
    assert_eq!(listed["items"][0]["weight"].as_str(), Some("5.0"));
}

#[tokio::test]
async fn malformed_rows_are_reported_but_valid_rows_apply() {
    let app = TestApp::new().await;
    let staff = app.seed_staff().await;

    let csv = "brand,model,width,height,depth,weight\n\
               Dell,R740,,,,\n\
               ,missing-brand,1,1,1,1\n\
               HP,DL380,not-a-number,1,1,1\n";
    let report = TestApp::expect_data(
        app.request_raw(
            Method::POST,
            "/api/v1/equipment/import",
            csv,
            "text/csv",
            &staff.token,
        )
        .await,
    )
    .await;

    assert_eq!(report["created"].as_u64(), Some(1));
    let errors = report["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 2);
    assert!(errors[0].as_str().unwrap().starts_with("line 3:"));
    assert!(errors[1].as_str().unwrap().starts_with("line 4:"));
}

#[tokio::test]
async fn equipment_export_carries_the_contract_columns() {
    let app = TestApp::new().await;
    let staff = app.seed_staff().await;

    let csv = "brand,model,width,height,depth,weight\nZyxel,GS1900,1,2,3,4\n";
    TestApp::expect_data(
        app.request_raw(
            Method::POST,
            "/api/v1/equipment/import",
            csv,
            "text/csv",
            &staff.token,
        )
        .await,
    )
    .await;

    let response = app
        .request(
            Method::GET,
            "/api/v1/equipment/export",
            None,
            Some(&staff.token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok()),
        Some("text/csv")
    );

    let body = TestApp::text_body(response).await;
    let mut lines = body.lines();
    assert_eq!(lines.next(), Some("brand,model,width,height,depth,weight"));
    assert_eq!(lines.next(), Some("Zyxel,GS1900,1,2,3,4"));
}

#[tokio::test]
async fn claims_report_has_the_exact_column_order() {
    let app = TestApp::new().await;
    let staff = app.seed_staff().await;
    let org = {
        use donorlift_api::entities::organisation;
        use sea_orm::{EntityTrait, Set};
        organisation::Entity::insert(organisation::ActiveModel {
            name: Set("HelpNet".to_string()),
            ..Default::default()
        })
        .exec_with_returning(&*app.state.db)
        .await
        .expect("seed organisation")
        .id
    };
    let donor = app
        .seed_user("donor@example.org", Some(org), false, true, false)
        .await;
    let requester = app
        .seed_user("req@example.org", None, false, false, true)
        .await;

    // Offer with one item, request with one item, then an earmark.
    let offer = TestApp::expect_data(
        app.request(
            Method::POST,
            "/api/v1/offers",
            Some(json!({
                "contact_id": donor.contact.id,
                "description": "Switches",
                "items": [{"item_type": "hardware", "brand": "Cisco", "model": "2960", "amount": 5}],
            })),
            Some(&staff.token),
        )
        .await,
    )
    .await;
    let offer_id = offer["id"].as_i64().unwrap();
    let offer_detail = TestApp::expect_data(
        app.request(
            Method::GET,
            &format!("/api/v1/offers/{offer_id}"),
            None,
            Some(&staff.token),
        )
        .await,
    )
    .await;
    let offered_item = offer_detail["items"][0]["id"].as_i64().unwrap();

    let request = TestApp::expect_data(
        app.request(
            Method::POST,
            "/api/v1/requests",
            Some(json!({
                "contact_id": requester.contact.id,
                "goal": "Community centre",
                "items": [{"item_type": "hardware", "brand": "Any", "model": "switch", "amount": 3}],
            })),
            Some(&staff.token),
        )
        .await,
    )
    .await;
    let request_id = request["id"].as_i64().unwrap();
    let request_detail = TestApp::expect_data(
        app.request(
            Method::GET,
            &format!("/api/v1/requests/{request_id}"),
            None,
            Some(&staff.token),
        )
        .await,
    )
    .await;
    let requested_item = request_detail["items"][0]["id"].as_i64().unwrap();

    TestApp::expect_data(
        app.request(
            Method::POST,
            "/api/v1/claims",
            Some(json!({
                "requested_item_id": requested_item,
                "offered_item_id": offered_item,
                "amount": 3,
            })),
            Some(&staff.token),
        )
        .await,
    )
    .await;

    let response = app
        .request(Method::GET, "/api/v1/claims/export", None, Some(&staff.token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = TestApp::text_body(response).await;
    let mut lines = body.lines();

    assert_eq!(
        lines.next(),
        Some(
            "amount,type,brand,model,shipment,\
             donor_first_name,donor_last_name,donor_email,donor_organisation,\
             requester_first_name,requester_last_name,requester_email,requester_organisation"
        )
    );

    let row = lines.next().expect("one claim row");
    let fields: Vec<&str> = row.split(',').collect();
    assert_eq!(fields[0], "3");
    assert_eq!(fields[1], "hardware");
    assert_eq!(fields[2], "Cisco");
    assert_eq!(fields[3], "2960");
    assert_eq!(fields[4], ""); // no shipment attached
    assert_eq!(fields[7], "donor@example.org");
    assert_eq!(fields[8], "HelpNet");
    assert_eq!(fields[11], "req@example.org");
    assert_eq!(fields[12], ""); // requester has no organisation
}
