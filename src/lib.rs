//! Donorlift API Library
//!
//! Administrative backend for donation logistics: offers, requests,
//! claims and shipments.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;

use axum::{extract::State, response::Json, routing::get, Router};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::auth::AuthRouterExt;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
}

#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// The versioned API surface with per-group auth gating.
pub fn api_v1_routes() -> Router<AppState> {
    // Offer/request surfaces authenticate and then enforce the ownership
    // matrix per object inside the handlers.
    let aggregates = Router::new()
        .route(
            "/offers",
            get(handlers::offers::list_offers).post(handlers::offers::create_offer),
        )
        .route(
            "/offers/:id",
            get(handlers::offers::get_offer)
                .put(handlers::offers::update_offer)
                .delete(handlers::offers::delete_offer),
        )
        .route(
            "/requests",
            get(handlers::requests::list_requests).post(handlers::requests::create_request),
        )
        .route(
            "/requests/:id",
            get(handlers::requests::get_request)
                .put(handlers::requests::update_request)
                .delete(handlers::requests::delete_request),
        )
        .route(
            "/offer-items",
            get(handlers::offer_items::list_offer_items),
        )
        .route(
            "/offer-items/:id",
            get(handlers::offer_items::get_offer_item),
        )
        .route(
            "/offer-items/set-type/:item_type",
            axum::routing::post(handlers::offer_items::set_item_type),
        )
        .route(
            "/offer-items/move",
            axum::routing::post(handlers::offer_items::move_to_offer),
        )
        .route(
            "/request-items",
            get(handlers::request_items::list_request_items),
        )
        .route(
            "/request-items/:id",
            get(handlers::request_items::get_request_item),
        )
        .route(
            "/request-items/set-type/:item_type",
            axum::routing::post(handlers::request_items::set_item_type),
        )
        .route(
            "/request-items/move",
            axum::routing::post(handlers::request_items::move_to_request),
        )
        .with_auth();

    // Logistics surfaces are staff only.
    let logistics = Router::new()
        .route(
            "/locations",
            get(handlers::locations::list_locations).post(handlers::locations::create_location),
        )
        .route(
            "/locations/:id",
            get(handlers::locations::get_location).put(handlers::locations::update_location),
        )
        .route(
            "/equipment",
            get(handlers::equipment::list_equipment),
        )
        .route(
            "/equipment/import",
            axum::routing::post(handlers::equipment::import_equipment),
        )
        .route(
            "/equipment/export",
            get(handlers::equipment::export_equipment),
        )
        .route(
            "/shipments",
            get(handlers::shipments::list_shipments).post(handlers::shipments::create_shipment),
        )
        .route(
            "/shipments/:id",
            get(handlers::shipments::get_shipment).put(handlers::shipments::update_shipment),
        )
        .route(
            "/shipments/:id/deliver",
            axum::routing::post(handlers::shipments::mark_delivered),
        )
        .route(
            "/shipment-items",
            get(handlers::shipments::list_shipment_items),
        )
        .route(
            "/claims",
            get(handlers::claims::list_claims).post(handlers::claims::create_claim),
        )
        .route("/claims/export", get(handlers::claims::export_claims))
        .route("/changes", get(handlers::changes::list_changes))
        .with_staff();

    // The assignable pool and the assignment workflow are staff actions.
    let items = Router::new()
        .route("/items", get(handlers::items::list_pool))
        .route("/items/intake-pool", get(handlers::items::list_intake_pool))
        .route(
            "/items/assignments/validate",
            axum::routing::post(handlers::items::validate_selection),
        )
        .route(
            "/items/assignments",
            axum::routing::post(handlers::items::assign_to_shipment),
        )
        .route(
            "/items/intake",
            axum::routing::post(handlers::items::intake),
        )
        .route(
            "/items/:offered_item_id/availability",
            get(handlers::items::offer_item_availability),
        )
        .route(
            "/items/:offered_item_id/history",
            get(handlers::items::item_history),
        )
        .with_staff();

    Router::new()
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        .merge(aggregates)
        .merge(logistics)
        .merge(items)
}

async fn api_status() -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let status_data = json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "donorlift-api",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(status_data)))
}

async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let health_data = json!({
        "status": db_status,
        "checks": {
            "database": db_status,
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(health_data)))
}
