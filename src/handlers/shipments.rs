//! Shipment endpoints, including the shipment-item ledger list.

use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::entities::{shipment, shipment_item};
use crate::errors::ServiceError;
use crate::services::shipments::{SaveShipment, ShipmentFilter, ShipmentItemFilter};
use crate::{ApiResponse, ApiResult, AppState, PaginatedResponse};

#[derive(Debug, Deserialize, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ShipmentListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub is_delivered: Option<bool>,
    pub from_location_id: Option<i32>,
    pub to_location_id: Option<i32>,
    /// Matches the name and either endpoint's name, city or country.
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ShipmentItemListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub last_location_id: Option<i32>,
    pub shipment_id: Option<i32>,
    pub is_delivered: Option<bool>,
    pub offered_item_id: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SaveShipmentRequest {
    #[validate(length(min = 1))]
    pub name: String,
    pub shipment_date: Option<NaiveDate>,
    pub delivery_date: Option<NaiveDate>,
    pub from_location_id: i32,
    pub to_location_id: i32,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DeliverRequest {
    pub delivery_date: Option<NaiveDate>,
}

/// Ledger row with the delivery flag derived from its shipment.
#[derive(Debug, Serialize, ToSchema)]
pub struct ShipmentItemSummary {
    #[serde(flatten)]
    pub item: shipment_item::Model,
    pub is_delivered: bool,
}

impl From<SaveShipmentRequest> for SaveShipment {
    fn from(value: SaveShipmentRequest) -> Self {
        SaveShipment {
            name: value.name,
            shipment_date: value.shipment_date,
            delivery_date: value.delivery_date,
            from_location_id: value.from_location_id,
            to_location_id: value.to_location_id,
            notes: value.notes,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/shipments",
    params(ShipmentListQuery),
    responses(
        (status = 200, description = "Shipments listed", body = ApiResponse<PaginatedResponse<shipment::Model>>)
    ),
    tag = "shipments"
)]
pub async fn list_shipments(
    State(state): State<AppState>,
    Query(query): Query<ShipmentListQuery>,
) -> ApiResult<PaginatedResponse<shipment::Model>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let filter = ShipmentFilter {
        is_delivered: query.is_delivered,
        from_location_id: query.from_location_id,
        to_location_id: query.to_location_id,
        search: query.search,
    };

    let (items, total) = state
        .services
        .shipments
        .list_shipments(filter, page, limit)
        .await?;

    Ok(Json(ApiResponse::success(PaginatedResponse {
        items,
        total,
        page,
        limit,
        total_pages: total.div_ceil(limit),
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/shipments/:id",
    params(("id" = i32, Path, description = "Shipment ID")),
    responses(
        (status = 200, description = "Shipment fetched", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Shipment not found", body = crate::errors::ErrorResponse)
    ),
    tag = "shipments"
)]
pub async fn get_shipment(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<serde_json::Value> {
    let (shipment_row, items) = state.services.shipments.get_shipment(id).await?;
    Ok(Json(ApiResponse::success(serde_json::json!({
        "shipment": shipment_row,
        "items": items,
    }))))
}

#[utoipa::path(
    post,
    path = "/api/v1/shipments",
    request_body = SaveShipmentRequest,
    responses(
        (status = 200, description = "Shipment created", body = ApiResponse<shipment::Model>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "shipments"
)]
pub async fn create_shipment(
    State(state): State<AppState>,
    Json(payload): Json<SaveShipmentRequest>,
) -> ApiResult<shipment::Model> {
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let created = state
        .services
        .shipments
        .create_shipment(payload.into())
        .await?;
    Ok(Json(ApiResponse::success(created)))
}

#[utoipa::path(
    put,
    path = "/api/v1/shipments/:id",
    params(("id" = i32, Path, description = "Shipment ID")),
    request_body = SaveShipmentRequest,
    responses(
        (status = 200, description = "Shipment updated", body = ApiResponse<shipment::Model>),
        (status = 404, description = "Shipment not found", body = crate::errors::ErrorResponse)
    ),
    tag = "shipments"
)]
pub async fn update_shipment(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<SaveShipmentRequest>,
) -> ApiResult<shipment::Model> {
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let updated = state
        .services
        .shipments
        .update_shipment(id, payload.into())
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

#[utoipa::path(
    post,
    path = "/api/v1/shipments/:id/deliver",
    params(("id" = i32, Path, description = "Shipment ID")),
    request_body = DeliverRequest,
    responses(
        (status = 200, description = "Shipment marked delivered", body = ApiResponse<shipment::Model>),
        (status = 404, description = "Shipment not found", body = crate::errors::ErrorResponse)
    ),
    tag = "shipments"
)]
pub async fn mark_delivered(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<DeliverRequest>,
) -> ApiResult<shipment::Model> {
    let updated = state
        .services
        .shipments
        .mark_delivered(id, payload.delivery_date)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

#[utoipa::path(
    get,
    path = "/api/v1/shipment-items",
    params(ShipmentItemListQuery),
    responses(
        (status = 200, description = "Ledger rows listed", body = ApiResponse<PaginatedResponse<ShipmentItemSummary>>)
    ),
    tag = "shipments"
)]
pub async fn list_shipment_items(
    State(state): State<AppState>,
    Query(query): Query<ShipmentItemListQuery>,
) -> ApiResult<PaginatedResponse<ShipmentItemSummary>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let filter = ShipmentItemFilter {
        last_location_id: query.last_location_id,
        shipment_id: query.shipment_id,
        shipment_is_delivered: query.is_delivered,
        offered_item_id: query.offered_item_id,
    };

    let (rows, total) = state
        .services
        .shipments
        .list_shipment_items(filter, page, limit)
        .await?;

    let items = rows
        .into_iter()
        .map(|(item, shipment)| ShipmentItemSummary {
            is_delivered: shipment.map(|s| s.is_delivered).unwrap_or(false),
            item,
        })
        .collect();

    Ok(Json(ApiResponse::success(PaginatedResponse {
        items,
        total,
        page,
        limit,
        total_pages: total.div_ceil(limit),
    })))
}
