//! The assignable-item pool and the shipment assignment workflow.
//!
//! "Items" are not a table: the pool is a read-only view over ledger rows
//! with positive availability. Selection is validated in one request,
//! re-submitted with a target shipment in the next; nothing persists in
//! between.

use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::entities::shipment_item;
use crate::errors::ServiceError;
use crate::services::inventory::{
    AssignmentLine, AvailableItem, IntakeItem, ValidatedSelection,
};
use crate::{ApiResponse, ApiResult, AppState};

#[derive(Debug, Deserialize, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PoolQuery {
    /// Restrict the pool to one location.
    pub location_id: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SelectionRequest {
    /// Ledger row ids picked from the pool.
    pub item_ids: Vec<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "shipment_id": 3,
    "items": [{"item_id": 11, "amount": 7}]
}))]
pub struct AssignmentRequest {
    pub shipment_id: i32,
    #[validate(length(min = 1))]
    pub items: Vec<AssignmentLine>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct IntakeRequest {
    pub offer_item_id: i32,
    #[validate(range(min = 1))]
    pub amount: i32,
    /// Target shipment; mutually exclusive with `location_id`.
    pub shipment_id: Option<i32>,
    /// Park the quantity at a location without a transport leg.
    pub location_id: Option<i32>,
}

#[utoipa::path(
    get,
    path = "/api/v1/items",
    params(PoolQuery),
    responses(
        (status = 200, description = "Assignable pool", body = ApiResponse<Vec<AvailableItem>>),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse)
    ),
    tag = "items"
)]
pub async fn list_pool(
    State(state): State<AppState>,
    Query(query): Query<PoolQuery>,
) -> ApiResult<Vec<AvailableItem>> {
    let pool = state
        .services
        .inventory
        .list_available_items(query.location_id)
        .await?;
    Ok(Json(ApiResponse::success(pool)))
}

#[utoipa::path(
    get,
    path = "/api/v1/items/intake-pool",
    responses(
        (status = 200, description = "Offered items with unshipped quantity", body = ApiResponse<Vec<IntakeItem>>)
    ),
    tag = "items"
)]
pub async fn list_intake_pool(State(state): State<AppState>) -> ApiResult<Vec<IntakeItem>> {
    let pool = state.services.inventory.list_intake_pool().await?;
    Ok(Json(ApiResponse::success(pool)))
}

#[utoipa::path(
    post,
    path = "/api/v1/items/assignments/validate",
    request_body = SelectionRequest,
    responses(
        (status = 200, description = "Selection accepted; eligible shipments returned", body = ApiResponse<ValidatedSelection>),
        (status = 422, description = "Selection rejected", body = crate::errors::ErrorResponse)
    ),
    tag = "items"
)]
pub async fn validate_selection(
    State(state): State<AppState>,
    Json(payload): Json<SelectionRequest>,
) -> ApiResult<ValidatedSelection> {
    let validated = state
        .services
        .inventory
        .validate_selection(&payload.item_ids)
        .await?;
    Ok(Json(ApiResponse::success(validated)))
}

#[utoipa::path(
    post,
    path = "/api/v1/items/assignments",
    request_body = AssignmentRequest,
    responses(
        (status = 200, description = "Items assigned", body = ApiResponse<Vec<shipment_item::Model>>),
        (status = 409, description = "Insufficient availability", body = crate::errors::ErrorResponse),
        (status = 422, description = "Selection rejected", body = crate::errors::ErrorResponse)
    ),
    tag = "items"
)]
pub async fn assign_to_shipment(
    State(state): State<AppState>,
    Json(payload): Json<AssignmentRequest>,
) -> ApiResult<Vec<shipment_item::Model>> {
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let created = state
        .services
        .inventory
        .assign_to_shipment(payload.shipment_id, &payload.items)
        .await?;
    Ok(Json(ApiResponse::success(created)))
}

#[utoipa::path(
    post,
    path = "/api/v1/items/intake",
    request_body = IntakeRequest,
    responses(
        (status = 200, description = "Root ledger row created", body = ApiResponse<shipment_item::Model>),
        (status = 409, description = "Insufficient availability", body = crate::errors::ErrorResponse)
    ),
    tag = "items"
)]
pub async fn intake(
    State(state): State<AppState>,
    Json(payload): Json<IntakeRequest>,
) -> ApiResult<shipment_item::Model> {
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let created = state
        .services
        .inventory
        .intake_offer_item(
            payload.offer_item_id,
            payload.amount,
            payload.shipment_id,
            payload.location_id,
        )
        .await?;
    Ok(Json(ApiResponse::success(created)))
}

#[utoipa::path(
    get,
    path = "/api/v1/items/:offered_item_id/availability",
    params(("offered_item_id" = i32, Path, description = "Offered item ID")),
    responses(
        (status = 200, description = "Unshipped quantity", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Offered item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "items"
)]
pub async fn offer_item_availability(
    State(state): State<AppState>,
    Path(offered_item_id): Path<i32>,
) -> ApiResult<serde_json::Value> {
    let available = state
        .services
        .inventory
        .offer_item_availability(offered_item_id)
        .await?;
    Ok(Json(ApiResponse::success(json!({
        "offered_item_id": offered_item_id,
        "available": available,
    }))))
}

#[utoipa::path(
    get,
    path = "/api/v1/items/:offered_item_id/history",
    params(("offered_item_id" = i32, Path, description = "Offered item ID")),
    responses(
        (status = 200, description = "Movement history, newest first", body = ApiResponse<Vec<shipment_item::Model>>)
    ),
    tag = "items"
)]
pub async fn item_history(
    State(state): State<AppState>,
    Path(offered_item_id): Path<i32>,
) -> ApiResult<Vec<shipment_item::Model>> {
    let history = state.services.shipments.item_history(offered_item_id).await?;
    Ok(Json(ApiResponse::success(history)))
}
