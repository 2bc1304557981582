//! Requested-item collection endpoints. Mirror image of the offered-item
//! surface: donors browse the pool, owners reach their own rows.

use std::str::FromStr;

use axum::{
    extract::{Path, Query, State},
    response::Json,
    Extension,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::auth::{access, AuthUser};
use crate::entities::{request_item, ItemType};
use crate::errors::ServiceError;
use crate::services::requests::RequestItemFilter;
use crate::{ApiResponse, ApiResult, AppState, PaginatedResponse};

#[derive(Debug, Deserialize, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RequestItemListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub item_type: Option<String>,
    pub brand: Option<String>,
    pub organisation_id: Option<i32>,
    pub request_id: Option<i32>,
    /// Matches brand, model and notes.
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkSelection {
    pub item_ids: Vec<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MoveToRequestRequest {
    pub item_ids: Vec<i32>,
    pub request_id: i32,
}

fn parse_type(value: &str) -> Result<ItemType, ServiceError> {
    ItemType::from_str(value)
        .map_err(|_| ServiceError::ValidationError(format!("Unknown item type '{value}'")))
}

#[utoipa::path(
    get,
    path = "/api/v1/request-items",
    params(RequestItemListQuery),
    responses(
        (status = 200, description = "Requested items listed", body = ApiResponse<PaginatedResponse<request_item::Model>>),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse)
    ),
    tag = "request-items"
)]
pub async fn list_request_items(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Query(query): Query<RequestItemListQuery>,
) -> ApiResult<PaginatedResponse<request_item::Model>> {
    if !access::can_view_request_items(&actor) {
        return Err(ServiceError::Forbidden(
            "Requested items are visible to staff and donors".to_string(),
        ));
    }

    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let filter = if actor.is_superuser {
        RequestItemFilter {
            item_type: query.item_type.as_deref().map(parse_type).transpose()?,
            brand: query.brand,
            organisation_id: query.organisation_id,
            request_id: query.request_id,
            search: query.search,
        }
    } else {
        RequestItemFilter {
            item_type: query.item_type.as_deref().map(parse_type).transpose()?,
            brand: query.brand,
            search: query.search,
            ..Default::default()
        }
    };

    let (items, total) = state
        .services
        .requests
        .list_request_items(filter, page, limit)
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
    path = "/api/v1/request-items/:id",
    params(("id" = i32, Path, description = "Requested item ID")),
    responses(
        (status = 200, description = "Requested item fetched", body = ApiResponse<request_item::Model>),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "request-items"
)]
pub async fn get_request_item(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> ApiResult<request_item::Model> {
    let item = state.services.requests.get_request_item(id).await?;
    let owner = state.services.requests.owner_ctx(item.request_id).await?;

    if !access::can_view_request_item(&actor, &owner) {
        return Err(ServiceError::Forbidden(
            "You may only view your own requested items".to_string(),
        ));
    }

    Ok(Json(ApiResponse::success(item)))
}

#[utoipa::path(
    post,
    path = "/api/v1/request-items/set-type/:item_type",
    params(("item_type" = String, Path, description = "hardware | software | service | other")),
    request_body = BulkSelection,
    responses(
        (status = 200, description = "Types updated", body = ApiResponse<serde_json::Value>),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse)
    ),
    tag = "request-items"
)]
pub async fn set_item_type(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Path(item_type): Path<String>,
    Json(payload): Json<BulkSelection>,
) -> ApiResult<serde_json::Value> {
    if !access::can_run_bulk_actions(&actor) {
        return Err(ServiceError::Forbidden(
            "Bulk actions are staff only".to_string(),
        ));
    }

    let item_type = parse_type(&item_type)?;
    let updated = state
        .services
        .requests
        .set_item_type(&payload.item_ids, item_type)
        .await?;
    Ok(Json(ApiResponse::success(serde_json::json!({
        "updated": updated,
        "item_type": item_type.to_string(),
    }))))
}

#[utoipa::path(
    post,
    path = "/api/v1/request-items/move",
    request_body = MoveToRequestRequest,
    responses(
        (status = 200, description = "Items moved", body = ApiResponse<serde_json::Value>),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse)
    ),
    tag = "request-items"
)]
pub async fn move_to_request(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Json(payload): Json<MoveToRequestRequest>,
) -> ApiResult<serde_json::Value> {
    if !access::can_run_bulk_actions(&actor) {
        return Err(ServiceError::Forbidden(
            "Bulk actions are staff only".to_string(),
        ));
    }

    let moved = state
        .services
        .requests
        .move_items_to_request(&payload.item_ids, payload.request_id)
        .await?;
    Ok(Json(ApiResponse::success(serde_json::json!({
        "moved": moved,
        "request_id": payload.request_id,
    }))))
}
