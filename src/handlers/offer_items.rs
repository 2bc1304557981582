//! Offered-item collection endpoints.
//!
//! Collection access follows the role matrix (staff or requesters browse
//! the pool, owners always reach their own rows); bulk actions are staff
//! only.

use std::str::FromStr;

use axum::{
    extract::{Path, Query, State},
    response::Json,
    Extension,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::auth::{access, AuthUser};
use crate::entities::{offer_item, ItemType};
use crate::errors::ServiceError;
use crate::services::offers::OfferItemFilter;
use crate::{ApiResponse, ApiResult, AppState, PaginatedResponse};

#[derive(Debug, Deserialize, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OfferItemListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub item_type: Option<String>,
    pub received: Option<bool>,
    pub brand: Option<String>,
    pub organisation_id: Option<i32>,
    pub offer_id: Option<i32>,
    /// Matches brand, model and notes.
    pub search: Option<String>,
}

/// Offered item with its claimed-sum annotation. `claimed` is absent when
/// nothing is claimed; `over_claimed` flags claims exceeding the amount.
#[derive(Debug, Serialize, ToSchema)]
pub struct OfferItemSummary {
    #[serde(flatten)]
    pub item: offer_item::Model,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claimed: Option<i64>,
    pub over_claimed: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkSelection {
    pub item_ids: Vec<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MoveToOfferRequest {
    pub item_ids: Vec<i32>,
    pub offer_id: i32,
}

fn parse_type(value: &str) -> Result<ItemType, ServiceError> {
    ItemType::from_str(value)
        .map_err(|_| ServiceError::ValidationError(format!("Unknown item type '{value}'")))
}

#[utoipa::path(
    get,
    path = "/api/v1/offer-items",
    params(OfferItemListQuery),
    responses(
        (status = 200, description = "Offered items listed", body = ApiResponse<PaginatedResponse<OfferItemSummary>>),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse)
    ),
    tag = "offer-items"
)]
pub async fn list_offer_items(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Query(query): Query<OfferItemListQuery>,
) -> ApiResult<PaginatedResponse<OfferItemSummary>> {
    if !access::can_view_offer_items(&actor) {
        return Err(ServiceError::Forbidden(
            "Offered items are visible to staff and requesters".to_string(),
        ));
    }

    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    // Non-staff only filter on type and brand, mirroring the reduced
    // filter set of the original list.
    let filter = if actor.is_superuser {
        OfferItemFilter {
            item_type: query.item_type.as_deref().map(parse_type).transpose()?,
            received: query.received,
            brand: query.brand,
            organisation_id: query.organisation_id,
            offer_id: query.offer_id,
            search: query.search,
        }
    } else {
        OfferItemFilter {
            item_type: query.item_type.as_deref().map(parse_type).transpose()?,
            brand: query.brand,
            search: query.search,
            ..Default::default()
        }
    };

    let (rows, total) = state
        .services
        .offers
        .list_offer_items(filter, page, limit)
        .await?;

    let items = rows
        .into_iter()
        .map(|annotated| {
            let over_claimed = annotated
                .total_claimed
                .map(|claimed| claimed > i64::from(annotated.item.amount))
                .unwrap_or(false);
            OfferItemSummary {
                // Non-staff do not see claim state.
                claimed: actor.is_superuser.then_some(annotated.total_claimed).flatten(),
                over_claimed: actor.is_superuser && over_claimed,
                item: annotated.item,
            }
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

#[utoipa::path(
    get,
    path = "/api/v1/offer-items/:id",
    params(("id" = i32, Path, description = "Offered item ID")),
    responses(
        (status = 200, description = "Offered item fetched", body = ApiResponse<offer_item::Model>),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "offer-items"
)]
pub async fn get_offer_item(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> ApiResult<offer_item::Model> {
    let item = state.services.offers.get_offer_item(id).await?;
    let owner = state.services.offers.owner_ctx(item.offer_id).await?;

    if !access::can_view_offer_item(&actor, &owner) {
        return Err(ServiceError::Forbidden(
            "You may only view your own offered items".to_string(),
        ));
    }

    Ok(Json(ApiResponse::success(item)))
}

#[utoipa::path(
    post,
    path = "/api/v1/offer-items/set-type/:item_type",
    params(("item_type" = String, Path, description = "hardware | software | service | other")),
    request_body = BulkSelection,
    responses(
        (status = 200, description = "Types updated", body = ApiResponse<serde_json::Value>),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse)
    ),
    tag = "offer-items"
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
        .offers
        .set_item_type(&payload.item_ids, item_type)
        .await?;
    Ok(Json(ApiResponse::success(serde_json::json!({
        "updated": updated,
        "item_type": item_type.to_string(),
    }))))
}

#[utoipa::path(
    post,
    path = "/api/v1/offer-items/move",
    request_body = MoveToOfferRequest,
    responses(
        (status = 200, description = "Items moved", body = ApiResponse<serde_json::Value>),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse)
    ),
    tag = "offer-items"
)]
pub async fn move_to_offer(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Json(payload): Json<MoveToOfferRequest>,
) -> ApiResult<serde_json::Value> {
    if !access::can_run_bulk_actions(&actor) {
        return Err(ServiceError::Forbidden(
            "Bulk actions are staff only".to_string(),
        ));
    }

    let moved = state
        .services
        .offers
        .move_items_to_offer(&payload.item_ids, payload.offer_id)
        .await?;
    Ok(Json(ApiResponse::success(serde_json::json!({
        "moved": moved,
        "offer_id": payload.offer_id,
    }))))
}
