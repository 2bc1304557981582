//! Offer aggregate endpoints.
//!
//! Lists are scoped to the actor; superuser-only columns (internal notes)
//! and donor identity fields are redacted per the permission matrix.

use axum::{
    extract::{Path, Query, State},
    response::Json,
    Extension,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::auth::{access, AuthUser};
use crate::entities::{offer, offer_item};
use crate::errors::ServiceError;
use crate::services::offers::{OfferItemInput, SaveOffer};
use crate::{ApiResponse, ApiResult, AppState, PaginatedResponse};

#[derive(Debug, Deserialize, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OfferListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// Matches description and item brand/model/notes.
    pub search: Option<String>,
}

/// Offer as shown in lists and detail, with role-dependent redaction.
#[derive(Debug, Serialize, ToSchema)]
pub struct OfferSummary {
    pub id: i32,
    pub description: String,
    /// Hidden from non-donors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_method: Option<String>,
    /// Staff only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OfferSummary {
    fn for_actor(model: offer::Model, actor: &AuthUser) -> Self {
        Self {
            id: model.id,
            description: model.description,
            contact_id: access::sees_donor_identity(actor).then_some(model.contact_id),
            location_id: access::sees_donor_identity(actor)
                .then_some(model.location_id)
                .flatten(),
            delivery_method: access::sees_donor_identity(actor)
                .then_some(model.delivery_method)
                .flatten(),
            internal_notes: access::sees_internal_notes(actor)
                .then_some(model.internal_notes)
                .flatten(),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OfferDetail {
    #[serde(flatten)]
    pub offer: OfferSummary,
    pub items: Vec<offer_item::Model>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SaveOfferRequest {
    /// Defaults to the acting contact; only staff may set someone else.
    pub contact_id: Option<i32>,
    #[validate(length(min = 1))]
    pub description: String,
    pub location_id: Option<i32>,
    pub delivery_method: Option<String>,
    pub internal_notes: Option<String>,
    #[serde(default)]
    pub items: Vec<OfferItemInput>,
}

impl SaveOfferRequest {
    fn into_save(self, actor: &AuthUser) -> Result<SaveOffer, ServiceError> {
        let contact_id = self.contact_id.unwrap_or(actor.contact_id);
        if contact_id != actor.contact_id && !actor.is_superuser {
            return Err(ServiceError::Forbidden(
                "Only staff may act on behalf of another contact".to_string(),
            ));
        }
        Ok(SaveOffer {
            contact_id,
            description: self.description,
            location_id: self.location_id,
            delivery_method: self.delivery_method,
            internal_notes: self.internal_notes,
            items: self.items,
        })
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/offers",
    params(OfferListQuery),
    responses(
        (status = 200, description = "Offers listed", body = ApiResponse<PaginatedResponse<OfferSummary>>)
    ),
    tag = "offers"
)]
pub async fn list_offers(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Query(query): Query<OfferListQuery>,
) -> ApiResult<PaginatedResponse<OfferSummary>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let (rows, total) = state
        .services
        .offers
        .list_offers(&actor, page, limit, query.search)
        .await?;

    let items = rows
        .into_iter()
        .map(|m| OfferSummary::for_actor(m, &actor))
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
    path = "/api/v1/offers/:id",
    params(("id" = i32, Path, description = "Offer ID")),
    responses(
        (status = 200, description = "Offer fetched", body = ApiResponse<OfferDetail>),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Offer not found", body = crate::errors::ErrorResponse)
    ),
    tag = "offers"
)]
pub async fn get_offer(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> ApiResult<OfferDetail> {
    let owner = state.services.offers.owner_ctx(id).await?;
    if !access::can_view_aggregate(&actor, &owner) {
        return Err(ServiceError::Forbidden(
            "You may only view your own offers".to_string(),
        ));
    }

    let (offer_row, items) = state.services.offers.get_offer(id).await?;
    Ok(Json(ApiResponse::success(OfferDetail {
        offer: OfferSummary::for_actor(offer_row, &actor),
        items,
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/offers",
    request_body = SaveOfferRequest,
    responses(
        (status = 200, description = "Offer created", body = ApiResponse<OfferSummary>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "offers"
)]
pub async fn create_offer(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Json(payload): Json<SaveOfferRequest>,
) -> ApiResult<OfferSummary> {
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let input = payload.into_save(&actor)?;
    let created = state.services.offers.create_offer(&actor, input).await?;
    Ok(Json(ApiResponse::success(OfferSummary::for_actor(
        created, &actor,
    ))))
}

#[utoipa::path(
    put,
    path = "/api/v1/offers/:id",
    params(("id" = i32, Path, description = "Offer ID")),
    request_body = SaveOfferRequest,
    responses(
        (status = 200, description = "Offer updated", body = ApiResponse<OfferSummary>),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse)
    ),
    tag = "offers"
)]
pub async fn update_offer(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Path(id): Path<i32>,
    Json(payload): Json<SaveOfferRequest>,
) -> ApiResult<OfferSummary> {
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let owner = state.services.offers.owner_ctx(id).await?;
    if !access::can_change_aggregate(&actor, &owner) {
        return Err(ServiceError::Forbidden(
            "You may only change your own offers".to_string(),
        ));
    }

    let input = payload.into_save(&actor)?;
    let updated = state
        .services
        .offers
        .update_offer(&actor, id, input)
        .await?;
    Ok(Json(ApiResponse::success(OfferSummary::for_actor(
        updated, &actor,
    ))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/offers/:id",
    params(("id" = i32, Path, description = "Offer ID")),
    responses(
        (status = 200, description = "Offer deleted", body = ApiResponse<serde_json::Value>),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse)
    ),
    tag = "offers"
)]
pub async fn delete_offer(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> ApiResult<serde_json::Value> {
    let owner = state.services.offers.owner_ctx(id).await?;
    if !access::can_change_aggregate(&actor, &owner) {
        return Err(ServiceError::Forbidden(
            "You may only delete your own offers".to_string(),
        ));
    }

    state.services.offers.delete_offer(&actor, id).await?;
    Ok(Json(ApiResponse::success(
        serde_json::json!({ "deleted": id }),
    )))
}
