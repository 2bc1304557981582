//! Location directory endpoints.

use std::str::FromStr;

use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::entities::{location, LocationKind};
use crate::errors::ServiceError;
use crate::services::locations::{LocationFilter, SaveLocation};
use crate::{ApiResponse, ApiResult, AppState, PaginatedResponse};

#[derive(Debug, Deserialize, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LocationListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub country: Option<String>,
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SaveLocationRequest {
    #[validate(length(min = 1))]
    pub name: String,
    pub city: Option<String>,
    pub country: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    /// donor_site | requester_site | warehouse | other
    pub kind: String,
    pub managed_by: Option<i32>,
}

#[utoipa::path(
    get,
    path = "/api/v1/locations",
    params(LocationListQuery),
    responses(
        (status = 200, description = "Locations listed", body = ApiResponse<PaginatedResponse<location::Model>>)
    ),
    tag = "locations"
)]
pub async fn list_locations(
    State(state): State<AppState>,
    Query(query): Query<LocationListQuery>,
) -> ApiResult<PaginatedResponse<location::Model>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let kind = query
        .kind
        .as_deref()
        .map(|k| {
            LocationKind::from_str(k).map_err(|_| {
                ServiceError::ValidationError(format!("Unknown location kind '{k}'"))
            })
        })
        .transpose()?;

    let filter = LocationFilter {
        country: query.country,
        kind,
    };

    let (items, total) = state
        .services
        .locations
        .list_locations(filter, page, limit)
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
    path = "/api/v1/locations/:id",
    params(("id" = i32, Path, description = "Location ID")),
    responses(
        (status = 200, description = "Location fetched", body = ApiResponse<location::Model>),
        (status = 404, description = "Location not found", body = crate::errors::ErrorResponse)
    ),
    tag = "locations"
)]
pub async fn get_location(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<location::Model> {
    let row = state.services.locations.get_location(id).await?;
    Ok(Json(ApiResponse::success(row)))
}

#[utoipa::path(
    post,
    path = "/api/v1/locations",
    request_body = SaveLocationRequest,
    responses(
        (status = 200, description = "Location created", body = ApiResponse<location::Model>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "locations"
)]
pub async fn create_location(
    State(state): State<AppState>,
    Json(payload): Json<SaveLocationRequest>,
) -> ApiResult<location::Model> {
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let created = state
        .services
        .locations
        .create_location(SaveLocation {
            name: payload.name,
            city: payload.city,
            country: payload.country,
            email: payload.email,
            phone: payload.phone,
            kind: payload.kind,
            managed_by: payload.managed_by,
        })
        .await?;
    Ok(Json(ApiResponse::success(created)))
}

#[utoipa::path(
    put,
    path = "/api/v1/locations/:id",
    params(("id" = i32, Path, description = "Location ID")),
    request_body = SaveLocationRequest,
    responses(
        (status = 200, description = "Location updated", body = ApiResponse<location::Model>),
        (status = 404, description = "Location not found", body = crate::errors::ErrorResponse)
    ),
    tag = "locations"
)]
pub async fn update_location(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<SaveLocationRequest>,
) -> ApiResult<location::Model> {
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let updated = state
        .services
        .locations
        .update_location(
            id,
            SaveLocation {
                name: payload.name,
                city: payload.city,
                country: payload.country,
                email: payload.email,
                phone: payload.phone,
                kind: payload.kind,
                managed_by: payload.managed_by,
            },
        )
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}
