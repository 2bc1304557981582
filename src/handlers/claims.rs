//! Claim endpoints and the claims CSV report.

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::entities::claim;
use crate::errors::ServiceError;
use crate::services::claims::CreateClaim;
use crate::{ApiResponse, ApiResult, AppState, PaginatedResponse};

#[derive(Debug, Deserialize, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ClaimListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateClaimRequest {
    pub requested_item_id: i32,
    pub offered_item_id: i32,
    #[validate(range(min = 1))]
    pub amount: i32,
    pub shipment_id: Option<i32>,
}

#[utoipa::path(
    get,
    path = "/api/v1/claims",
    params(ClaimListQuery),
    responses(
        (status = 200, description = "Claims listed", body = ApiResponse<PaginatedResponse<claim::Model>>)
    ),
    tag = "claims"
)]
pub async fn list_claims(
    State(state): State<AppState>,
    Query(query): Query<ClaimListQuery>,
) -> ApiResult<PaginatedResponse<claim::Model>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let (items, total) = state.services.claims.list_claims(page, limit).await?;

    Ok(Json(ApiResponse::success(PaginatedResponse {
        items,
        total,
        page,
        limit,
        total_pages: total.div_ceil(limit),
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/claims",
    request_body = CreateClaimRequest,
    responses(
        (status = 200, description = "Claim created", body = ApiResponse<claim::Model>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "claims"
)]
pub async fn create_claim(
    State(state): State<AppState>,
    Json(payload): Json<CreateClaimRequest>,
) -> ApiResult<claim::Model> {
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let created = state
        .services
        .claims
        .create_claim(CreateClaim {
            requested_item_id: payload.requested_item_id,
            offered_item_id: payload.offered_item_id,
            amount: payload.amount,
            shipment_id: payload.shipment_id,
        })
        .await?;
    Ok(Json(ApiResponse::success(created)))
}

#[utoipa::path(
    get,
    path = "/api/v1/claims/export",
    responses(
        (status = 200, description = "Claims report as CSV", content_type = "text/csv")
    ),
    tag = "claims"
)]
pub async fn export_claims(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let csv_text = state.services.claims.export_report_csv().await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"claims_report.csv\"",
            ),
        ],
        csv_text,
    )
        .into_response())
}
