//! Equipment catalog endpoints with CSV bulk import/export.

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::entities::equipment_data;
use crate::errors::ServiceError;
use crate::services::equipment::ImportReport;
use crate::{ApiResponse, ApiResult, AppState, PaginatedResponse};

#[derive(Debug, Deserialize, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EquipmentListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// Matches brand and model.
    pub search: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/v1/equipment",
    params(EquipmentListQuery),
    responses(
        (status = 200, description = "Catalog listed", body = ApiResponse<PaginatedResponse<equipment_data::Model>>)
    ),
    tag = "equipment"
)]
pub async fn list_equipment(
    State(state): State<AppState>,
    Query(query): Query<EquipmentListQuery>,
) -> ApiResult<PaginatedResponse<equipment_data::Model>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let (items, total) = state
        .services
        .equipment
        .list_equipment(query.search, page, limit)
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
    post,
    path = "/api/v1/equipment/import",
    request_body(content = String, content_type = "text/csv"),
    responses(
        (status = 200, description = "Import report; valid rows applied, bad rows listed", body = ApiResponse<ImportReport>)
    ),
    tag = "equipment"
)]
pub async fn import_equipment(
    State(state): State<AppState>,
    body: String,
) -> ApiResult<ImportReport> {
    let report = state.services.equipment.import_csv(&body).await?;
    Ok(Json(ApiResponse::success(report)))
}

#[utoipa::path(
    get,
    path = "/api/v1/equipment/export",
    responses(
        (status = 200, description = "Catalog as CSV", content_type = "text/csv")
    ),
    tag = "equipment"
)]
pub async fn export_equipment(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let csv_text = state.services.equipment.export_csv().await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"equipment_data.csv\"",
            ),
        ],
        csv_text,
    )
        .into_response())
}
