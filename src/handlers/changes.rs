//! Read-only audit log surface.

use std::str::FromStr;

use axum::{
    extract::{Query, State},
    response::Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::entities::{change, ChangeAction, ChangeType};
use crate::errors::ServiceError;
use crate::services::changelog::ChangeFilter;
use crate::{ApiResponse, ApiResult, AppState, PaginatedResponse};

#[derive(Debug, Deserialize, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ChangeListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// add | change | delete
    pub action: Option<String>,
    /// offer | request
    pub change_type: Option<String>,
    pub who: Option<i32>,
}

#[utoipa::path(
    get,
    path = "/api/v1/changes",
    params(ChangeListQuery),
    responses(
        (status = 200, description = "Audit log, newest first", body = ApiResponse<PaginatedResponse<change::Model>>),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse)
    ),
    tag = "changes"
)]
pub async fn list_changes(
    State(state): State<AppState>,
    Query(query): Query<ChangeListQuery>,
) -> ApiResult<PaginatedResponse<change::Model>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let action = query
        .action
        .as_deref()
        .map(|a| {
            ChangeAction::from_str(a)
                .map_err(|_| ServiceError::ValidationError(format!("Unknown action '{a}'")))
        })
        .transpose()?;
    let change_type = query
        .change_type
        .as_deref()
        .map(|t| {
            ChangeType::from_str(t)
                .map_err(|_| ServiceError::ValidationError(format!("Unknown change type '{t}'")))
        })
        .transpose()?;

    let (items, total) = state
        .services
        .changelog
        .list_changes(
            ChangeFilter {
                action,
                change_type,
                who: query.who,
            },
            page,
            limit,
        )
        .await?;

    Ok(Json(ApiResponse::success(PaginatedResponse {
        items,
        total,
        page,
        limit,
        total_pages: total.div_ceil(limit),
    })))
}
