//! Request aggregate endpoints.

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
use crate::entities::{request, request_item};
use crate::errors::ServiceError;
use crate::services::requests::{render_item_lines, RequestItemInput, SaveRequest};
use crate::{ApiResponse, ApiResult, AppState, PaginatedResponse};

#[derive(Debug, Deserialize, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RequestListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// Matches goal, description and item brand/model/notes.
    pub search: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RequestSummary {
    pub id: i32,
    pub contact_id: i32,
    pub goal: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Staff only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RequestSummary {
    fn for_actor(model: request::Model, actor: &AuthUser) -> Self {
        Self {
            id: model.id,
            contact_id: model.contact_id,
            goal: model.goal,
            description: model.description,
            internal_notes: access::sees_internal_notes(actor)
                .then_some(model.internal_notes)
                .flatten(),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RequestDetail {
    #[serde(flatten)]
    pub request: RequestSummary,
    pub items: Vec<request_item::Model>,
    /// The "A or B or C" alternatives summary, one line per top-level item.
    pub item_lines: Vec<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SaveRequestRequest {
    /// Defaults to the acting contact; only staff may set someone else.
    pub contact_id: Option<i32>,
    #[validate(length(min = 1))]
    pub goal: String,
    pub description: Option<String>,
    pub internal_notes: Option<String>,
    #[serde(default)]
    pub items: Vec<RequestItemInput>,
}

impl SaveRequestRequest {
    fn into_save(self, actor: &AuthUser) -> Result<SaveRequest, ServiceError> {
        let contact_id = self.contact_id.unwrap_or(actor.contact_id);
        if contact_id != actor.contact_id && !actor.is_superuser {
            return Err(ServiceError::Forbidden(
                "Only staff may act on behalf of another contact".to_string(),
            ));
        }
        Ok(SaveRequest {
            contact_id,
            goal: self.goal,
            description: self.description,
            internal_notes: self.internal_notes,
            items: self.items,
        })
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/requests",
    params(RequestListQuery),
    responses(
        (status = 200, description = "Requests listed", body = ApiResponse<PaginatedResponse<RequestSummary>>)
    ),
    tag = "requests"
)]
pub async fn list_requests(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Query(query): Query<RequestListQuery>,
) -> ApiResult<PaginatedResponse<RequestSummary>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let (rows, total) = state
        .services
        .requests
        .list_requests(&actor, page, limit, query.search)
        .await?;

    let items = rows
        .into_iter()
        .map(|m| RequestSummary::for_actor(m, &actor))
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
    path = "/api/v1/requests/:id",
    params(("id" = i32, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Request fetched", body = ApiResponse<RequestDetail>),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Request not found", body = crate::errors::ErrorResponse)
    ),
    tag = "requests"
)]
pub async fn get_request(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> ApiResult<RequestDetail> {
    let owner = state.services.requests.owner_ctx(id).await?;
    if !access::can_view_aggregate(&actor, &owner) {
        return Err(ServiceError::Forbidden(
            "You may only view your own requests".to_string(),
        ));
    }

    let (request_row, items) = state.services.requests.get_request(id).await?;
    let item_lines = render_item_lines(&items);
    Ok(Json(ApiResponse::success(RequestDetail {
        request: RequestSummary::for_actor(request_row, &actor),
        items,
        item_lines,
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/requests",
    request_body = SaveRequestRequest,
    responses(
        (status = 200, description = "Request created", body = ApiResponse<RequestSummary>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "requests"
)]
pub async fn create_request(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Json(payload): Json<SaveRequestRequest>,
) -> ApiResult<RequestSummary> {
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let input = payload.into_save(&actor)?;
    let created = state.services.requests.create_request(&actor, input).await?;
    Ok(Json(ApiResponse::success(RequestSummary::for_actor(
        created, &actor,
    ))))
}

#[utoipa::path(
    put,
    path = "/api/v1/requests/:id",
    params(("id" = i32, Path, description = "Request ID")),
    request_body = SaveRequestRequest,
    responses(
        (status = 200, description = "Request updated", body = ApiResponse<RequestSummary>),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse)
    ),
    tag = "requests"
)]
pub async fn update_request(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Path(id): Path<i32>,
    Json(payload): Json<SaveRequestRequest>,
) -> ApiResult<RequestSummary> {
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let owner = state.services.requests.owner_ctx(id).await?;
    if !access::can_change_aggregate(&actor, &owner) {
        return Err(ServiceError::Forbidden(
            "You may only change your own requests".to_string(),
        ));
    }

    let input = payload.into_save(&actor)?;
    let updated = state
        .services
        .requests
        .update_request(&actor, id, input)
        .await?;
    Ok(Json(ApiResponse::success(RequestSummary::for_actor(
        updated, &actor,
    ))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/requests/:id",
    params(("id" = i32, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Request deleted", body = ApiResponse<serde_json::Value>),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse)
    ),
    tag = "requests"
)]
pub async fn delete_request(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> ApiResult<serde_json::Value> {
    let owner = state.services.requests.owner_ctx(id).await?;
    if !access::can_change_aggregate(&actor, &owner) {
        return Err(ServiceError::Forbidden(
            "You may only delete your own requests".to_string(),
        ));
    }

    state.services.requests.delete_request(&actor, id).await?;
    Ok(Json(ApiResponse::success(
        serde_json::json!({ "deleted": id }),
    )))
}
