use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::{consts as perm, StaffUser};
use crate::requests::{PrtRequest, RequestDraft, RequestPanel, RequestStatus};
use crate::{errors::ServiceError, ApiResponse, AppState};

/// The queue as seen after an operation.
#[derive(Debug, Serialize, ToSchema)]
pub struct RequestQueueView {
    pub entries: Vec<PrtRequest>,
    /// False when the last write failed and storage lags behind `entries`
    pub persisted: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubmittedRequest {
    pub request: PrtRequest,
    pub persisted: bool,
    /// How long the dashboard should show the "request sent" indicator
    pub feedback_ms: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdvancedRequest {
    pub id: String,
    pub status: RequestStatus,
    pub persisted: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClearedRequests {
    pub removed: usize,
    pub entries: Vec<PrtRequest>,
    pub persisted: bool,
}

async fn open_panel(state: &AppState) -> Result<RequestPanel, ServiceError> {
    Ok(RequestPanel::open(&state.storage, state.config.request_feedback()).await?)
}

fn queue_view(panel: &RequestPanel) -> RequestQueueView {
    RequestQueueView {
        entries: panel.entries().to_vec(),
        persisted: !panel.is_diverged(),
    }
}

/// List PRT requests
#[utoipa::path(
    get,
    path = "/api/v1/prt-requests",
    summary = "List PRT requests",
    description = "Newest first.",
    params(("x-staff-name" = String, Header, description = "Display name of the acting staff member")),
    responses(
        (status = 200, description = "Current queue", body = ApiResponse<RequestQueueView>),
        (status = 401, description = "Missing staff identity", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "PRT Requests"
)]
pub async fn list_requests(
    State(state): State<AppState>,
    _user: StaffUser,
) -> Result<Json<ApiResponse<RequestQueueView>>, ServiceError> {
    let panel = open_panel(&state).await?;
    Ok(Json(ApiResponse::success(queue_view(&panel))))
}

/// Submit a PRT request
#[utoipa::path(
    post,
    path = "/api/v1/prt-requests",
    summary = "Submit PRT request",
    description = "Prepends a new request. Size and color must be non-blank and quantity at least 1.",
    request_body = RequestDraft,
    params(("x-staff-name" = String, Header, description = "Display name of the acting staff member")),
    responses(
        (status = 201, description = "Request queued", body = ApiResponse<SubmittedRequest>),
        (status = 400, description = "Invalid request form", body = crate::errors::ErrorResponse),
        (status = 401, description = "Missing staff identity", body = crate::errors::ErrorResponse),
    ),
    tag = "PRT Requests"
)]
pub async fn submit_request(
    State(state): State<AppState>,
    user: StaffUser,
    Json(draft): Json<RequestDraft>,
) -> Result<(StatusCode, Json<ApiResponse<SubmittedRequest>>), ServiceError> {
    user.require(perm::REQUESTS_SUBMIT)?;

    let mut panel = open_panel(&state).await?;
    let request = panel.submit_draft(draft, &user).await?;
    let submitted = SubmittedRequest {
        request,
        persisted: !panel.is_diverged(),
        feedback_ms: state.config.request_feedback_ms,
    };
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(submitted, "Request sent")),
    ))
}

/// Advance a PRT request
#[utoipa::path(
    post,
    path = "/api/v1/prt-requests/{id}/advance",
    summary = "Advance PRT request",
    description = "new -> seen -> done. Advancing a done request changes nothing. Recipients only.",
    params(
        ("id" = String, Path, description = "PRT request ID"),
        ("x-staff-name" = String, Header, description = "Display name of the acting staff member")
    ),
    responses(
        (status = 200, description = "Request advanced", body = ApiResponse<AdvancedRequest>),
        (status = 403, description = "Not a request recipient", body = crate::errors::ErrorResponse),
        (status = 404, description = "Request not found", body = crate::errors::ErrorResponse),
    ),
    tag = "PRT Requests"
)]
pub async fn advance_request(
    State(state): State<AppState>,
    user: StaffUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<AdvancedRequest>>, ServiceError> {
    let mut panel = open_panel(&state).await?;
    let status = panel.advance(&id, &user).await?;
    Ok(Json(ApiResponse::success(AdvancedRequest {
        id,
        status,
        persisted: !panel.is_diverged(),
    })))
}

/// Remove a PRT request
#[utoipa::path(
    delete,
    path = "/api/v1/prt-requests/{id}",
    summary = "Remove PRT request",
    description = "Allowed to recipients and to the staff member who submitted the request.",
    params(
        ("id" = String, Path, description = "PRT request ID"),
        ("x-staff-name" = String, Header, description = "Display name of the acting staff member")
    ),
    responses(
        (status = 200, description = "Request removed", body = ApiResponse<RequestQueueView>),
        (status = 403, description = "Not allowed to remove this request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Request not found", body = crate::errors::ErrorResponse),
    ),
    tag = "PRT Requests"
)]
pub async fn remove_request(
    State(state): State<AppState>,
    user: StaffUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<RequestQueueView>>, ServiceError> {
    let mut panel = open_panel(&state).await?;
    panel.remove(&id, &user).await?;
    Ok(Json(ApiResponse::success(queue_view(&panel))))
}

/// Clear done PRT requests
#[utoipa::path(
    delete,
    path = "/api/v1/prt-requests/done",
    summary = "Clear done requests",
    description = "Removes every done request, keeping the order of the others. Recipients only.",
    params(("x-staff-name" = String, Header, description = "Display name of the acting staff member")),
    responses(
        (status = 200, description = "Done requests cleared", body = ApiResponse<ClearedRequests>),
        (status = 403, description = "Not a request recipient", body = crate::errors::ErrorResponse),
    ),
    tag = "PRT Requests"
)]
pub async fn clear_done(
    State(state): State<AppState>,
    user: StaffUser,
) -> Result<Json<ApiResponse<ClearedRequests>>, ServiceError> {
    let mut panel = open_panel(&state).await?;
    let removed = panel.clear_done(&user).await?;
    Ok(Json(ApiResponse::success(ClearedRequests {
        removed,
        entries: panel.entries().to_vec(),
        persisted: !panel.is_diverged(),
    })))
}
