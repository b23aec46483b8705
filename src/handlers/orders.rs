use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{consts as perm, StaffUser};
use crate::dashboard::status_editor::{OrderGateway, StatusEditor};
use crate::models::{FulfillmentStatus, PaymentStatus};
use crate::services::orders::{
    FulfillmentEvent, ImportOrderRequest, OrderDetail, OrderFilter, OrderPatch,
};
use crate::{errors::ServiceError, ApiResponse, ApiResult, AppState, ListQuery, PaginatedResponse};

/// Submission of the order card's status form.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusEditRequest {
    pub status: FulfillmentStatus,
    pub payment_status: PaymentStatus,
}

type Created = (StatusCode, Json<ApiResponse<OrderDetail>>);

fn created(order: OrderDetail) -> Created {
    (StatusCode::CREATED, Json(ApiResponse::success(order)))
}

/// List orders
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    summary = "List orders",
    description = "Newest first, with line items. Filter by fulfillment or payment status.",
    params(
        ("x-staff-name" = String, Header, description = "Display name of the acting staff member"),
        ListQuery
    ),
    responses(
        (status = 200, description = "Orders retrieved successfully", body = ApiResponse<PaginatedResponse<OrderDetail>>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid request parameters", body = crate::errors::ErrorResponse),
        (status = 401, description = "Missing staff identity", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: StaffUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<OrderDetail>>>, ServiceError> {
    user.require(perm::ORDERS_READ)?;

    let page = query.page.max(1);
    let limit = state.config.page_size(query.limit);
    let filter = OrderFilter {
        status: query.status,
        payment_status: query.payment_status,
    };
    let (items, total) = state.orders.list(&filter, page, limit).await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, page, limit,
    ))))
}

/// Create a blank order
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    summary = "Create blank order",
    description = "Creates an order with a generated number, empty customer fields and intake/pending statuses",
    params(("x-staff-name" = String, Header, description = "Display name of the acting staff member")),
    responses(
        (status = 201, description = "Order created", body = ApiResponse<OrderDetail>),
        (status = 401, description = "Missing staff identity", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: StaffUser,
) -> Result<Created, ServiceError> {
    user.require(perm::ORDERS_CREATE)?;
    Ok(created(state.orders.create_blank().await?))
}

/// Create a test order
#[utoipa::path(
    post,
    path = "/api/v1/orders/test",
    summary = "Create test order",
    description = "Creates an order carrying one sample T-shirt line",
    params(("x-staff-name" = String, Header, description = "Display name of the acting staff member")),
    responses(
        (status = 201, description = "Order created", body = ApiResponse<OrderDetail>),
        (status = 401, description = "Missing staff identity", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "Orders"
)]
pub async fn create_test_order(
    State(state): State<AppState>,
    user: StaffUser,
) -> Result<Created, ServiceError> {
    user.require(perm::ORDERS_CREATE)?;
    Ok(created(state.orders.create_test().await?))
}

/// Import an order from an external source
#[utoipa::path(
    post,
    path = "/api/v1/orders/import",
    summary = "Import order",
    request_body = ImportOrderRequest,
    params(("x-staff-name" = String, Header, description = "Display name of the acting staff member")),
    responses(
        (status = 201, description = "Order imported", body = ApiResponse<OrderDetail>),
        (status = 400, description = "Invalid order", body = crate::errors::ErrorResponse),
        (status = 401, description = "Missing staff identity", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "Orders"
)]
pub async fn import_order(
    State(state): State<AppState>,
    user: StaffUser,
    Json(request): Json<ImportOrderRequest>,
) -> Result<Created, ServiceError> {
    user.require(perm::ORDERS_CREATE)?;
    Ok(created(state.orders.import(request).await?))
}

/// Get an order
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    summary = "Get order",
    params(
        ("id" = Uuid, Path, description = "Order ID"),
        ("x-staff-name" = String, Header, description = "Display name of the acting staff member")
    ),
    responses(
        (status = 200, description = "Order retrieved", body = ApiResponse<OrderDetail>),
        (status = 401, description = "Missing staff identity", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: StaffUser,
    Path(id): Path<Uuid>,
) -> ApiResult<OrderDetail> {
    user.require(perm::ORDERS_READ)?;
    Ok(Json(ApiResponse::success(state.orders.get(id).await?)))
}

/// Get an order by its number
#[utoipa::path(
    get,
    path = "/api/v1/orders/by-number/{order_number}",
    summary = "Get order by number",
    description = "Retrieve an order by its public order number (e.g., ORD-1A2B3C4D)",
    params(
        ("order_number" = String, Path, description = "Public order number"),
        ("x-staff-name" = String, Header, description = "Display name of the acting staff member")
    ),
    responses(
        (status = 200, description = "Order retrieved", body = ApiResponse<OrderDetail>),
        (status = 401, description = "Missing staff identity", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    tag = "Orders"
)]
pub async fn get_order_by_number(
    State(state): State<AppState>,
    user: StaffUser,
    Path(order_number): Path<String>,
) -> ApiResult<OrderDetail> {
    user.require(perm::ORDERS_READ)?;
    let order = state.orders.get_by_number(order_number.trim()).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// Partially update an order
#[utoipa::path(
    patch,
    path = "/api/v1/orders/{id}",
    summary = "Update order",
    description = "Any subset of status, payment_status and notes. An empty notes string clears the notes.",
    request_body = OrderPatch,
    params(
        ("id" = Uuid, Path, description = "Order ID"),
        ("x-staff-name" = String, Header, description = "Display name of the acting staff member")
    ),
    responses(
        (status = 200, description = "Updated order", body = ApiResponse<OrderDetail>),
        (status = 400, description = "Invalid update", body = crate::errors::ErrorResponse),
        (status = 401, description = "Missing staff identity", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    tag = "Orders"
)]
pub async fn update_order(
    State(state): State<AppState>,
    user: StaffUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<OrderPatch>,
) -> ApiResult<OrderDetail> {
    user.require(perm::ORDERS_UPDATE)?;
    Ok(Json(ApiResponse::success(state.orders.update(id, patch).await?)))
}

/// Save the status form of an order card
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/status-edits",
    summary = "Save status edit",
    description = "Sends both statuses. When the fulfillment status changes, an audit line naming the staff member is appended to the notes.",
    request_body = StatusEditRequest,
    params(
        ("id" = Uuid, Path, description = "Order ID"),
        ("x-staff-name" = String, Header, description = "Display name of the acting staff member")
    ),
    responses(
        (status = 200, description = "Updated order", body = ApiResponse<OrderDetail>),
        (status = 401, description = "Missing staff identity", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    tag = "Orders"
)]
pub async fn submit_status_edit(
    State(state): State<AppState>,
    user: StaffUser,
    Path(id): Path<Uuid>,
    Json(request): Json<StatusEditRequest>,
) -> ApiResult<OrderDetail> {
    user.require(perm::ORDERS_UPDATE)?;

    let committed = state.orders.get(id).await?;
    let gateway: Arc<dyn OrderGateway> = state.orders.clone();
    let mut editor = StatusEditor::new(gateway, committed);
    editor.select_fulfillment(request.status);
    editor.select_payment(request.payment_status);
    let saved = editor.save(&user.name, Utc::now()).await?.clone();

    Ok(Json(ApiResponse::success(saved)))
}

/// Record a fulfillment event
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/fulfillment-events",
    summary = "Record fulfillment event",
    description = "Status pushed by the fulfillment system; an optional note is appended to the order notes.",
    request_body = FulfillmentEvent,
    params(
        ("id" = Uuid, Path, description = "Order ID"),
        ("x-staff-name" = String, Header, description = "Name of the reporting system or staff member")
    ),
    responses(
        (status = 200, description = "Updated order", body = ApiResponse<OrderDetail>),
        (status = 400, description = "Invalid event", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    tag = "Orders"
)]
pub async fn record_fulfillment_event(
    State(state): State<AppState>,
    user: StaffUser,
    Path(id): Path<Uuid>,
    Json(event): Json<FulfillmentEvent>,
) -> ApiResult<OrderDetail> {
    user.require(perm::ORDERS_UPDATE)?;
    let order = state.orders.record_fulfillment_event(id, event).await?;
    Ok(Json(ApiResponse::success(order)))
}
