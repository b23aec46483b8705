use axum::{routing::get, Json, Router};
use utoipa::OpenApi;

use crate::AppState;

pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Printdesk API",
        version = "1.0.0",
        description = r#"
# Printdesk API

Order desk backend for a print and apparel shop.

## Features

- **Orders**: blank, test and imported orders, status and payment tracking
- **Status editor**: status changes are signed in the order notes
- **Order scratchpads**: per-order todo list and image slots
- **PRT requests**: production/supply requests routed to the designated recipients

## Identity

Every endpoint expects the acting staff member's display name in the
`x-staff-name` header. Managing PRT requests is reserved to the configured
recipients.

## Error Handling

```json
{
  "error": "Bad Request",
  "message": "Validation error: size is required",
  "request_id": "4f0c...",
  "timestamp": "2026-01-01T00:00:00Z"
}
```

## Pagination

`page` (default 1) and `limit` (default and cap from configuration).
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Orders", description = "Order intake and status tracking"),
        (name = "Order Scratchpads", description = "Per-order todos and images"),
        (name = "PRT Requests", description = "Production/supply request queue")
    ),
    paths(
        // Orders
        crate::handlers::orders::list_orders,
        crate::handlers::orders::create_order,
        crate::handlers::orders::create_test_order,
        crate::handlers::orders::import_order,
        crate::handlers::orders::get_order,
        crate::handlers::orders::get_order_by_number,
        crate::handlers::orders::update_order,
        crate::handlers::orders::submit_status_edit,
        crate::handlers::orders::record_fulfillment_event,

        // Scratchpads
        crate::handlers::todos::list_todos,
        crate::handlers::todos::add_todo,
        crate::handlers::todos::toggle_todo,
        crate::handlers::todos::delete_todo,
        crate::handlers::images::list_images,
        crate::handlers::images::add_image,
        crate::handlers::images::remove_image,

        // PRT requests
        crate::handlers::requests::list_requests,
        crate::handlers::requests::submit_request,
        crate::handlers::requests::advance_request,
        crate::handlers::requests::remove_request,
        crate::handlers::requests::clear_done,
        crate::handlers::storage_events::storage_events,
    ),
    components(
        schemas(
            crate::ListQuery,

            // Order types
            crate::services::orders::OrderDetail,
            crate::services::orders::OrderItemView,
            crate::services::orders::OrderPatch,
            crate::services::orders::FulfillmentEvent,
            crate::services::orders::ImportOrderRequest,
            crate::services::orders::ImportOrderItem,
            crate::handlers::orders::StatusEditRequest,
            crate::models::FulfillmentStatus,
            crate::models::PaymentStatus,
            crate::models::OrderSource,
            crate::models::ShippingAddress,

            // Scratchpad types
            crate::dashboard::todos::Todo,
            crate::handlers::todos::NewTodo,
            crate::handlers::todos::TodoListView,
            crate::handlers::images::NewImage,
            crate::handlers::images::ImageSlotsView,

            // PRT request types
            crate::requests::PrtRequest,
            crate::requests::RequestDraft,
            crate::requests::RequestCategory,
            crate::requests::RequestStatus,
            crate::handlers::requests::RequestQueueView,
            crate::handlers::requests::SubmittedRequest,
            crate::handlers::requests::AdvancedRequest,
            crate::handlers::requests::ClearedRequests,

            // Error types
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

/// Serves the generated document as JSON.
pub fn openapi_routes() -> Router<AppState> {
    Router::new().route(OPENAPI_JSON_PATH, get(|| async { Json(ApiDocV1::openapi()) }))
}
