use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::auth::{consts as perm, StaffUser};
use crate::dashboard::images::ImageSlots;
use crate::dashboard::Snapshot;
use crate::{errors::ServiceError, ApiResponse, AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct NewImage {
    /// `data:image/<png|jpeg|gif|webp>;base64,<payload>`
    pub data_url: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ImageSlotsView {
    pub images: Vec<String>,
    pub max_images: usize,
    pub persisted: bool,
}

impl ImageSlotsView {
    fn from_snapshot(snapshot: Snapshot<String>, max_images: usize) -> Self {
        Self {
            images: snapshot.items,
            max_images,
            persisted: snapshot.persisted,
        }
    }
}

fn image_slots(state: &AppState, order_id: &str) -> ImageSlots {
    ImageSlots::new(
        Arc::new(state.storage.session()),
        order_id,
        state.config.max_order_images,
    )
}

/// List the images of an order card
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}/images",
    summary = "List order images",
    params(
        ("id" = String, Path, description = "Order ID"),
        ("x-staff-name" = String, Header, description = "Display name of the acting staff member")
    ),
    responses(
        (status = 200, description = "Image slots", body = ApiResponse<ImageSlotsView>),
        (status = 401, description = "Missing staff identity", body = crate::errors::ErrorResponse),
    ),
    tag = "Order Scratchpads"
)]
pub async fn list_images(
    State(state): State<AppState>,
    user: StaffUser,
    Path(order_id): Path<String>,
) -> Result<Json<ApiResponse<ImageSlotsView>>, ServiceError> {
    user.require(perm::ORDERS_READ)?;
    let images = image_slots(&state, &order_id).items().await?;
    let view = ImageSlotsView::from_snapshot(Snapshot::stored(images), state.config.max_order_images);
    Ok(Json(ApiResponse::success(view)))
}

/// Attach an image
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/images",
    summary = "Add order image",
    description = "Rejected once the card holds the configured maximum number of images.",
    request_body = NewImage,
    params(
        ("id" = String, Path, description = "Order ID"),
        ("x-staff-name" = String, Header, description = "Display name of the acting staff member")
    ),
    responses(
        (status = 200, description = "Image slots after the change", body = ApiResponse<ImageSlotsView>),
        (status = 400, description = "Invalid image or limit reached", body = crate::errors::ErrorResponse),
        (status = 401, description = "Missing staff identity", body = crate::errors::ErrorResponse),
    ),
    tag = "Order Scratchpads"
)]
pub async fn add_image(
    State(state): State<AppState>,
    user: StaffUser,
    Path(order_id): Path<String>,
    Json(body): Json<NewImage>,
) -> Result<Json<ApiResponse<ImageSlotsView>>, ServiceError> {
    user.require(perm::ORDERS_UPDATE)?;
    let snapshot = image_slots(&state, &order_id).add(&body.data_url).await?;
    let view = ImageSlotsView::from_snapshot(snapshot, state.config.max_order_images);
    Ok(Json(ApiResponse::success(view)))
}

/// Remove an image
#[utoipa::path(
    delete,
    path = "/api/v1/orders/{id}/images/{index}",
    summary = "Remove order image",
    params(
        ("id" = String, Path, description = "Order ID"),
        ("index" = usize, Path, description = "Zero-based slot position"),
        ("x-staff-name" = String, Header, description = "Display name of the acting staff member")
    ),
    responses(
        (status = 200, description = "Image slots after the change", body = ApiResponse<ImageSlotsView>),
        (status = 404, description = "No image at that position", body = crate::errors::ErrorResponse),
    ),
    tag = "Order Scratchpads"
)]
pub async fn remove_image(
    State(state): State<AppState>,
    user: StaffUser,
    Path((order_id, index)): Path<(String, usize)>,
) -> Result<Json<ApiResponse<ImageSlotsView>>, ServiceError> {
    user.require(perm::ORDERS_UPDATE)?;
    let snapshot = image_slots(&state, &order_id).remove(index).await?;
    let view = ImageSlotsView::from_snapshot(snapshot, state.config.max_order_images);
    Ok(Json(ApiResponse::success(view)))
}
