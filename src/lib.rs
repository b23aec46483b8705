//! Printdesk API Library
//!
//! Order desk backend for a print and apparel shop: order intake and status
//! tracking, per-order scratchpads and the PRT request queue.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod health;
pub mod middleware_helpers;
pub mod migrator;
pub mod models;
pub mod openapi;
pub mod requests;
pub mod services;
pub mod storage;
pub mod tracing;

use axum::{
    extract::FromRef,
    http::HeaderValue,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::{IntoParams, ToSchema};

use crate::auth::RoleResolver;
use crate::models::{FulfillmentStatus, PaymentStatus};
use crate::storage::{KeyValueStore, MemoryStore, SharedStorage, SqlStore};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<config::AppConfig>,
    pub orders: Arc<services::orders::OrderService>,
    pub storage: SharedStorage,
    pub roles: Arc<RoleResolver>,
}

impl AppState {
    /// Wires services from a connected pool and the loaded configuration.
    pub fn new(db: Arc<DatabaseConnection>, config: config::AppConfig) -> Self {
        let backend = storage_backend(&config, db.clone());
        Self::with_storage(db, config, SharedStorage::new(backend))
    }

    pub fn with_storage(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        storage: SharedStorage,
    ) -> Self {
        let orders = Arc::new(services::orders::OrderService::new(
            db.clone(),
            config.default_currency.clone(),
        ));
        let roles = Arc::new(RoleResolver::from_config(&config));
        Self {
            db,
            config: Arc::new(config),
            orders,
            storage,
            roles,
        }
    }
}

impl FromRef<AppState> for Arc<RoleResolver> {
    fn from_ref(state: &AppState) -> Self {
        state.roles.clone()
    }
}

/// Picks the key/value backend named by `local_store_backend`.
pub fn storage_backend(
    config: &config::AppConfig,
    db: Arc<DatabaseConnection>,
) -> Arc<dyn KeyValueStore> {
    match config.local_store_backend.to_ascii_lowercase().as_str() {
        "memory" => match config.local_store_quota_bytes {
            Some(quota) => Arc::new(MemoryStore::with_quota(quota)),
            None => Arc::new(MemoryStore::new()),
        },
        _ => Arc::new(SqlStore::new(db)),
    }
}

/// CORS from configuration; `None` when origins are required but missing.
pub fn cors_layer(config: &config::AppConfig) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if !origins.is_empty() {
        Some(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else if config.should_allow_permissive_cors() {
        Some(CorsLayer::permissive())
    } else {
        None
    }
}

// Common query parameters for list endpoints
#[derive(Debug, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    /// Page size, capped by configuration
    pub limit: Option<u64>,
    pub status: Option<FulfillmentStatus>,
    pub payment_status: Option<PaymentStatus>,
}

fn default_page() -> u64 {
    1
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: u64, page: u64, limit: u64) -> Self {
        let total_pages = if limit == 0 { 0 } else { total.div_ceil(limit) };
        Self {
            items,
            total,
            page,
            limit,
            total_pages,
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::success(data)
        }
    }
}


/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

pub fn api_v1_routes() -> Router<AppState> {
    let orders = Router::new()
        .route(
            "/orders",
            get(handlers::orders::list_orders).post(handlers::orders::create_order),
        )
        .route("/orders/test", post(handlers::orders::create_test_order))
        .route("/orders/import", post(handlers::orders::import_order))
        .route(
            "/orders/by-number/:order_number",
            get(handlers::orders::get_order_by_number),
        )
        .route(
            "/orders/:id",
            get(handlers::orders::get_order).patch(handlers::orders::update_order),
        )
        .route(
            "/orders/:id/status-edits",
            post(handlers::orders::submit_status_edit),
        )
        .route(
            "/orders/:id/fulfillment-events",
            post(handlers::orders::record_fulfillment_event),
        );

    let scratchpads = Router::new()
        .route(
            "/orders/:id/todos",
            get(handlers::todos::list_todos).post(handlers::todos::add_todo),
        )
        .route(
            "/orders/:id/todos/:todo_id/toggle",
            post(handlers::todos::toggle_todo),
        )
        .route(
            "/orders/:id/todos/:todo_id",
            delete(handlers::todos::delete_todo),
        )
        .route(
            "/orders/:id/images",
            get(handlers::images::list_images).post(handlers::images::add_image),
        )
        .route(
            "/orders/:id/images/:index",
            delete(handlers::images::remove_image),
        );

    let prt_requests = Router::new()
        .route(
            "/prt-requests",
            get(handlers::requests::list_requests).post(handlers::requests::submit_request),
        )
        .route("/prt-requests/done", delete(handlers::requests::clear_done))
        .route(
            "/prt-requests/:id/advance",
            post(handlers::requests::advance_request),
        )
        .route("/prt-requests/:id", delete(handlers::requests::remove_request));

    Router::new()
        .merge(orders)
        .merge(scratchpads)
        .merge(prt_requests)
        .route(
            "/storage/events",
            get(handlers::storage_events::storage_events),
        )
}

/// Full application router without CORS, which depends on deployment.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "printdesk-api up" }))
        .nest("/api/v1", api_v1_routes())
        .nest("/health", health::health_routes())
        .merge(openapi::openapi_routes())
        .layer(crate::tracing::configure_http_tracing())
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}
