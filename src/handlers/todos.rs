use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::auth::{consts as perm, StaffUser};
use crate::dashboard::todos::{Todo, TodoList};
use crate::dashboard::Snapshot;
use crate::{errors::ServiceError, ApiResponse, AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct NewTodo {
    pub text: String,
}

/// Todo list of an order card after an operation.
#[derive(Debug, Serialize, ToSchema)]
pub struct TodoListView {
    pub items: Vec<Todo>,
    pub persisted: bool,
}

impl From<Snapshot<Todo>> for TodoListView {
    fn from(snapshot: Snapshot<Todo>) -> Self {
        Self {
            items: snapshot.items,
            persisted: snapshot.persisted,
        }
    }
}

fn todo_list(state: &AppState, order_id: &str) -> TodoList {
    TodoList::new(Arc::new(state.storage.session()), order_id)
}

/// List the todos of an order card
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}/todos",
    summary = "List order todos",
    params(
        ("id" = String, Path, description = "Order ID"),
        ("x-staff-name" = String, Header, description = "Display name of the acting staff member")
    ),
    responses(
        (status = 200, description = "Todo list", body = ApiResponse<TodoListView>),
        (status = 401, description = "Missing staff identity", body = crate::errors::ErrorResponse),
    ),
    tag = "Order Scratchpads"
)]
pub async fn list_todos(
    State(state): State<AppState>,
    user: StaffUser,
    Path(order_id): Path<String>,
) -> Result<Json<ApiResponse<TodoListView>>, ServiceError> {
    user.require(perm::ORDERS_READ)?;
    let items = todo_list(&state, &order_id).items().await?;
    Ok(Json(ApiResponse::success(Snapshot::stored(items).into())))
}

/// Add a todo
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/todos",
    summary = "Add order todo",
    description = "Blank text leaves the list unchanged.",
    request_body = NewTodo,
    params(
        ("id" = String, Path, description = "Order ID"),
        ("x-staff-name" = String, Header, description = "Display name of the acting staff member")
    ),
    responses(
        (status = 200, description = "Todo list after the change", body = ApiResponse<TodoListView>),
        (status = 401, description = "Missing staff identity", body = crate::errors::ErrorResponse),
    ),
    tag = "Order Scratchpads"
)]
pub async fn add_todo(
    State(state): State<AppState>,
    user: StaffUser,
    Path(order_id): Path<String>,
    Json(body): Json<NewTodo>,
) -> Result<Json<ApiResponse<TodoListView>>, ServiceError> {
    user.require(perm::ORDERS_UPDATE)?;
    let snapshot = todo_list(&state, &order_id).add(&body.text).await?;
    Ok(Json(ApiResponse::success(snapshot.into())))
}

/// Toggle a todo
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/todos/{todo_id}/toggle",
    summary = "Toggle order todo",
    params(
        ("id" = String, Path, description = "Order ID"),
        ("todo_id" = String, Path, description = "Todo ID"),
        ("x-staff-name" = String, Header, description = "Display name of the acting staff member")
    ),
    responses(
        (status = 200, description = "Todo list after the change", body = ApiResponse<TodoListView>),
        (status = 401, description = "Missing staff identity", body = crate::errors::ErrorResponse),
    ),
    tag = "Order Scratchpads"
)]
pub async fn toggle_todo(
    State(state): State<AppState>,
    user: StaffUser,
    Path((order_id, todo_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<TodoListView>>, ServiceError> {
    user.require(perm::ORDERS_UPDATE)?;
    let snapshot = todo_list(&state, &order_id).toggle(&todo_id).await?;
    Ok(Json(ApiResponse::success(snapshot.into())))
}

/// Delete a todo
#[utoipa::path(
    delete,
    path = "/api/v1/orders/{id}/todos/{todo_id}",
    summary = "Delete order todo",
    params(
        ("id" = String, Path, description = "Order ID"),
        ("todo_id" = String, Path, description = "Todo ID"),
        ("x-staff-name" = String, Header, description = "Display name of the acting staff member")
    ),
    responses(
        (status = 200, description = "Todo list after the change", body = ApiResponse<TodoListView>),
        (status = 401, description = "Missing staff identity", body = crate::errors::ErrorResponse),
    ),
    tag = "Order Scratchpads"
)]
pub async fn delete_todo(
    State(state): State<AppState>,
    user: StaffUser,
    Path((order_id, todo_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<TodoListView>>, ServiceError> {
    user.require(perm::ORDERS_UPDATE)?;
    let snapshot = todo_list(&state, &order_id).delete(&todo_id).await?;
    Ok(Json(ApiResponse::success(snapshot.into())))
}
