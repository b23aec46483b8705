use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Method, Request},
    Router,
};
use printdesk_api::{
    auth::STAFF_NAME_HEADER,
    config::AppConfig,
    db::{self, DbConfig},
    storage::{MemoryStore, SharedStorage},
    AppState,
};
use serde_json::Value;
use tower::ServiceExt;

/// Application wired to a fresh in-memory SQLite database and an in-memory
/// shared storage area.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_storage(SharedStorage::in_memory()).await
    }

    /// Storage area whose writes fail once `quota_bytes` would be exceeded.
    #[allow(dead_code)]
    pub async fn with_storage_quota(quota_bytes: usize) -> Self {
        Self::with_storage(SharedStorage::new(Arc::new(MemoryStore::with_quota(
            quota_bytes,
        ))))
        .await
    }

    pub async fn with_storage(storage: SharedStorage) -> Self {
        let pool = db::establish_connection_with_config(&DbConfig::in_memory_sqlite())
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "development".to_string(),
        );

        let state = AppState::with_storage(Arc::new(pool), cfg, storage);
        let router = printdesk_api::app(state.clone());
        Self { router, state }
    }

    /// Send a request, optionally as the named staff member.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        staff: Option<&str>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(name) = staff {
            builder = builder.header(STAFF_NAME_HEADER, name.as_bytes());
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Convenience helper for requests made by `staff`.
    pub async fn request_as(
        &self,
        staff: &str,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        self.request(method, uri, body, Some(staff)).await
    }
}

/// Reads a response body as JSON.
pub async fn read_json(response: axum::response::Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    serde_json::from_slice(&bytes).expect("parse response body")
}
