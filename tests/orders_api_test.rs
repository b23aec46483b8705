mod common;

use axum::http::{Method, StatusCode};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;

use common::{read_json, TestApp};
use printdesk_api::entities::{order, order_item};
use rust_decimal_macros::dec;

#[tokio::test]
async fn missing_staff_header_is_unauthorized() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/v1/orders", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .request(Method::GET, "/api/v1/orders", None, Some("   "))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn blank_order_has_defaults() {
    let app = TestApp::new().await;

    let response = app
        .request_as("Alex", Method::POST, "/api/v1/orders", None)
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = read_json(response).await;
    assert_eq!(body["success"], true);
    let order = &body["data"];
    assert!(order["order_number"].as_str().unwrap().starts_with("ORD-"));
    assert_eq!(order["status"], "intake");
    assert_eq!(order["payment_status"], "pending");
    assert_eq!(order["source"], "manual");
    assert_eq!(order["total"], "0.00");
    assert_eq!(order["customer_name"], "");
    assert!(order["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_order_carries_sample_line() {
    let app = TestApp::new().await;

    let response = app
        .request_as("Alex", Method::POST, "/api/v1/orders/test", None)
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let order = read_json(response).await["data"].clone();

    assert_eq!(order["source"], "test");
    assert_eq!(order["subtotal"], "20.00");
    assert_eq!(order["total"], "20.00");
    let items = order["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "Sample T-shirt");
    assert_eq!(items[0]["quantity"], 1);

    let stored_items = order_item::Entity::find()
        .filter(order_item::Column::OrderId.eq(order["id"].as_str().unwrap().parse::<uuid::Uuid>().unwrap()))
        .count(&*app.state.db)
        .await
        .unwrap();
    assert_eq!(stored_items, 1);
}

#[tokio::test]
async fn import_computes_totals_and_validates() {
    let app = TestApp::new().await;

    let payload = json!({
        "customer_name": "Jane Doe",
        "customer_email": "jane@example.com",
        "shipping_address": {"line1": "1 rue de la Paix", "city": "Paris", "country": "FR"},
        "items": [
            {"name": "Hoodie", "quantity": 2, "unit_price": "35.50"},
            {"name": "Cap", "sku": "CAP-01", "quantity": 1, "unit_price": "12.00"}
        ],
        "shipping": "4.90",
        "tax": "1.10"
    });
    let response = app
        .request_as("Alex", Method::POST, "/api/v1/orders/import", Some(payload))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let order = read_json(response).await["data"].clone();
    assert_eq!(order["source"], "external");
    assert_eq!(order["subtotal"], "83.00");
    assert_eq!(order["total"], "89.00");
    assert_eq!(order["shipping_address"]["city"], "Paris");
    assert_eq!(order["items"][1]["sku"], "CAP-01");

    let stored = order::Entity::find_by_id(order["id"].as_str().unwrap().parse::<uuid::Uuid>().unwrap())
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.total, dec!(89.00));
    assert_eq!(stored.shipping, dec!(4.90));
    assert_eq!(stored.currency, "EUR");

    let invalid = json!({
        "customer_name": "Jane Doe",
        "customer_email": "not-an-email",
        "items": []
    });
    let response = app
        .request_as("Alex", Method::POST, "/api/v1/orders/import", Some(invalid))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn import_with_overflowing_amounts_is_rejected() {
    let app = TestApp::new().await;

    let payload = json!({
        "customer_name": "Jane Doe",
        "customer_email": "jane@example.com",
        "items": [
            {"name": "Hoodie", "quantity": 100000, "unit_price": "70000000000000000000000000000"}
        ]
    });
    let response = app
        .request_as("Alex", Method::POST, "/api/v1/orders/import", Some(payload))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let stored = order::Entity::find().count(&*app.state.db).await.unwrap();
    assert_eq!(stored, 0);
}

#[tokio::test]
async fn get_by_id_and_number() {
    let app = TestApp::new().await;
    let created = read_json(
        app.request_as("Alex", Method::POST, "/api/v1/orders", None)
            .await,
    )
    .await["data"]
        .clone();
    let id = created["id"].as_str().unwrap();
    let number = created["order_number"].as_str().unwrap();

    let by_id = app
        .request_as("Alex", Method::GET, &format!("/api/v1/orders/{id}"), None)
        .await;
    assert_eq!(by_id.status(), StatusCode::OK);
    assert_eq!(read_json(by_id).await["data"]["order_number"], number);

    let by_number = app
        .request_as(
            "Alex",
            Method::GET,
            &format!("/api/v1/orders/by-number/{number}"),
            None,
        )
        .await;
    assert_eq!(by_number.status(), StatusCode::OK);
    assert_eq!(read_json(by_number).await["data"]["id"], id);

    let missing = app
        .request_as(
            "Alex",
            Method::GET,
            &format!("/api/v1/orders/{}", uuid::Uuid::new_v4()),
            None,
        )
        .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    let body = read_json(missing).await;
    assert_eq!(body["error"], "Not Found");
    assert!(body["request_id"].is_string());
}

#[tokio::test]
async fn list_is_paginated_and_filtered() {
    let app = TestApp::new().await;
    for _ in 0..3 {
        app.request_as("Alex", Method::POST, "/api/v1/orders", None)
            .await;
    }
    let shipped = read_json(
        app.request_as("Alex", Method::POST, "/api/v1/orders/test", None)
            .await,
    )
    .await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();
    let response = app
        .request_as(
            "Alex",
            Method::PATCH,
            &format!("/api/v1/orders/{shipped}"),
            Some(json!({"status": "shipped"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let page = read_json(
        app.request_as("Alex", Method::GET, "/api/v1/orders?page=1&limit=2", None)
            .await,
    )
    .await;
    assert_eq!(page["data"]["total"], 4);
    assert_eq!(page["data"]["total_pages"], 2);
    assert_eq!(page["data"]["items"].as_array().unwrap().len(), 2);

    let filtered = read_json(
        app.request_as("Alex", Method::GET, "/api/v1/orders?status=shipped", None)
            .await,
    )
    .await;
    assert_eq!(filtered["data"]["total"], 1);
    assert_eq!(filtered["data"]["items"][0]["id"], shipped.as_str());
    assert_eq!(filtered["data"]["items"][0]["items"].as_array().unwrap().len(), 1);

    let bad_filter = app
        .request_as("Alex", Method::GET, "/api/v1/orders?status=teleported", None)
        .await;
    assert_eq!(bad_filter.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_page_far_past_the_end_is_empty() {
    let app = TestApp::new().await;
    app.request_as("Alex", Method::POST, "/api/v1/orders", None)
        .await;

    let response = app
        .request_as(
            "Alex",
            Method::GET,
            "/api/v1/orders?page=18446744073709551615&limit=100",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = read_json(response).await;
    assert_eq!(page["data"]["total"], 1);
    assert_eq!(page["data"]["page"], u64::MAX);
    assert!(page["data"]["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn patch_updates_only_given_fields() {
    let app = TestApp::new().await;
    let id = read_json(
        app.request_as("Alex", Method::POST, "/api/v1/orders", None)
            .await,
    )
    .await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();
    let uri = format!("/api/v1/orders/{id}");

    let order = read_json(
        app.request_as("Alex", Method::PATCH, &uri, Some(json!({"notes": "rush job"})))
            .await,
    )
    .await["data"]
        .clone();
    assert_eq!(order["notes"], "rush job");
    assert_eq!(order["status"], "intake");

    let order = read_json(
        app.request_as(
            "Alex",
            Method::PATCH,
            &uri,
            Some(json!({"payment_status": "paid"})),
        )
        .await,
    )
    .await["data"]
        .clone();
    assert_eq!(order["payment_status"], "paid");
    assert_eq!(order["notes"], "rush job");

    let order = read_json(
        app.request_as("Alex", Method::PATCH, &uri, Some(json!({"notes": ""})))
            .await,
    )
    .await["data"]
        .clone();
    assert!(order["notes"].is_null());

    let unknown = app
        .request_as("Alex", Method::PATCH, &uri, Some(json!({"status": "teleported"})))
        .await;
    assert_eq!(unknown.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn status_edit_signs_the_notes_only_on_fulfillment_change() {
    let app = TestApp::new().await;
    let id = read_json(
        app.request_as("Alex", Method::POST, "/api/v1/orders", None)
            .await,
    )
    .await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();
    let uri = format!("/api/v1/orders/{id}/status-edits");

    let order = read_json(
        app.request_as(
            "Céline",
            Method::POST,
            &uri,
            Some(json!({"status": "in_production", "payment_status": "pending"})),
        )
        .await,
    )
    .await["data"]
        .clone();
    assert_eq!(order["status"], "in_production");
    let notes = order["notes"].as_str().unwrap().to_string();
    assert!(notes.starts_with("status changed by Céline on "));

    // Payment-only change leaves the notes alone.
    let order = read_json(
        app.request_as(
            "Alex",
            Method::POST,
            &uri,
            Some(json!({"status": "in_production", "payment_status": "paid"})),
        )
        .await,
    )
    .await["data"]
        .clone();
    assert_eq!(order["payment_status"], "paid");
    assert_eq!(order["notes"], notes.as_str());

    let order = read_json(
        app.request_as(
            "Alex",
            Method::POST,
            &uri,
            Some(json!({"status": "shipped", "payment_status": "paid"})),
        )
        .await,
    )
    .await["data"]
        .clone();
    let lines: Vec<&str> = order["notes"].as_str().unwrap().lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with("status changed by Alex on "));

    let stored = order::Entity::find_by_id(id.parse::<uuid::Uuid>().unwrap())
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.notes.as_deref(), order["notes"].as_str());
}

#[tokio::test]
async fn status_edit_appends_to_notes_near_the_limit() {
    let app = TestApp::new().await;
    let id = read_json(
        app.request_as("Alex", Method::POST, "/api/v1/orders", None)
            .await,
    )
    .await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();
    let order_uri = format!("/api/v1/orders/{id}");

    let too_long = app
        .request_as(
            "Alex",
            Method::PATCH,
            &order_uri,
            Some(json!({"notes": "x".repeat(20_001)})),
        )
        .await;
    assert_eq!(too_long.status(), StatusCode::BAD_REQUEST);

    let long_notes = "x".repeat(19_990);
    let response = app
        .request_as(
            "Alex",
            Method::PATCH,
            &order_uri,
            Some(json!({"notes": long_notes})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request_as(
            "Alex",
            Method::POST,
            &format!("{order_uri}/status-edits"),
            Some(json!({"status": "archived", "payment_status": "pending"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let order = read_json(response).await["data"].clone();
    assert_eq!(order["status"], "archived");
    let notes = order["notes"].as_str().unwrap();
    assert!(notes.starts_with(&long_notes));
    let (_, signed) = notes.rsplit_once('\n').unwrap();
    assert!(signed.starts_with("status changed by Alex on "));
}

#[tokio::test]
async fn status_edit_on_missing_order_is_not_found() {
    let app = TestApp::new().await;
    let response = app
        .request_as(
            "Alex",
            Method::POST,
            &format!("/api/v1/orders/{}/status-edits", uuid::Uuid::new_v4()),
            Some(json!({"status": "shipped", "payment_status": "paid"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn fulfillment_event_appends_note() {
    let app = TestApp::new().await;
    let id = read_json(
        app.request_as("Alex", Method::POST, "/api/v1/orders/test", None)
            .await,
    )
    .await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();
    let uri = format!("/api/v1/orders/{id}/fulfillment-events");

    let order = read_json(
        app.request_as(
            "fulfillment-bot",
            Method::POST,
            &uri,
            Some(json!({"status": "shipped", "note": "tracking 1Z999"})),
        )
        .await,
    )
    .await["data"]
        .clone();
    assert_eq!(order["status"], "shipped");
    assert_eq!(order["notes"], "tracking 1Z999");

    let order = read_json(
        app.request_as(
            "fulfillment-bot",
            Method::POST,
            &uri,
            Some(json!({"status": "delivered"})),
        )
        .await,
    )
    .await["data"]
        .clone();
    assert_eq!(order["status"], "delivered");
    assert_eq!(order["notes"], "tracking 1Z999");
}

#[tokio::test]
async fn health_and_openapi_are_served() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/health/ready", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["ready"], true);

    let response = app
        .request(Method::GET, "/api-docs/openapi.json", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let doc = read_json(response).await;
    assert!(doc["paths"]["/api/v1/prt-requests"].is_object());

    let response = app.request(Method::GET, "/health", None, None).await;
    assert!(response.headers().contains_key("x-request-id"));
}
