mod common;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use common::{read_json, TestApp};

const PNG: &str = "data:image/png;base64,iVBORw0KGgo=";

async fn data(response: axum::response::Response) -> Value {
    assert_eq!(response.status(), StatusCode::OK);
    read_json(response).await["data"].clone()
}

#[tokio::test]
async fn todo_lifecycle() {
    let app = TestApp::new().await;
    let base = "/api/v1/orders/order-1/todos";

    let list = data(
        app.request_as("Alex", Method::POST, base, Some(json!({"text": "  check proof  "})))
            .await,
    )
    .await;
    assert_eq!(list["persisted"], true);
    let todo = list["items"][0].clone();
    assert_eq!(todo["text"], "check proof");
    assert_eq!(todo["done"], false);
    let id = todo["id"].as_str().unwrap();

    // Blank text is ignored.
    let list = data(
        app.request_as("Alex", Method::POST, base, Some(json!({"text": "   "})))
            .await,
    )
    .await;
    assert_eq!(list["items"].as_array().unwrap().len(), 1);

    let list = data(
        app.request_as("Alex", Method::POST, &format!("{base}/{id}/toggle"), None)
            .await,
    )
    .await;
    assert_eq!(list["items"][0]["done"], true);

    // Unknown ids change nothing.
    let list = data(
        app.request_as("Alex", Method::DELETE, &format!("{base}/missing"), None)
            .await,
    )
    .await;
    assert_eq!(list["items"].as_array().unwrap().len(), 1);

    let list = data(
        app.request_as("Alex", Method::DELETE, &format!("{base}/{id}"), None)
            .await,
    )
    .await;
    assert!(list["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn todos_are_scoped_per_order() {
    let app = TestApp::new().await;
    app.request_as(
        "Alex",
        Method::POST,
        "/api/v1/orders/a/todos",
        Some(json!({"text": "fold"})),
    )
    .await;

    let other = data(
        app.request_as("Alex", Method::GET, "/api/v1/orders/b/todos", None)
            .await,
    )
    .await;
    assert!(other["items"].as_array().unwrap().is_empty());

    let same = data(
        app.request_as("Sam", Method::GET, "/api/v1/orders/a/todos", None)
            .await,
    )
    .await;
    assert_eq!(same["items"][0]["text"], "fold");
}

#[tokio::test]
async fn images_respect_the_slot_limit() {
    let app = TestApp::new().await;
    let base = "/api/v1/orders/order-1/images";

    for _ in 0..2 {
        let slots = data(
            app.request_as("Alex", Method::POST, base, Some(json!({"data_url": PNG})))
                .await,
        )
        .await;
        assert_eq!(slots["max_images"], 2);
    }

    let response = app
        .request_as("Alex", Method::POST, base, Some(json!({"data_url": PNG})))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let slots = data(
        app.request_as("Alex", Method::DELETE, &format!("{base}/0"), None)
            .await,
    )
    .await;
    assert_eq!(slots["images"].as_array().unwrap().len(), 1);

    let response = app
        .request_as("Alex", Method::DELETE, &format!("{base}/5"), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn images_must_be_base64_data_urls() {
    let app = TestApp::new().await;
    let base = "/api/v1/orders/order-1/images";

    for bad in [
        "https://example.com/a.png",
        "data:image/svg+xml;base64,PHN2Zz4=",
        "data:image/png;base64,***",
    ] {
        let response = app
            .request_as("Alex", Method::POST, base, Some(json!({"data_url": bad})))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{bad}");
    }

    let slots = data(app.request_as("Alex", Method::GET, base, None).await).await;
    assert!(slots["images"].as_array().unwrap().is_empty());
}
