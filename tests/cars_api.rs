mod common;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use car_records_server::routes::build_router;
use common::{Harness, harness, token_for};
use serde_json::{Value, json};
use tower::ServiceExt;

fn app(h: &Harness) -> Router {
    build_router(h.app_state())
}

fn request(method: &str, uri: &str, user: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("Authorization", format!("Bearer {}", token_for(user)));
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

async fn create(app: &Router, user: &str) -> Value {
    let (status, body) = send(
        app,
        request(
            "POST",
            "/cars",
            Some(user),
            Some(json!({"name": "Errand", "dueDate": "2024-01-01"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["item"].clone()
}

#[tokio::test]
async fn health_is_public() {
    let h = harness();
    let (status, body) = send(&app(&h), request("GET", "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn missing_or_bad_token_is_401() {
    let h = harness();
    let app = app(&h);

    let (status, body) = send(&app, request("GET", "/cars", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "unauthorized");

    let bad = Request::builder()
        .uri("/cars")
        .header("Authorization", "Bearer not.a.token")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, bad).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let wrong_scheme = Request::builder()
        .uri("/cars")
        .header("Authorization", format!("Basic {}", token_for("alice")))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, wrong_scheme).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_returns_201_with_generated_fields() {
    let h = harness();
    let app = app(&h);

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/cars",
            Some("alice"),
            Some(json!({
                "name": "Errand",
                "dueDate": "2024-01-01",
                "userId": "mallory",
                "carId": "00000000-0000-0000-0000-000000000000"
            })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let item = &body["item"];
    assert_eq!(item["name"], "Errand");
    assert_eq!(item["dueDate"], "2024-01-01");
    assert_eq!(item["done"], false);
    assert_eq!(item["userId"], "alice");
    assert_ne!(item["carId"], "00000000-0000-0000-0000-000000000000");
    assert!(item["createdAt"].is_string());
}

#[tokio::test]
async fn blank_name_is_400() {
    let h = harness();
    let (status, body) = send(
        &app(&h),
        request(
            "POST",
            "/cars",
            Some("alice"),
            Some(json!({"name": "", "dueDate": "2024-01-01"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_request");
}

#[tokio::test]
async fn list_wraps_items_and_is_scoped() {
    let h = harness();
    let app = app(&h);
    let car = create(&app, "alice").await;
    create(&app, "bob").await;

    let (status, body) = send(&app, request("GET", "/cars", Some("alice"), None)).await;
    assert_eq!(status, StatusCode::OK);
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["carId"], car["carId"]);
}

#[tokio::test]
async fn patch_updates_and_foreign_patch_is_404() {
    let h = harness();
    let app = app(&h);
    let car = create(&app, "alice").await;
    let uri = format!("/cars/{}", car["carId"].as_str().unwrap());
    let patch = json!({"name": "Tyres", "dueDate": "2024-03-01", "done": true});

    let (status, _) = send(&app, request("PATCH", &uri, Some("bob"), Some(patch.clone()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, request("PATCH", &uri, Some("alice"), Some(patch))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["item"]["name"], "Tyres");
    assert_eq!(body["item"]["done"], true);
    assert_eq!(body["item"]["createdAt"], car["createdAt"]);
}

#[tokio::test]
async fn delete_is_204_then_404() {
    let h = harness();
    let app = app(&h);
    let car = create(&app, "alice").await;
    let uri = format!("/cars/{}", car["carId"].as_str().unwrap());

    let (status, _) = send(&app, request("DELETE", &uri, Some("alice"), None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&app, request("GET", "/cars", Some("alice"), None)).await;
    assert!(body["items"].as_array().unwrap().is_empty());

    let (status, body) = send(&app, request("DELETE", &uri, Some("alice"), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "car_not_found");
}

#[tokio::test]
async fn attachment_issues_url_only_for_owned_car() {
    let h = harness();
    let app = app(&h);
    let car = create(&app, "alice").await;
    let car_id = car["carId"].as_str().unwrap();
    let uri = format!("/cars/{car_id}/attachment");

    let (status, _) = send(&app, request("POST", &uri, Some("bob"), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(h.issuer.calls(), 0);

    let (status, body) = send(&app, request("POST", &uri, Some("alice"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["uploadUrl"].as_str().unwrap().contains(car_id));

    let (_, body) = send(&app, request("GET", "/cars", Some("alice"), None)).await;
    assert_eq!(
        body["items"][0]["attachmentUrl"],
        format!("https://car-images.s3.amazonaws.com/{car_id}")
    );
}

#[tokio::test]
async fn store_failure_is_500_without_details() {
    let h = harness();
    let app = app(&h);
    let car = create(&app, "alice").await;
    h.store.fail_attachment_updates();

    let uri = format!("/cars/{}/attachment", car["carId"].as_str().unwrap());
    let (status, body) = send(&app, request("POST", &uri, Some("alice"), None)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["message"], "An internal error occurred");
}

#[tokio::test]
async fn health_reports_unreachable_store() {
    let h = harness();
    h.store.go_offline();

    let (status, body) = send(&app(&h), request("GET", "/health", None, None)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "internal_error");
}

#[tokio::test]
async fn malformed_due_date_is_400_json() {
    let h = harness();
    let (status, body) = send(
        &app(&h),
        request(
            "POST",
            "/cars",
            Some("alice"),
            Some(json!({"name": "Errand", "dueDate": "not-a-date"})),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_request");
    assert!(body["error"]["message"].as_str().unwrap().contains("dueDate"));
    assert_eq!(h.store.len(), 0);
}

#[tokio::test]
async fn patch_without_done_is_400_json() {
    let h = harness();
    let app = app(&h);
    let car = create(&app, "alice").await;
    let uri = format!("/cars/{}", car["carId"].as_str().unwrap());

    let (status, body) = send(
        &app,
        request(
            "PATCH",
            &uri,
            Some("alice"),
            Some(json!({"name": "Tyres", "dueDate": "2024-03-01"})),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_request");
    assert!(body["error"]["message"].as_str().unwrap().contains("done"));
}

#[tokio::test]
async fn body_without_json_content_type_is_400_json() {
    let h = harness();
    let plain = Request::builder()
        .method("POST")
        .uri("/cars")
        .header("Authorization", format!("Bearer {}", token_for("alice")))
        .body(Body::from(r#"{"name":"Errand","dueDate":"2024-01-01"}"#))
        .unwrap();

    let (status, body) = send(&app(&h), plain).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_request");
}

#[tokio::test]
async fn non_uuid_car_id_is_404_json() {
    let h = harness();
    let app = app(&h);

    let (status, body) = send(&app, request("DELETE", "/cars/not-a-uuid", Some("alice"), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "car_not_found");

    let (status, body) = send(
        &app,
        request("POST", "/cars/not-a-uuid/attachment", Some("alice"), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "car_not_found");
    assert_eq!(h.issuer.calls(), 0);
}
