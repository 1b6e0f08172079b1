//! End-to-end HTTP tests against the in-memory store.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use rail_api::{app, state::{AppState, AuthConfig}};
use rail_core::{BookingPolicy, MemoryStore};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const ADMIN_KEY: &str = "test-admin-key";

fn test_app() -> Router {
    let auth = AuthConfig {
        secret: "test-secret".into(),
        expiration: 3600,
        admin_api_key: ADMIN_KEY.into(),
    };
    app(AppState::new(Arc::new(MemoryStore::new()), BookingPolicy::default(), auth))
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    headers: &[(&str, &str)],
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

async fn register_and_login(app: &Router, email: &str) -> String {
    let (status, _) = send(
        app,
        "POST",
        "/auth/register",
        &[],
        Some(json!({ "name": "Priya", "email": email, "password": "pa55word", "role": "customer" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        app,
        "POST",
        "/auth/login",
        &[],
        Some(json!({ "email": email, "password": "pa55word" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

async fn add_train(app: &Router, seats: i32) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/admin/train",
        &[("api-key", ADMIN_KEY)],
        Some(json!({ "name": "Rajdhani", "source": "NDLS", "destination": "HWH", "seats": seats })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["seats"], seats);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_booking_flow() {
    let app = test_app();
    let token = register_and_login(&app, "priya@example.com").await;
    let bearer = format!("Bearer {}", token);
    let train_id = add_train(&app, 5).await;

    let (status, body) = send(
        &app,
        "POST",
        "/booking/book",
        &[("Authorization", bearer.as_str())],
        Some(json!({ "trainId": train_id, "seats": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Booking successful");
    assert_eq!(body["remainingSeats"], 0);

    // Legacy `token` header works too.
    let (status, body) = send(
        &app,
        "POST",
        "/booking/book",
        &[("token", token.as_str())],
        Some(json!({ "trainId": train_id, "seats": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "insufficient_capacity");

    let (status, body) = send(&app, "GET", "/booking/booking", &[("Authorization", bearer.as_str())], None).await;
    assert_eq!(status, StatusCode::OK);
    let bookings = body.as_array().unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0]["seats"], 5);
    assert_eq!(bookings[0]["train"]["id"], train_id.as_str());
    assert_eq!(bookings[0]["train"]["seats"], 0);
}

#[tokio::test]
async fn test_availability_filters_by_route() {
    let app = test_app();
    add_train(&app, 10).await;
    let (status, _) = send(
        &app,
        "POST",
        "/admin/train",
        &[("api-key", ADMIN_KEY)],
        Some(json!({ "name": "Duronto", "source": "HWH", "destination": "NDLS", "seats": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, first) = send(&app, "GET", "/booking/availability?source=NDLS&destination=HWH", &[], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first.as_array().unwrap().len(), 1);
    assert_eq!(first[0]["name"], "Rajdhani");

    let (_, second) = send(&app, "GET", "/booking/availability?source=NDLS&destination=HWH", &[], None).await;
    assert_eq!(first, second);

    let (_, all) = send(&app, "GET", "/booking/availability", &[], None).await;
    assert_eq!(all.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_admin_requires_api_key() {
    let app = test_app();
    let body = json!({ "name": "X", "source": "A", "destination": "B", "seats": 1 });

    let (status, _) = send(&app, "POST", "/admin/train", &[], Some(body.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "POST", "/admin/train", &[("api-key", "wrong")], Some(body.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Same length as the real key, last byte differs.
    let (status, _) =
        send(&app, "POST", "/admin/train", &[("api-key", "test-admin-kez")], Some(body.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) =
        send(&app, "POST", "/admin/train", &[("api-key", "test-admin-key-2")], Some(body.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, all) = send(&app, "GET", "/booking/availability", &[], None).await;
    assert!(all.as_array().unwrap().is_empty());

    let (status, _) = send(&app, "POST", "/admin/train", &[("api-key", ADMIN_KEY)], Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_booking_requires_valid_token() {
    let app = test_app();
    let train_id = add_train(&app, 5).await;
    let body = json!({ "trainId": train_id, "seats": 1 });

    let (status, _) = send(&app, "POST", "/booking/book", &[], Some(body.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "POST", "/booking/book", &[("token", "not-a-jwt")], Some(body)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_booking_errors_are_distinguishable() {
    let app = test_app();
    let token = register_and_login(&app, "dev@example.com").await;
    let auth = format!("Bearer {}", token);
    let train_id = add_train(&app, 2).await;

    let (status, body) = send(
        &app,
        "POST",
        "/booking/book",
        &[("Authorization", auth.as_str())],
        Some(json!({ "trainId": train_id, "seats": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");

    let (status, body) = send(
        &app,
        "POST",
        "/booking/book",
        &[("Authorization", auth.as_str())],
        Some(json!({ "trainId": train_id })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");

    let (status, body) = send(
        &app,
        "POST",
        "/booking/book",
        &[("Authorization", auth.as_str())],
        Some(json!({ "trainId": uuid::Uuid::new_v4(), "seats": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");

    let (_, trains) = send(&app, "GET", "/booking/availability", &[], None).await;
    assert_eq!(trains[0]["seats"], 2);
}

#[tokio::test]
async fn test_register_and_login_errors() {
    let app = test_app();

    let (status, _) = send(&app, "POST", "/auth/register", &[], Some(json!({ "email": "a@b.c" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/auth/register",
        &[],
        Some(json!({ "name": "A", "email": "a@b.c", "password": "pw", "role": "pilot" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    register_and_login(&app, "dup@example.com").await;
    let (status, body) = send(
        &app,
        "POST",
        "/auth/register",
        &[],
        Some(json!({ "name": "B", "email": "dup@example.com", "password": "pw", "role": "admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "duplicate");

    let (status, _) = send(
        &app,
        "POST",
        "/auth/login",
        &[],
        Some(json!({ "email": "dup@example.com", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "POST", "/auth/login", &[], Some(json!({ "email": "dup@example.com" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
