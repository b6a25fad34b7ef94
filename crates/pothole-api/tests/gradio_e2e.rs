//! Full router against a mock Gradio service.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use pothole_api::{create_router, ApiConfig, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{detect_request, image_part, json_body, png_bytes, Part};

async fn mock_gradio() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"version": "4.44.1"})))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["/tmp/gradio/abc/road.png"])))
        .mount(&server)
        .await;

    server
}

fn router_for(server: &MockServer, inference_timeout: Duration) -> axum::Router {
    let config = ApiConfig {
        inference_base_url: server.uri(),
        inference_timeout,
        ..ApiConfig::default()
    };
    let state = AppState::new(config).unwrap();
    create_router(state, None)
}

#[tokio::test]
async fn test_detect_through_gradio() {
    let server = mock_gradio().await;

    let payload = json!({
        "count": 2,
        "detections": [
            {"id": 0, "class": "pothole", "confidence": 0.88, "box": {"x1": 1, "y1": 2, "x2": 30, "y2": 40}},
            {"id": 1, "class": "pothole", "confidence": 0.2, "box": {"x1": 50, "y1": 50, "x2": 40, "y2": 90}}
        ],
        "severity": 12.5,
        "latency_ms": 95.0
    });

    Mock::given(method("POST"))
        .and(path("/run/predict"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"path": "/tmp/gradio/out/annotated.webp", "url": null},
                payload.to_string(),
                "Critical",
                "95 ms"
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let app = router_for(&server, Duration::from_secs(5));
    let response = app
        .oneshot(detect_request(&[
            image_part("image/png", png_bytes(1024)),
            Part::Text {
                name: "confidence",
                value: "0.25",
            },
        ]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;

    // The inverted box is dropped and severity clamped
    assert_eq!(body["count"], json!(1));
    assert_eq!(body["detections"][0]["confidence"], json!(0.88));
    assert_eq!(body["severity"], json!(10.0));
    assert_eq!(
        body["annotated_image"],
        json!(format!("{}/file=/tmp/gradio/out/annotated.webp", server.uri()))
    );

    let requests = server.received_requests().await.unwrap();
    let predict = requests
        .iter()
        .find(|r| r.url.path() == "/run/predict")
        .unwrap();
    let sent: Value = serde_json::from_slice(&predict.body).unwrap();
    assert_eq!(sent["fn_index"], json!(0));
    assert_eq!(sent["data"][1], json!(0.25));
    assert_eq!(sent["data"][0]["path"], json!("/tmp/gradio/abc/road.png"));
}

#[tokio::test]
async fn test_slow_model_reports_cold_start() {
    let server = mock_gradio().await;

    Mock::given(method("POST"))
        .and(path("/run/predict"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": []}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let app = router_for(&server, Duration::from_millis(300));
    let response = app
        .oneshot(detect_request(&[image_part("image/png", png_bytes(128))]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await;
    assert_eq!(body["is_cold_start"], json!(true));
}

#[tokio::test]
async fn test_queue_full_reports_rate_limit() {
    let server = mock_gradio().await;

    Mock::given(method("POST"))
        .and(path("/run/predict"))
        .respond_with(ResponseTemplate::new(429).set_body_string("Too many requests"))
        .mount(&server)
        .await;

    let app = router_for(&server, Duration::from_secs(5));
    let response = app
        .oneshot(detect_request(&[image_part("image/jpeg", png_bytes(128))]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_ready_reports_unreachable_model() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/config"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let app = router_for(&server, Duration::from_secs(5));
    let response = app
        .oneshot(
            axum::http::Request::builder()
                .uri("/ready")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await;
    assert_eq!(body["status"], json!("degraded"));
    assert_eq!(body["checks"]["inference"]["status"], json!("error"));
}

#[tokio::test]
async fn test_slow_steps_share_one_deadline() {
    let server = MockServer::start().await;
    let step_delay = Duration::from_millis(800);

    Mock::given(method("GET"))
        .and(path("/config"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"version": "4.44.1"}))
                .set_delay(step_delay),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!(["/tmp/gradio/abc/road.png"]))
                .set_delay(step_delay),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/run/predict"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": [null, "{}", "", ""]}))
                .set_delay(step_delay),
        )
        .mount(&server)
        .await;

    // Each call fits its own timeout; together they exceed the route budget
    let config = ApiConfig {
        inference_base_url: server.uri(),
        inference_timeout: Duration::from_millis(1000),
        request_timeout: Duration::from_millis(1500),
        ..ApiConfig::default()
    };
    let app = create_router(AppState::new(config).unwrap(), None);

    let response = app
        .oneshot(detect_request(&[image_part("image/png", png_bytes(128))]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await;
    assert_eq!(body["is_cold_start"], json!(true));
    assert_eq!(
        body["error"],
        json!("Model is warming up. Please try again in 30-60 seconds.")
    );
}
