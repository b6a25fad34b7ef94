//! Shared fixtures for API integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use pothole_api::{create_router, ApiConfig, AppState};
use pothole_inference_client::{InferenceBackend, InferenceError, InferenceResult, RawPrediction};
use pothole_models::ImageUpload;
use serde_json::Value;

pub const BOUNDARY: &str = "pothole-test-boundary";

type Responder = Box<dyn Fn() -> InferenceResult<RawPrediction> + Send + Sync>;

/// Backend stub that records what the router forwarded.
pub struct StubBackend {
    responder: Responder,
    calls: AtomicUsize,
    confidences: Mutex<Vec<f64>>,
    mimes: Mutex<Vec<String>>,
}

impl StubBackend {
    pub fn new(responder: impl Fn() -> InferenceResult<RawPrediction> + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            responder: Box::new(responder),
            calls: AtomicUsize::new(0),
            confidences: Mutex::new(Vec::new()),
            mimes: Mutex::new(Vec::new()),
        })
    }

    /// Backend answering with the given detections JSON.
    pub fn returning(detections_json: &str) -> Arc<Self> {
        let prediction = prediction(detections_json);
        Self::new(move || Ok(prediction.clone()))
    }

    /// Backend failing with a remote error message.
    pub fn failing(message: &'static str) -> Arc<Self> {
        Self::new(move || Err(InferenceError::Remote(message.to_string())))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn confidences(&self) -> Vec<f64> {
        self.confidences.lock().unwrap().clone()
    }

    pub fn mimes(&self) -> Vec<String> {
        self.mimes.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceBackend for StubBackend {
    async fn detect(&self, image: &ImageUpload, confidence: f64) -> InferenceResult<RawPrediction> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.confidences.lock().unwrap().push(confidence);
        self.mimes.lock().unwrap().push(image.mime.as_str().to_string());
        (self.responder)()
    }

    async fn probe(&self) -> InferenceResult<()> {
        Ok(())
    }
}

pub fn prediction(detections_json: &str) -> RawPrediction {
    RawPrediction {
        annotated_image: Some("https://model.example/file=/tmp/annotated.webp".to_string()),
        detections_json: detections_json.to_string(),
        severity_text: Some("Moderate".to_string()),
        latency_text: Some("412 ms".to_string()),
    }
}

pub fn test_router(backend: Arc<StubBackend>) -> Router {
    test_router_with(ApiConfig::default(), backend)
}

pub fn test_router_with(config: ApiConfig, backend: Arc<StubBackend>) -> Router {
    let state = AppState::with_backend(config, backend);
    create_router(state, None)
}

/// One multipart part.
pub enum Part<'a> {
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        bytes: Vec<u8>,
    },
    Text {
        name: &'a str,
        value: &'a str,
    },
}

pub fn image_part(content_type: &str, bytes: Vec<u8>) -> Part<'_> {
    Part::File {
        name: "image",
        file_name: "road.png",
        content_type,
        bytes,
    }
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::File {
                name,
                file_name,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}")
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn detect_request(parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/detect")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// A few bytes with a PNG signature; the proxy never decodes pixels.
pub fn png_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];
    bytes.resize(len.max(bytes.len()), 0);
    bytes
}
