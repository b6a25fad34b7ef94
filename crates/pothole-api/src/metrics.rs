//! Prometheus metrics for the API server.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "pothole_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "pothole_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "pothole_http_requests_in_flight";

    // Detection metrics
    pub const DETECT_REQUESTS_TOTAL: &str = "pothole_detect_requests_total";
    pub const REMOTE_CALL_DURATION_SECONDS: &str = "pothole_remote_call_duration_seconds";
    pub const DETECTIONS_RETURNED: &str = "pothole_detections_returned";
    pub const MALFORMED_PAYLOADS_TOTAL: &str = "pothole_malformed_payloads_total";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "pothole_rate_limit_hits_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path).to_string()),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record the outcome of a detect request (`ok`, `invalid`, `timeout`, ...).
pub fn record_detect_outcome(outcome: &str) {
    let labels = [("outcome", outcome.to_string())];
    counter!(names::DETECT_REQUESTS_TOTAL, &labels).increment(1);
}

/// Record how long the remote model took.
pub fn record_remote_call(outcome: &str, duration_secs: f64) {
    let labels = [("outcome", outcome.to_string())];
    histogram!(names::REMOTE_CALL_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record the number of detections in a successful response.
pub fn record_detections(count: usize) {
    histogram!(names::DETECTIONS_RETURNED).record(count as f64);
}

/// Record a defaulted or repaired model payload.
pub fn record_payload_issue(reason: &str) {
    let labels = [("reason", reason.to_string())];
    counter!(names::MALFORMED_PAYLOADS_TOTAL, &labels).increment(1);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", sanitize_path(endpoint).to_string())];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Collapse paths into a bounded set of labels.
fn sanitize_path(path: &str) -> &str {
    match path {
        "/" | "/api/detect" | "/api/samples" | "/health" | "/healthz" | "/ready" | "/metrics" => {
            path
        }
        p if p.starts_with("/samples/") => "/samples/:file",
        p if p.starts_with("/api/") => "/api/:unknown",
        _ => "/:asset",
    }
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}
