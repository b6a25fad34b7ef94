//! Pothole detection proxy.
//!
//! Validates the uploaded image, forwards it with the confidence threshold
//! to the remote model, and reshapes the model's output into a stable body.

use std::time::Instant;

use axum::extract::multipart::{Multipart, MultipartError, MultipartRejection};
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use pothole_models::{
    parse_confidence, validate_upload, DetectionPayload, DetectionResult, ImageUpload, UploadError,
};
use tracing::{debug, error, info, warn};

use crate::error::{ApiError, ApiResult, INVALID_FORM_MESSAGE};
use crate::metrics;
use crate::state::AppState;

/// Form field carrying the image.
const IMAGE_FIELD: &str = "image";
/// Form field carrying the confidence threshold.
const CONFIDENCE_FIELD: &str = "confidence";

/// A validated detect form.
#[derive(Debug)]
struct DetectForm {
    image: ImageUpload,
    confidence: f64,
}

struct RawImageField {
    content_type: Option<String>,
    file_name: Option<String>,
    bytes: Vec<u8>,
}

fn form_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge
    } else {
        debug!(error = %err.body_text(), "Unreadable multipart body");
        ApiError::bad_request(INVALID_FORM_MESSAGE)
    }
}

/// Read and validate the multipart form. Unknown fields are ignored.
async fn read_form(mut multipart: Multipart, state: &AppState) -> ApiResult<DetectForm> {
    let mut image: Option<RawImageField> = None;
    let mut confidence: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(form_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(IMAGE_FIELD) => {
                let content_type = field.content_type().map(str::to_string);
                let file_name = field.file_name().map(str::to_string);
                let bytes = field.bytes().await.map_err(form_error)?;
                image = Some(RawImageField {
                    content_type,
                    file_name,
                    bytes: bytes.to_vec(),
                });
            }
            Some(CONFIDENCE_FIELD) => {
                confidence = Some(field.text().await.map_err(form_error)?);
            }
            _ => {}
        }
    }

    let image = image
        .filter(|raw| !raw.bytes.is_empty())
        .ok_or(UploadError::Missing)?;

    let image = validate_upload(
        image.content_type.as_deref(),
        image.bytes,
        image.file_name,
        &state.limits,
    )?;

    Ok(DetectForm {
        image,
        confidence: parse_confidence(confidence.as_deref(), state.config.default_confidence),
    })
}

/// Detect potholes in an uploaded image.
///
/// `POST /api/detect` with multipart fields `image` and `confidence`.
pub async fn detect(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<DetectionResult>> {
    let multipart = multipart.map_err(|e| {
        debug!(error = %e, "Rejected detect request body");
        ApiError::bad_request(INVALID_FORM_MESSAGE)
    })?;

    let form = match read_form(multipart, &state).await {
        Ok(form) => form,
        Err(e) => {
            info!(error = %e, "Detect request rejected");
            metrics::record_detect_outcome("invalid");
            return Err(e);
        }
    };

    debug!(
        bytes = form.image.len(),
        mime = %form.image.mime,
        confidence = form.confidence,
        "Forwarding image to inference service"
    );

    let start = Instant::now();
    let deadline = state.config.detect_deadline();
    let call = state.backend.detect(&form.image, form.confidence);
    let raw = match tokio::time::timeout(deadline, call).await {
        Err(_) => {
            error!(deadline_ms = deadline.as_millis() as u64, "Detection deadline exceeded");
            metrics::record_remote_call("timeout", start.elapsed().as_secs_f64());
            metrics::record_detect_outcome("timeout");
            return Err(ApiError::ColdStart);
        }
        Ok(Ok(raw)) => {
            metrics::record_remote_call("ok", start.elapsed().as_secs_f64());
            raw
        }
        Ok(Err(e)) => {
            let kind = e.kind();
            error!(error = %e, kind = %kind, "Detection error");
            metrics::record_remote_call(kind.as_str(), start.elapsed().as_secs_f64());
            metrics::record_detect_outcome(kind.as_str());
            return Err(e.into());
        }
    };

    let (payload, issues) = DetectionPayload::parse_lenient(&raw.detections_json);
    for issue in &issues {
        warn!(issue = %issue, "Repaired inference payload");
        metrics::record_payload_issue(issue.reason());
    }

    let result = DetectionResult::new(
        raw.annotated_image,
        payload,
        raw.severity_text,
        raw.latency_text,
    );

    metrics::record_detect_outcome("ok");
    metrics::record_detections(result.count);
    info!(
        count = result.count,
        severity = result.severity,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Detection completed"
    );

    Ok(Json(result))
}
