//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pothole_inference_client::{InferenceError, RemoteErrorKind};
use pothole_models::{ErrorResponse, UploadError};
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

pub const COLD_START_MESSAGE: &str = "Model is warming up. Please try again in 30-60 seconds.";
pub const RATE_LIMITED_MESSAGE: &str = "Too many requests. Please wait a moment.";
pub const UNAVAILABLE_MESSAGE: &str = "Detection service temporarily unavailable. Please try again.";
pub const INVALID_FORM_MESSAGE: &str = "Invalid form data";
pub const TOO_LARGE_MESSAGE: &str = "Request body too large";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(#[from] UploadError),

    #[error("Payload too large")]
    PayloadTooLarge,

    #[error("Inference service is cold")]
    ColdStart,

    #[error("Rate limited")]
    RateLimited,

    #[error("Inference service unavailable: {0}")]
    Unavailable(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::ColdStart => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorResponse {
        match self {
            ApiError::BadRequest(msg) => ErrorResponse::new(msg.clone()),
            ApiError::Validation(e) => ErrorResponse::new(e.to_string()),
            ApiError::PayloadTooLarge => ErrorResponse::new(TOO_LARGE_MESSAGE),
            ApiError::ColdStart => ErrorResponse::cold_start(COLD_START_MESSAGE),
            ApiError::RateLimited => ErrorResponse::new(RATE_LIMITED_MESSAGE),
            // Internal details stay in the logs
            ApiError::Unavailable(_) => ErrorResponse::new(UNAVAILABLE_MESSAGE),
        }
    }
}

impl From<InferenceError> for ApiError {
    fn from(err: InferenceError) -> Self {
        match err.kind() {
            RemoteErrorKind::Timeout => ApiError::ColdStart,
            RemoteErrorKind::RateLimited => ApiError::RateLimited,
            RemoteErrorKind::Unknown => ApiError::Unavailable(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.body())).into_response()
    }
}
