//! Inference client error types.

use reqwest::StatusCode;
use thiserror::Error;

/// Result type for inference operations.
pub type InferenceResult<T> = Result<T, InferenceError>;

/// How a failed remote call should be treated by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteErrorKind {
    /// The service did not answer in time, usually a cold start.
    Timeout,
    /// The service is throttling us.
    RateLimited,
    Unknown,
}

impl RemoteErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteErrorKind::Timeout => "timeout",
            RemoteErrorKind::RateLimited => "rate_limited",
            RemoteErrorKind::Unknown => "unknown",
        }
    }

    /// Classify an HTTP status returned by the service.
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::TOO_MANY_REQUESTS => RemoteErrorKind::RateLimited,
            StatusCode::REQUEST_TIMEOUT
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT => RemoteErrorKind::Timeout,
            _ => RemoteErrorKind::Unknown,
        }
    }

    /// Classify free-text error messages. Timeout markers win over rate
    /// limit markers when both are present.
    pub fn from_message(message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("timeout") || lower.contains("timed out") || lower.contains("etimedout") {
            RemoteErrorKind::Timeout
        } else if lower.contains("rate limit")
            || lower.contains("too many requests")
            || message.contains("429")
        {
            RemoteErrorKind::RateLimited
        } else {
            RemoteErrorKind::Unknown
        }
    }
}

impl std::fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors that can occur while talking to the inference service.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Invalid inference client configuration: {0}")]
    Config(String),

    #[error("Request to inference service failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Inference service returned {status}: {body}")]
    Http { status: StatusCode, body: String },

    #[error("Inference service reported an error: {0}")]
    Remote(String),

    #[error("Unexpected response from inference service: {0}")]
    Decode(String),
}

impl InferenceError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Structured signals first, message text as a fallback.
    pub fn kind(&self) -> RemoteErrorKind {
        match self {
            InferenceError::Request(e) => {
                if e.is_timeout() {
                    return RemoteErrorKind::Timeout;
                }
                if let Some(status) = e.status() {
                    let kind = RemoteErrorKind::from_status(status);
                    if kind != RemoteErrorKind::Unknown {
                        return kind;
                    }
                }
                RemoteErrorKind::from_message(&e.to_string())
            }
            InferenceError::Http { status, body } => match RemoteErrorKind::from_status(*status) {
                RemoteErrorKind::Unknown => RemoteErrorKind::from_message(body),
                kind => kind,
            },
            InferenceError::Remote(message) => RemoteErrorKind::from_message(message),
            InferenceError::Config(_) | InferenceError::Decode(_) => RemoteErrorKind::Unknown,
        }
    }
}
