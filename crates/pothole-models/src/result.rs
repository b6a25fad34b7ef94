//! Detect endpoint bodies and lenient parsing of the model payload.
//!
//! The remote model returns its detections as a JSON-encoded string. That
//! string is parsed leniently: anything unusable is replaced by a zero value
//! and reported as a [`PayloadIssue`] so the caller can log and count it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::detection::Detection;
use crate::summary::{ResultSummary, SEVERITY_MAX};

/// Something the lenient parser had to paper over.
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadIssue {
    /// The detections string was not JSON.
    InvalidJson(String),
    /// The JSON was valid but not an object.
    NotAnObject,
    /// A field was absent or had the wrong type.
    MissingField(&'static str),
    /// Entries of `detections` that could not be used.
    DroppedDetections(usize),
    /// Upstream `count` disagreed with the detections list.
    CountMismatch { reported: u64, actual: usize },
}

impl PayloadIssue {
    /// Short label for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            PayloadIssue::InvalidJson(_) => "invalid_json",
            PayloadIssue::NotAnObject => "not_an_object",
            PayloadIssue::MissingField(_) => "missing_field",
            PayloadIssue::DroppedDetections(_) => "dropped_detections",
            PayloadIssue::CountMismatch { .. } => "count_mismatch",
        }
    }
}

impl std::fmt::Display for PayloadIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayloadIssue::InvalidJson(e) => write!(f, "detections payload is not JSON: {}", e),
            PayloadIssue::NotAnObject => write!(f, "detections payload is not an object"),
            PayloadIssue::MissingField(name) => write!(f, "field `{}` missing or mistyped", name),
            PayloadIssue::DroppedDetections(n) => write!(f, "dropped {} unusable detections", n),
            PayloadIssue::CountMismatch { reported, actual } => {
                write!(f, "upstream count {} but {} detections", reported, actual)
            }
        }
    }
}

/// Parsed model payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionPayload {
    pub detections: Vec<Detection>,
    pub severity: f64,
    pub latency_ms: f64,
}

impl DetectionPayload {
    /// Parse the model's detections string, never failing.
    pub fn parse_lenient(raw: &str) -> (Self, Vec<PayloadIssue>) {
        let mut issues = Vec::new();

        let value: Value = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(e) => {
                issues.push(PayloadIssue::InvalidJson(e.to_string()));
                return (Self::default(), issues);
            }
        };

        let Some(object) = value.as_object() else {
            issues.push(PayloadIssue::NotAnObject);
            return (Self::default(), issues);
        };

        let detections = match object.get("detections").and_then(Value::as_array) {
            Some(entries) => {
                let parsed: Vec<Detection> = entries
                    .iter()
                    .filter_map(|entry| serde_json::from_value::<Detection>(entry.clone()).ok())
                    .filter(Detection::is_valid)
                    .collect();
                let dropped = entries.len() - parsed.len();
                if dropped > 0 {
                    issues.push(PayloadIssue::DroppedDetections(dropped));
                }
                parsed
            }
            None => {
                issues.push(PayloadIssue::MissingField("detections"));
                Vec::new()
            }
        };

        if let Some(reported) = object.get("count").and_then(Value::as_u64) {
            if reported != detections.len() as u64 {
                issues.push(PayloadIssue::CountMismatch {
                    reported,
                    actual: detections.len(),
                });
            }
        }

        let severity = match object.get("severity").and_then(Value::as_f64) {
            Some(s) => s.clamp(0.0, SEVERITY_MAX),
            None => {
                issues.push(PayloadIssue::MissingField("severity"));
                0.0
            }
        };

        let latency_ms = match object.get("latency_ms").and_then(Value::as_f64) {
            Some(l) => l.max(0.0),
            None => {
                issues.push(PayloadIssue::MissingField("latency_ms"));
                0.0
            }
        };

        (
            Self {
                detections,
                severity,
                latency_ms,
            },
            issues,
        )
    }
}

/// Success body of `POST /api/detect`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub success: bool,
    pub annotated_image: Option<String>,
    /// Always `detections.len()`.
    pub count: usize,
    pub detections: Vec<Detection>,
    pub severity: f64,
    pub latency_ms: f64,
    pub severity_text: Option<String>,
    pub latency_text: Option<String>,
    pub summary: ResultSummary,
}

impl DetectionResult {
    pub fn new(
        annotated_image: Option<String>,
        payload: DetectionPayload,
        severity_text: Option<String>,
        latency_text: Option<String>,
    ) -> Self {
        let summary = ResultSummary::new(&payload.detections, payload.severity);
        Self {
            success: true,
            annotated_image,
            count: payload.detections.len(),
            detections: payload.detections,
            severity: payload.severity,
            latency_ms: payload.latency_ms,
            severity_text,
            latency_text,
            summary,
        }
    }
}

/// Error body shared by every failing response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_cold_start: Option<bool>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            is_cold_start: None,
        }
    }

    pub fn cold_start(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            is_cold_start: Some(true),
        }
    }
}
