//! Raw output of the pothole detection function.

use serde_json::Value;

/// The positional tuple returned by the remote function:
/// `[annotated image, detections JSON, severity text, latency text]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPrediction {
    /// Absolute URL of the annotated image, if the model produced one.
    pub annotated_image: Option<String>,
    /// JSON-encoded detections, parsed later by the caller.
    pub detections_json: String,
    pub severity_text: Option<String>,
    pub latency_text: Option<String>,
}

impl RawPrediction {
    /// Build from the output array. Missing or mistyped slots become empty
    /// values; `resolve_file` turns a service-local file path into a URL.
    pub fn from_output(data: &[Value], resolve_file: impl Fn(&str) -> String) -> Self {
        let annotated_image = data.first().and_then(|v| image_reference(v, &resolve_file));

        let detections_json = match data.get(1) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };

        let text_at = |i: usize| data.get(i).and_then(Value::as_str).map(str::to_string);

        Self {
            annotated_image,
            detections_json,
            severity_text: text_at(2),
            latency_text: text_at(3),
        }
    }
}

fn image_reference(value: &Value, resolve_file: &impl Fn(&str) -> String) -> Option<String> {
    match value {
        Value::String(s) if s.starts_with("http://") || s.starts_with("https://") => Some(s.clone()),
        Value::String(s) if !s.is_empty() => Some(resolve_file(s)),
        Value::Object(file) => {
            if let Some(url) = file.get("url").and_then(Value::as_str) {
                return Some(url.to_string());
            }
            file.get("path")
                .and_then(Value::as_str)
                .map(|path| resolve_file(path))
        }
        _ => None,
    }
}
