//! Display summary derived from a detection result.

use serde::{Deserialize, Serialize};

use crate::detection::Detection;

/// Upper end of the severity scale.
pub const SEVERITY_MAX: f64 = 10.0;

/// Discrete severity buckets shown in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityLevel {
    None,
    Low,
    Moderate,
    High,
    Critical,
}

impl SeverityLevel {
    /// Bucket a 0-10 severity score.
    pub fn from_score(severity: f64) -> Self {
        if severity <= 0.0 {
            SeverityLevel::None
        } else if severity < 2.0 {
            SeverityLevel::Low
        } else if severity < 5.0 {
            SeverityLevel::Moderate
        } else if severity < 8.0 {
            SeverityLevel::High
        } else {
            SeverityLevel::Critical
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SeverityLevel::None => "No potholes",
            SeverityLevel::Low => "Low",
            SeverityLevel::Moderate => "Moderate",
            SeverityLevel::High => "High",
            SeverityLevel::Critical => "Critical",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            SeverityLevel::None => "gray",
            SeverityLevel::Low => "green",
            SeverityLevel::Moderate => "yellow",
            SeverityLevel::High => "orange",
            SeverityLevel::Critical => "red",
        }
    }
}

/// Mean confidence over all detections, 0 when there are none.
pub fn average_confidence(detections: &[Detection]) -> f64 {
    if detections.is_empty() {
        return 0.0;
    }
    detections.iter().map(|d| d.confidence).sum::<f64>() / detections.len() as f64
}

/// Severity as a percentage of the 0-10 meter.
pub fn meter_percent(severity: f64) -> f64 {
    (severity / SEVERITY_MAX * 100.0).clamp(0.0, 100.0)
}

/// Values the result panel renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub severity_level: SeverityLevel,
    pub severity_label: String,
    pub severity_color: String,
    pub average_confidence: f64,
    pub meter_percent: f64,
}

impl ResultSummary {
    pub fn new(detections: &[Detection], severity: f64) -> Self {
        let level = SeverityLevel::from_score(severity);
        Self {
            severity_level: level,
            severity_label: level.label().to_string(),
            severity_color: level.color().to_string(),
            average_confidence: average_confidence(detections),
            meter_percent: meter_percent(severity),
        }
    }
}
