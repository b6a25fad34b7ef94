//! Shared data models for the pothole detection proxy.
//!
//! This crate provides Serde-serializable types for:
//! - Detections and bounding boxes returned by the remote model
//! - The normalized success and error bodies of the detect endpoint
//! - Upload validation (image type and size limits)
//! - Display summaries (severity level, average confidence)
//! - Bundled sample images

pub mod detection;
pub mod result;
pub mod sample;
pub mod summary;
pub mod upload;

// Re-export common types
pub use detection::{BoundingBox, Detection};
pub use result::{DetectionPayload, DetectionResult, ErrorResponse, PayloadIssue};
pub use sample::{SampleImage, SAMPLE_IMAGES};
pub use summary::{average_confidence, meter_percent, ResultSummary, SeverityLevel, SEVERITY_MAX};
pub use upload::{
    parse_confidence, validate_upload, ImageMime, ImageUpload, UploadError, UploadLimits,
    DEFAULT_CONFIDENCE, MAX_UPLOAD_BYTES,
};
