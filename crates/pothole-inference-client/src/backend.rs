//! Seam between the HTTP layer and the remote model.

use async_trait::async_trait;
use pothole_models::ImageUpload;

use crate::error::InferenceResult;
use crate::prediction::RawPrediction;

/// A remote service able to detect potholes in an image.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Run detection on a validated image. `confidence` is forwarded as given.
    async fn detect(&self, image: &ImageUpload, confidence: f64) -> InferenceResult<RawPrediction>;

    /// Check that the service is reachable.
    async fn probe(&self) -> InferenceResult<()>;
}
