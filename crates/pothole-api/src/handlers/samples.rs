//! Bundled sample images.

use axum::Json;
use pothole_models::{SampleImage, SAMPLE_IMAGES};
use serde::Serialize;

#[derive(Serialize)]
pub struct SamplesResponse {
    pub samples: &'static [SampleImage],
}

/// List the sample images the UI offers in place of an upload.
pub async fn list_samples() -> Json<SamplesResponse> {
    Json(SamplesResponse {
        samples: SAMPLE_IMAGES,
    })
}
