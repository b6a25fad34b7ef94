//! Application state.

use std::sync::Arc;

use pothole_inference_client::{GradioClient, InferenceBackend, InferenceResult};
use pothole_models::UploadLimits;

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub limits: UploadLimits,
    pub backend: Arc<dyn InferenceBackend>,
}

impl AppState {
    /// Create new application state backed by the hosted model.
    pub fn new(config: ApiConfig) -> InferenceResult<Self> {
        let client = GradioClient::new(config.inference_client_config()?)?;
        Ok(Self::with_backend(config, Arc::new(client)))
    }

    /// Create state around an existing backend.
    pub fn with_backend(config: ApiConfig, backend: Arc<dyn InferenceBackend>) -> Self {
        Self {
            limits: config.upload_limits(),
            config,
            backend,
        }
    }
}
