//! API configuration.

use std::path::PathBuf;
use std::time::Duration;

use pothole_inference_client::{InferenceClientConfig, InferenceResult};
use pothole_models::{UploadLimits, DEFAULT_CONFIDENCE, MAX_UPLOAD_BYTES};

/// Hosted pothole model.
pub const DEFAULT_INFERENCE_BASE_URL: &str = "https://faz-ai-pothole-detection.hf.space";

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Rate limit requests per second, per client IP
    pub rate_limit_rps: u32,
    /// Key the rate limiter on forwarding headers set by a fronting proxy
    pub trust_proxy_headers: bool,
    /// Maximum time spent handling one request
    pub request_timeout: Duration,
    /// Max request body size
    pub max_body_size: usize,
    /// Max decoded image size
    pub max_upload_bytes: usize,
    /// Base URL of the remote inference service
    pub inference_base_url: String,
    /// Index of the detection function on the remote service
    pub inference_fn_index: usize,
    /// Timeout for each outbound call, kept below `request_timeout`
    pub inference_timeout: Duration,
    /// Confidence used when the form value is missing or unparsable
    pub default_confidence: f64,
    /// Directory holding the client UI and sample images
    pub static_dir: PathBuf,
    /// Environment (development/production)
    pub environment: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            rate_limit_rps: 10,
            trust_proxy_headers: false,
            request_timeout: Duration::from_secs(90),
            max_body_size: 10 * 1024 * 1024, // 10MB
            max_upload_bytes: MAX_UPLOAD_BYTES,
            inference_base_url: DEFAULT_INFERENCE_BASE_URL.to_string(),
            inference_fn_index: 0,
            inference_timeout: Duration::from_secs(85),
            default_confidence: DEFAULT_CONFIDENCE,
            static_dir: PathBuf::from("static"),
            environment: "development".to_string(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: env_parse("API_PORT").unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            rate_limit_rps: env_parse("RATE_LIMIT_RPS").unwrap_or(defaults.rate_limit_rps),
            trust_proxy_headers: env_parse("TRUST_PROXY_HEADERS")
                .unwrap_or(defaults.trust_proxy_headers),
            request_timeout: env_parse("REQUEST_TIMEOUT")
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            max_body_size: env_parse("MAX_BODY_SIZE").unwrap_or(defaults.max_body_size),
            max_upload_bytes: env_parse("MAX_UPLOAD_BYTES").unwrap_or(defaults.max_upload_bytes),
            inference_base_url: std::env::var("INFERENCE_BASE_URL")
                .unwrap_or(defaults.inference_base_url),
            inference_fn_index: env_parse("INFERENCE_FN_INDEX")
                .unwrap_or(defaults.inference_fn_index),
            inference_timeout: env_parse("INFERENCE_TIMEOUT")
                .map(Duration::from_secs)
                .unwrap_or(defaults.inference_timeout),
            default_confidence: env_parse("DEFAULT_CONFIDENCE")
                .unwrap_or(defaults.default_confidence),
            static_dir: std::env::var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }

    pub fn upload_limits(&self) -> UploadLimits {
        UploadLimits::with_max_bytes(self.max_upload_bytes)
    }

    /// Deadline for one whole remote detection (connect, upload, predict).
    /// Always ends before the route timeout so a slow model surfaces as a
    /// cold start.
    pub fn detect_deadline(&self) -> Duration {
        if self.inference_timeout < self.request_timeout {
            self.inference_timeout
        } else {
            self.request_timeout * 9 / 10
        }
    }

    /// Outbound client settings. No single call outlives the detect deadline.
    pub fn inference_client_config(&self) -> InferenceResult<InferenceClientConfig> {
        let mut config = InferenceClientConfig::new(&self.inference_base_url)?;
        config.fn_index = self.inference_fn_index;
        config.timeout = self.detect_deadline();
        Ok(config)
    }
}
