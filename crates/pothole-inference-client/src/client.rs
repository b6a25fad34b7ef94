//! Gradio client for the hosted pothole model.
//!
//! The service is driven with a connect-then-call protocol:
//! 1. `GET {base}/config` establishes a session and yields the API prefix
//! 2. `POST {prefix}/upload` stores the image on the service
//! 3. `POST {prefix}/run/predict` invokes the function at `fn_index`

use std::time::{Duration, Instant};

use async_trait::async_trait;
use pothole_models::ImageUpload;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, instrument};
use url::Url;
use uuid::Uuid;

use crate::backend::InferenceBackend;
use crate::error::{InferenceError, InferenceResult};
use crate::prediction::RawPrediction;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct InferenceClientConfig {
    /// Base URL of the hosted service.
    pub base_url: Url,
    /// Index of the pothole detection function.
    pub fn_index: usize,
    /// Overall timeout for each HTTP call.
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl InferenceClientConfig {
    pub fn new(base_url: &str) -> InferenceResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| InferenceError::config(format!("invalid base url {}: {}", base_url, e)))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(InferenceError::config(format!(
                "unsupported scheme: {}",
                base_url.scheme()
            )));
        }
        Ok(Self {
            base_url,
            fn_index: 0,
            timeout: Duration::from_secs(85),
            connect_timeout: Duration::from_secs(10),
        })
    }
}

/// Subset of the service's `/config` document we rely on.
#[derive(Debug, Deserialize)]
struct ServiceConfig {
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    api_prefix: Option<String>,
}

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    data: Vec<Value>,
    fn_index: usize,
    session_hash: &'a str,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    data: Option<Vec<Value>>,
    #[serde(default)]
    error: Option<Value>,
}

/// HTTP client for the Gradio service.
#[derive(Debug, Clone)]
pub struct GradioClient {
    http: Client,
    config: InferenceClientConfig,
}

/// An established session against the service.
#[derive(Debug)]
pub struct GradioSession<'a> {
    client: &'a GradioClient,
    api_root: String,
    session_hash: String,
}

impl GradioClient {
    /// Create a new client.
    pub fn new(config: InferenceClientConfig) -> InferenceResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self { http, config })
    }

    fn base(&self) -> &str {
        self.config.base_url.as_str().trim_end_matches('/')
    }

    /// Fetch the service config and open a session.
    #[instrument(skip(self), fields(base_url = %self.config.base_url))]
    pub async fn connect(&self) -> InferenceResult<GradioSession<'_>> {
        let response = self
            .http
            .get(format!("{}/config", self.base()))
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let service: ServiceConfig = response
            .json()
            .await
            .map_err(|e| InferenceError::decode(format!("invalid config document: {}", e)))?;

        let prefix = service
            .api_prefix
            .map(|p| p.trim_end_matches('/').to_string())
            .unwrap_or_default();

        debug!(
            version = service.version.as_deref().unwrap_or("unknown"),
            api_prefix = %prefix,
            "Connected to inference service"
        );

        Ok(GradioSession {
            client: self,
            api_root: format!("{}{}", self.base(), prefix),
            session_hash: Uuid::new_v4().simple().to_string(),
        })
    }
}

impl GradioSession<'_> {
    /// Public URL of a file stored on the service.
    pub fn file_url(&self, path: &str) -> String {
        format!("{}/file={}", self.api_root, path)
    }

    /// Upload an image, returning the service-local path.
    pub async fn upload(&self, image: &ImageUpload) -> InferenceResult<String> {
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.upload_name())
            .mime_str(image.mime.as_str())?;
        let form = Form::new().part("files", part);

        let response = self
            .client
            .http
            .post(format!("{}/upload", self.api_root))
            .multipart(form)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let paths: Vec<String> = response
            .json()
            .await
            .map_err(|e| InferenceError::decode(format!("invalid upload response: {}", e)))?;

        paths
            .into_iter()
            .next()
            .ok_or_else(|| InferenceError::decode("upload returned no file path"))
    }

    /// Invoke a function by index with positional arguments.
    pub async fn predict(&self, fn_index: usize, data: Vec<Value>) -> InferenceResult<Vec<Value>> {
        let request = PredictRequest {
            data,
            fn_index,
            session_hash: &self.session_hash,
        };

        let response = self
            .client
            .http
            .post(format!("{}/run/predict", self.api_root))
            .json(&request)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let body: PredictResponse = response
            .json()
            .await
            .map_err(|e| InferenceError::decode(format!("invalid predict response: {}", e)))?;

        match (body.error, body.data) {
            (Some(error), _) if !error.is_null() => Err(InferenceError::Remote(
                error.as_str().map(str::to_string).unwrap_or_else(|| error.to_string()),
            )),
            (_, Some(data)) => Ok(data),
            _ => Err(InferenceError::decode("predict response has no data")),
        }
    }
}

async fn ensure_success(response: Response) -> InferenceResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(InferenceError::Http { status, body })
}

#[async_trait]
impl InferenceBackend for GradioClient {
    #[instrument(skip(self, image), fields(bytes = image.len(), mime = %image.mime))]
    async fn detect(&self, image: &ImageUpload, confidence: f64) -> InferenceResult<RawPrediction> {
        let start = Instant::now();
        let session = self.connect().await?;
        let path = session.upload(image).await?;

        let file = json!({
            "path": path,
            "orig_name": image.upload_name(),
            "mime_type": image.mime.as_str(),
            "meta": {"_type": "gradio.FileData"},
        });
        let output = session
            .predict(self.config.fn_index, vec![file, json!(confidence)])
            .await?;

        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            outputs = output.len(),
            "Inference call completed"
        );

        Ok(RawPrediction::from_output(&output, |p| session.file_url(p)))
    }

    async fn probe(&self) -> InferenceResult<()> {
        self.connect().await.map(|_| ())
    }
}
