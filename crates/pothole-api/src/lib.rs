//! Axum HTTP proxy in front of the hosted pothole detection model.
//!
//! This crate provides:
//! - Upload validation and the `/api/detect` proxy endpoint
//! - Static hosting for the upload UI and sample images
//! - Rate limiting and security headers
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
