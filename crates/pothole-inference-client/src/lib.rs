//! Client for the hosted pothole detection model.
//!
//! This crate provides:
//! - A Gradio connect-then-call client (`GradioClient`)
//! - The `InferenceBackend` trait the API server depends on
//! - Typed errors with an explicit `RemoteErrorKind` classification

pub mod backend;
pub mod client;
pub mod error;
pub mod prediction;

pub use backend::InferenceBackend;
pub use client::{GradioClient, GradioSession, InferenceClientConfig};
pub use error::{InferenceError, InferenceResult, RemoteErrorKind};
pub use prediction::RawPrediction;
