use crate::models::{ConnectionStatus, DetectionResult, ImageSource, LabeledImage, LabeledRecord};
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Failures surfaced by the detection backend.
///
/// `submit_images` only ever reports the first three variants, each carrying
/// nothing but a message fit for the user. The other operations hand the
/// transport error back as is.
#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("Connection timeout")]
    Timeout,
    #[error("Server error: {0}")]
    Server(u16),
    #[error("{0}")]
    Connectivity(String),
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

impl DetectionError {
    pub fn not_responding() -> Self {
        DetectionError::Connectivity("Backend server not responding".into())
    }

    pub fn request(detail: impl std::fmt::Display) -> Self {
        DetectionError::Connectivity(format!("Request error: {}", detail))
    }

    /// Sort a transport failure into timeout, server error or connectivity error.
    pub fn classify(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            DetectionError::Timeout
        } else if let Some(status) = err.status() {
            DetectionError::Server(status.as_u16())
        } else if err.is_connect() || err.is_request() || err.is_body() || err.is_decode() {
            // no usable response arrived, including a body cut off midway
            DetectionError::not_responding()
        } else {
            DetectionError::request(err)
        }
    }
}

#[async_trait]
pub trait DetectionBackend: Send + Sync + 'static {
    async fn submit_images(
        &self,
        images: &[ImageSource],
    ) -> Result<Vec<DetectionResult>, DetectionError>;

    async fn get_labeled_images(&self) -> Result<Vec<LabeledImage>, DetectionError>;

    async fn save_result(&self, record: &LabeledRecord) -> Result<Value, DetectionError>;

    /// Never fails: every failure collapses into an offline status.
    async fn test_connection(&self) -> ConnectionStatus;
}
