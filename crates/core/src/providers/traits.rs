use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::orchestrator::RunConfig;
use crate::products::ProductRecord;

/// Errors raised while generating a script or a video.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Video generation failed: {0}")]
    VideoFailed(String),
}

impl From<reqwest::Error> for GenerationError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            GenerationError::ConnectionFailed(e.to_string())
        } else if e.is_decode() {
            GenerationError::InvalidResponse(e.to_string())
        } else {
            GenerationError::ApiError(e.to_string())
        }
    }
}

/// Provider-side identifier of a video being rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoHandle {
    pub id: String,
}

impl VideoHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Render status reported by a video provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VideoStatus {
    Pending,
    Ready { url: Option<String> },
    Failed { reason: String },
}

/// Writes a marketing script for a product.
#[async_trait]
pub trait ScriptProvider: Send + Sync {
    /// Name of this provider implementation.
    fn name(&self) -> &str;

    /// Generate a script for `product`, tailored to `platform`.
    async fn generate(
        &self,
        product: &ProductRecord,
        platform: &str,
    ) -> Result<String, GenerationError>;
}

/// Renders a script into a video.
#[async_trait]
pub trait VideoProvider: Send + Sync {
    /// Name of this provider implementation.
    fn name(&self) -> &str;

    /// Submit a render request.
    async fn create(
        &self,
        script: &str,
        product: &ProductRecord,
        config: &RunConfig,
    ) -> Result<VideoHandle, GenerationError>;

    /// Check on a submitted render.
    async fn poll(&self, handle: &VideoHandle) -> Result<VideoStatus, GenerationError>;
}
