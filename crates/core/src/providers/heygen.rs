//! HeyGen avatar video provider.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::config::VideoProviderConfig;
use crate::orchestrator::RunConfig;
use crate::products::ProductRecord;

use super::{GenerationError, VideoHandle, VideoProvider, VideoStatus};

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct GenerateData {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusData {
    status: Option<String>,
    video_url: Option<String>,
    #[serde(default)]
    error: Option<Value>,
}

/// Renders avatar videos through the HeyGen API.
pub struct HeyGenVideoProvider {
    client: Client,
    config: VideoProviderConfig,
    api_key: String,
}

impl HeyGenVideoProvider {
    pub fn new(config: VideoProviderConfig, api_key: String) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| GenerationError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn generate_payload(&self, script: &str, product: &ProductRecord) -> Value {
        json!({
            "title": product.name,
            "video_inputs": [{
                "character": {
                    "type": "avatar",
                    "avatar_id": self.config.avatar_id,
                    "avatar_style": "normal"
                },
                "voice": {
                    "type": "text",
                    "input_text": script,
                    "voice_id": self.config.voice_id,
                    "speed": 1.0
                },
                "background": {
                    "type": "color",
                    "value": self.config.background_color
                }
            }],
            "dimension": {
                "width": self.config.width,
                "height": self.config.height
            }
        })
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, GenerationError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(GenerationError::ApiError(format!(
            "HTTP {}: {}",
            status,
            body.chars().take(200).collect::<String>()
        )))
    }
}

#[async_trait]
impl VideoProvider for HeyGenVideoProvider {
    fn name(&self) -> &str {
        "heygen"
    }

    async fn create(
        &self,
        script: &str,
        product: &ProductRecord,
        config: &RunConfig,
    ) -> Result<VideoHandle, GenerationError> {
        let url = format!("{}/v2/video/generate", self.base_url());
        debug!(
            "Submitting video for '{}' (project {})",
            product.name, config.project_id
        );

        let response = self
            .client
            .post(&url)
            .header("X-Api-Key", &self.api_key)
            .json(&self.generate_payload(script, product))
            .send()
            .await?;
        let envelope: Envelope<GenerateData> = Self::check(response).await?.json().await?;

        let video_id = envelope
            .data
            .and_then(|d| d.video_id)
            .ok_or_else(|| {
                GenerationError::InvalidResponse(format!(
                    "no video_id returned (error: {})",
                    envelope.error.map(|e| e.to_string()).unwrap_or_default()
                ))
            })?;

        info!("Video creation initiated: {}", video_id);
        Ok(VideoHandle::new(video_id))
    }

    async fn poll(&self, handle: &VideoHandle) -> Result<VideoStatus, GenerationError> {
        let url = format!("{}/v2/video/{}", self.base_url(), handle.id);
        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await?;
        let envelope: Envelope<StatusData> = Self::check(response).await?.json().await?;

        let data = envelope
            .data
            .ok_or_else(|| GenerationError::InvalidResponse("status response had no data".into()))?;
        Ok(map_status(data))
    }
}

fn map_status(data: StatusData) -> VideoStatus {
    match data.status.as_deref() {
        Some("completed") => VideoStatus::Ready {
            url: data.video_url,
        },
        Some("failed") => VideoStatus::Failed {
            reason: data
                .error
                .map(|e| match e {
                    Value::String(s) => s,
                    other => other.to_string(),
                })
                .unwrap_or_else(|| "unknown error".to_string()),
        },
        _ => VideoStatus::Pending,
    }
}
