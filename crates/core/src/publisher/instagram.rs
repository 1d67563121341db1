//! Instagram Graph API reel uploads.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::PublishersConfig;

use super::{truncate_chars, PublishError};

/// Instagram caption limit.
pub const CAPTION_LIMIT: usize = 2200;

const PLATFORM: &str = "instagram";

#[derive(Debug, Deserialize)]
struct IdResponse {
    id: Option<String>,
}

/// Publishes reels through a two-step container/publish flow.
pub struct InstagramClient {
    client: Client,
    base_url: String,
    account_id: String,
    access_token: String,
    processing_wait: Duration,
}

impl InstagramClient {
    pub fn new(
        config: &PublishersConfig,
        account_id: String,
        access_token: String,
    ) -> Result<Self, PublishError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| request_failed(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.instagram_base_url.trim_end_matches('/').to_string(),
            account_id,
            access_token,
            processing_wait: Duration::from_secs(config.instagram_processing_wait_secs),
        })
    }

    /// Override the container processing wait.
    pub fn with_processing_wait(mut self, wait: Duration) -> Self {
        self.processing_wait = wait;
        self
    }

    /// Upload `video_url` as a reel and return the published media id.
    pub async fn upload(&self, video_url: &str, caption: &str) -> Result<String, PublishError> {
        let caption = truncate_chars(caption, CAPTION_LIMIT);

        let container_url = format!("{}/{}/media", self.base_url, self.account_id);
        let container_id = self
            .post_for_id(
                &container_url,
                &[
                    ("media_type", "REELS"),
                    ("video_url", video_url),
                    ("caption", caption.as_str()),
                    ("access_token", self.access_token.as_str()),
                ],
            )
            .await?;
        debug!("Instagram container created: {}", container_id);

        tokio::time::sleep(self.processing_wait).await;

        let publish_url = format!("{}/{}/media_publish", self.base_url, self.account_id);
        let media_id = self
            .post_for_id(
                &publish_url,
                &[
                    ("creation_id", container_id.as_str()),
                    ("access_token", self.access_token.as_str()),
                ],
            )
            .await?;

        info!("Uploaded to Instagram: {}", media_id);
        Ok(media_id)
    }

    async fn post_for_id(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<String, PublishError> {
        let response = self
            .client
            .post(url)
            .query(params)
            .send()
            .await
            .map_err(|e| request_failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Rejected {
                platform: PLATFORM.to_string(),
                message: format!("HTTP {}: {}", status, truncate_chars(&body, 200)),
            });
        }

        let parsed: IdResponse = response
            .json()
            .await
            .map_err(|e| request_failed(e.to_string()))?;
        parsed.id.ok_or_else(|| PublishError::Rejected {
            platform: PLATFORM.to_string(),
            message: "response had no id".to_string(),
        })
    }
}

fn request_failed(message: String) -> PublishError {
    PublishError::RequestFailed {
        platform: PLATFORM.to_string(),
        message,
    }
}
