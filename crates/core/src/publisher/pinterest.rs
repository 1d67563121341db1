//! Pinterest video pins.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::PublishersConfig;

use super::{truncate_chars, PublishError};

pub const TITLE_LIMIT: usize = 100;
pub const DESCRIPTION_LIMIT: usize = 500;

const PLATFORM: &str = "pinterest";

#[derive(Debug, Serialize)]
struct MediaSource<'a> {
    source_type: &'a str,
    url: &'a str,
}

#[derive(Debug, Serialize)]
struct CreatePin<'a> {
    title: String,
    description: String,
    board_id: &'a str,
    media_source: MediaSource<'a>,
}

#[derive(Debug, Deserialize)]
struct PinResponse {
    id: Option<String>,
}

/// Creates video pins on a fixed board.
pub struct PinterestClient {
    client: Client,
    base_url: String,
    access_token: String,
    board_id: String,
}

impl PinterestClient {
    pub fn new(
        config: &PublishersConfig,
        access_token: String,
        board_id: String,
    ) -> Result<Self, PublishError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| request_failed(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.pinterest_base_url.trim_end_matches('/').to_string(),
            access_token,
            board_id,
        })
    }

    fn pin_request<'a>(
        &'a self,
        video_url: &'a str,
        title: &str,
        description: &str,
    ) -> CreatePin<'a> {
        CreatePin {
            title: truncate_chars(title, TITLE_LIMIT),
            description: truncate_chars(description, DESCRIPTION_LIMIT),
            board_id: &self.board_id,
            media_source: MediaSource {
                source_type: "video_url",
                url: video_url,
            },
        }
    }

    /// Create a pin and return its public URL.
    pub async fn upload(
        &self,
        video_url: &str,
        title: &str,
        description: &str,
    ) -> Result<String, PublishError> {
        let response = self
            .client
            .post(format!("{}/pins", self.base_url))
            .bearer_auth(&self.access_token)
            .json(&self.pin_request(video_url, title, description))
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

        let parsed: PinResponse = response
            .json()
            .await
            .map_err(|e| request_failed(e.to_string()))?;
        let pin_id = parsed.id.ok_or_else(|| PublishError::Rejected {
            platform: PLATFORM.to_string(),
            message: "response had no id".to_string(),
        })?;

        let pin_url = format!("https://www.pinterest.com/pin/{}", pin_id);
        info!("Uploaded to Pinterest: {}", pin_url);
        Ok(pin_url)
    }
}

fn request_failed(message: String) -> PublishError {
    PublishError::RequestFailed {
        platform: PLATFORM.to_string(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> PinterestClient {
        PinterestClient::new(
            &PublishersConfig::default(),
            "token".to_string(),
            "board-7".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_pin_request_applies_limits() {
        let client = client();
        let title = "t".repeat(150);
        let description = "d".repeat(900);
        let request = client.pin_request("https://v/1.mp4", &title, &description);

        assert_eq!(request.title.len(), TITLE_LIMIT);
        assert_eq!(request.description.len(), DESCRIPTION_LIMIT);

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["board_id"], "board-7");
        assert_eq!(json["media_source"]["source_type"], "video_url");
        assert_eq!(json["media_source"]["url"], "https://v/1.mp4");
    }

    #[test]
    fn test_base_url() {
        assert_eq!(client().base_url, "https://api.pinterest.com/v5");
    }
}
