//! YouTube Data API uploads.
//!
//! Access tokens are minted from a long-lived refresh token before every
//! upload, then the video goes up through a resumable upload session: one
//! request carrying the metadata opens the session, a second sends the bytes.

use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::PublishersConfig;

use super::media::{download_video, VIDEO_CONTENT_TYPE};
use super::{truncate_chars, PublishError, PublishMetadata};

pub const TITLE_LIMIT: usize = 100;
pub const DESCRIPTION_LIMIT: usize = 5000;
pub const TAG_LIMIT: usize = 500;

/// "People & Blogs"
const CATEGORY_ID: &str = "22";

const PLATFORM: &str = "youtube";

/// OAuth "authorized user" credentials as exported by Google tooling.
#[derive(Clone, Deserialize)]
pub struct YouTubeCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

impl YouTubeCredentials {
    /// Parse the JSON document stored in the `youtube_credentials` secret.
    pub fn from_json(text: &str) -> Result<Self, PublishError> {
        let credentials: Self =
            serde_json::from_str(text).map_err(|e| PublishError::InvalidCredentials {
                platform: PLATFORM.to_string(),
                message: e.to_string(),
            })?;
        if credentials.refresh_token.trim().is_empty() {
            return Err(PublishError::InvalidCredentials {
                platform: PLATFORM.to_string(),
                message: "refresh_token is empty".to_string(),
            });
        }
        Ok(credentials)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Snippet<'a> {
    title: String,
    description: String,
    tags: &'a [String],
    category_id: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VideoStatus {
    privacy_status: &'static str,
    self_declared_made_for_kids: bool,
}

#[derive(Debug, Serialize)]
struct VideoResource<'a> {
    snippet: Snippet<'a>,
    status: VideoStatus,
}

impl<'a> VideoResource<'a> {
    fn for_metadata(metadata: &'a PublishMetadata) -> Self {
        let tag_count = metadata.tags.len().min(TAG_LIMIT);
        Self {
            snippet: Snippet {
                title: truncate_chars(&metadata.title, TITLE_LIMIT),
                description: truncate_chars(&metadata.description, DESCRIPTION_LIMIT),
                tags: &metadata.tags[..tag_count],
                category_id: CATEGORY_ID,
            },
            status: VideoStatus {
                privacy_status: "public",
                self_declared_made_for_kids: false,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct VideoResponse {
    id: Option<String>,
}

/// Uploads public videos to the channel owning the refresh token.
pub struct YouTubeClient {
    client: Client,
    upload_base_url: String,
    credentials: YouTubeCredentials,
}

impl YouTubeClient {
    pub fn new(
        config: &PublishersConfig,
        credentials: YouTubeCredentials,
    ) -> Result<Self, PublishError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| request_failed(e.to_string()))?;

        Ok(Self {
            client,
            upload_base_url: config.youtube_upload_base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    /// Upload the video at `video_url` and return its watch URL.
    pub async fn upload(
        &self,
        video_url: &str,
        metadata: &PublishMetadata,
    ) -> Result<String, PublishError> {
        let video = download_video(&self.client, video_url, PLATFORM).await?;
        let access_token = self.access_token().await?;

        let session_url = self
            .open_session(&access_token, metadata, video.len())
            .await?;
        debug!("YouTube upload session opened for '{}'", metadata.title);

        let response = self
            .client
            .put(&session_url)
            .bearer_auth(&access_token)
            .header(CONTENT_TYPE, VIDEO_CONTENT_TYPE)
            .body(video)
            .send()
            .await
            .map_err(|e| request_failed(e.to_string()))?;
        let response = check_status(response).await?;

        let parsed: VideoResponse = response
            .json()
            .await
            .map_err(|e| request_failed(e.to_string()))?;
        let video_id = parsed.id.ok_or_else(|| rejected("response had no id"))?;

        let watch_url = format!("https://www.youtube.com/watch?v={}", video_id);
        info!("Uploaded to YouTube: {}", watch_url);
        Ok(watch_url)
    }

    /// Exchange the refresh token for a short-lived access token.
    async fn access_token(&self) -> Result<String, PublishError> {
        let response = self
            .client
            .post(&self.credentials.token_uri)
            .form(&[
                ("grant_type", "refresh_token"),
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("refresh_token", self.credentials.refresh_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| request_failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::InvalidCredentials {
                platform: PLATFORM.to_string(),
                message: format!(
                    "token refresh HTTP {}: {}",
                    status,
                    truncate_chars(&body, 200)
                ),
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| request_failed(e.to_string()))?;
        Ok(token.access_token)
    }

    /// Start a resumable upload and return the session URL.
    async fn open_session(
        &self,
        access_token: &str,
        metadata: &PublishMetadata,
        content_length: usize,
    ) -> Result<String, PublishError> {
        let response = self
            .client
            .post(format!("{}/videos", self.upload_base_url))
            .query(&[("uploadType", "resumable"), ("part", "snippet,status")])
            .bearer_auth(access_token)
            .header("X-Upload-Content-Type", VIDEO_CONTENT_TYPE)
            .header("X-Upload-Content-Length", content_length.to_string())
            .json(&VideoResource::for_metadata(metadata))
            .send()
            .await
            .map_err(|e| request_failed(e.to_string()))?;
        let response = check_status(response).await?;

        response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| rejected("upload session has no Location header"))
    }
}

async fn check_status(response: Response) -> Result<Response, PublishError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(rejected(&format!(
        "HTTP {}: {}",
        status,
        truncate_chars(&body, 200)
    )))
}

fn request_failed(message: String) -> PublishError {
    PublishError::RequestFailed {
        platform: PLATFORM.to_string(),
        message,
    }
}

fn rejected(message: &str) -> PublishError {
    PublishError::Rejected {
        platform: PLATFORM.to_string(),
        message: message.to_string(),
    }
}
