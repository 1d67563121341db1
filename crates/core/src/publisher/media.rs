//! Fetching rendered videos for platforms that take a file upload rather
//! than a public URL.

use reqwest::Client;
use tracing::debug;

use super::{truncate_chars, PublishError};

pub(super) const VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// Download the rendered video into memory.
pub(super) async fn download_video(
    client: &Client,
    video_url: &str,
    platform: &str,
) -> Result<Vec<u8>, PublishError> {
    let failed = |message: String| PublishError::RequestFailed {
        platform: platform.to_string(),
        message: format!("video download: {}", message),
    };

    let response = client
        .get(video_url)
        .send()
        .await
        .map_err(|e| failed(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(failed(format!(
            "HTTP {}: {}",
            status,
            truncate_chars(&body, 200)
        )));
    }

    let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;
    if bytes.is_empty() {
        return Err(failed("empty response body".to_string()));
    }
    debug!("Downloaded {} bytes from {} for {}", bytes.len(), video_url, platform);
    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_unreachable_video_host() {
        let client = Client::builder()
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap();
        let err = download_video(&client, "http://127.0.0.1:9/video.mp4", "youtube")
            .await
            .unwrap_err();
        match err {
            PublishError::RequestFailed { platform, message } => {
                assert_eq!(platform, "youtube");
                assert!(message.starts_with("video download:"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
