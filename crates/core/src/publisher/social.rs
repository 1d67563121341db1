use async_trait::async_trait;
use tracing::debug;

use super::{
    InstagramClient, PinterestClient, PublishError, PublishMetadata, Publisher, TwitterClient,
    YouTubeClient,
};

/// Characters of description that follow the title in a tweet.
const TWEET_DESCRIPTION_CHARS: usize = 200;

/// Routes publishes to the platform client registered for each name.
///
/// Platforms without a client fail with [`PublishError::NotConfigured`].
#[derive(Default)]
pub struct SocialPublisher {
    youtube: Option<YouTubeClient>,
    instagram: Option<InstagramClient>,
    pinterest: Option<PinterestClient>,
    twitter: Option<TwitterClient>,
}

impl SocialPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_youtube(mut self, client: YouTubeClient) -> Self {
        self.youtube = Some(client);
        self
    }

    pub fn with_instagram(mut self, client: InstagramClient) -> Self {
        self.instagram = Some(client);
        self
    }

    pub fn with_pinterest(mut self, client: PinterestClient) -> Self {
        self.pinterest = Some(client);
        self
    }

    pub fn with_twitter(mut self, client: TwitterClient) -> Self {
        self.twitter = Some(client);
        self
    }

    /// Names of platforms that have a client.
    pub fn configured_platforms(&self) -> Vec<&'static str> {
        let mut platforms = Vec::new();
        if self.youtube.is_some() {
            platforms.push("youtube");
        }
        if self.instagram.is_some() {
            platforms.push("instagram");
        }
        if self.pinterest.is_some() {
            platforms.push("pinterest");
        }
        if self.twitter.is_some() {
            platforms.push("twitter");
        }
        platforms
    }
}

#[async_trait]
impl Publisher for SocialPublisher {
    async fn publish(
        &self,
        platform: &str,
        video_url: &str,
        metadata: &PublishMetadata,
    ) -> Result<String, PublishError> {
        debug!("Publishing to {}: {}", platform, metadata.title);
        match platform.to_ascii_lowercase().as_str() {
            "youtube" => match &self.youtube {
                Some(client) => client.upload(video_url, metadata).await,
                None => Err(PublishError::NotConfigured(platform.to_string())),
            },
            "instagram" => match &self.instagram {
                Some(client) => client.upload(video_url, &metadata.description).await,
                None => Err(PublishError::NotConfigured(platform.to_string())),
            },
            "pinterest" => match &self.pinterest {
                Some(client) => {
                    client
                        .upload(video_url, &metadata.title, &metadata.description)
                        .await
                }
                None => Err(PublishError::NotConfigured(platform.to_string())),
            },
            "twitter" => match &self.twitter {
                Some(client) => {
                    let text = metadata.caption(TWEET_DESCRIPTION_CHARS);
                    client.upload(video_url, &text).await
                }
                None => Err(PublishError::NotConfigured(platform.to_string())),
            },
            _ => Err(PublishError::NotConfigured(platform.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PublishersConfig;
    use crate::orchestrator::OrchestratorConfig;
    use crate::publisher::{TwitterCredentials, YouTubeCredentials};

    fn metadata() -> PublishMetadata {
        PublishMetadata {
            title: "Lamp - Amazing Product".to_string(),
            description: "Bright".to_string(),
            tags: vec![],
        }
    }

    #[tokio::test]
    async fn test_unconfigured_platforms() {
        let publisher = SocialPublisher::new();
        for platform in ["youtube", "twitter", "instagram", "pinterest", "tiktok"] {
            let err = publisher
                .publish(platform, "https://v/1.mp4", &metadata())
                .await
                .unwrap_err();
            assert!(matches!(err, PublishError::NotConfigured(p) if p == platform));
        }
    }

    #[test]
    fn test_configured_platforms() {
        let config = PublishersConfig::default();
        let publisher = SocialPublisher::new().with_pinterest(
            PinterestClient::new(&config, "token".to_string(), "board".to_string()).unwrap(),
        );
        assert_eq!(publisher.configured_platforms(), vec!["pinterest"]);
    }

    #[test]
    fn test_all_platforms_configured() {
        let config = PublishersConfig::default();
        let youtube = YouTubeCredentials::from_json(
            r#"{"client_id": "c", "client_secret": "s", "refresh_token": "r"}"#,
        )
        .unwrap();
        let twitter = TwitterCredentials {
            api_key: "k".to_string(),
            api_secret: "s".to_string(),
            access_token: "t".to_string(),
            access_secret: "ts".to_string(),
        };

        let publisher = SocialPublisher::new()
            .with_twitter(TwitterClient::new(&config, twitter).unwrap())
            .with_youtube(YouTubeClient::new(&config, youtube).unwrap())
            .with_instagram(
                InstagramClient::new(&config, "acct".to_string(), "token".to_string()).unwrap(),
            )
            .with_pinterest(
                PinterestClient::new(&config, "token".to_string(), "board".to_string()).unwrap(),
            );
        assert_eq!(
            publisher.configured_platforms(),
            vec!["youtube", "instagram", "pinterest", "twitter"]
        );
        assert_eq!(
            OrchestratorConfig::default().platforms,
            publisher.configured_platforms(),
            "every default platform has a client"
        );
    }
}
