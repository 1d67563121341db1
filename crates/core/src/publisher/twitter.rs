//! Twitter video tweets.
//!
//! The video goes through the v1.1 chunked media upload (INIT, APPEND,
//! FINALIZE, then STATUS polls while Twitter transcodes it) and is attached to
//! a tweet created through the v2 API. Every request is signed with OAuth 1.0a
//! user credentials.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha1::Sha1;
use tokio::time::Instant;
use tracing::{debug, info};
use urlencoding::encode;

use crate::config::PublishersConfig;

use super::media::{download_video, VIDEO_CONTENT_TYPE};
use super::{truncate_chars, PublishError};

/// Tweet text limit.
pub const TEXT_LIMIT: usize = 280;

/// APPEND segment size; the endpoint accepts at most 5 MB per segment.
const CHUNK_SIZE: usize = 4 * 1024 * 1024;

const PLATFORM: &str = "twitter";

type HmacSha1 = Hmac<Sha1>;

/// The four static OAuth 1.0a keys of a Twitter app acting as one user.
#[derive(Clone)]
pub struct TwitterCredentials {
    pub api_key: String,
    pub api_secret: String,
    pub access_token: String,
    pub access_secret: String,
}

#[derive(Debug, Deserialize)]
struct MediaResponse {
    media_id_string: Option<String>,
    processing_info: Option<ProcessingInfo>,
}

#[derive(Debug, Clone, Deserialize)]
struct ProcessingInfo {
    state: String,
    #[serde(default)]
    error: Option<Value>,
}

impl ProcessingInfo {
    /// `Ok(true)` once the media is usable, `Ok(false)` while still pending.
    fn is_ready(&self) -> Result<bool, PublishError> {
        match self.state.as_str() {
            "succeeded" => Ok(true),
            "failed" => Err(rejected(format!(
                "media processing failed: {}",
                self.error
                    .as_ref()
                    .map(Value::to_string)
                    .unwrap_or_else(|| "no details".to_string())
            ))),
            _ => Ok(false),
        }
    }
}

#[derive(Debug, Serialize)]
struct TweetMedia<'a> {
    media_ids: [&'a str; 1],
}

#[derive(Debug, Serialize)]
struct CreateTweet<'a> {
    text: String,
    media: TweetMedia<'a>,
}

#[derive(Debug, Deserialize)]
struct TweetData {
    id: String,
}

#[derive(Debug, Deserialize)]
struct TweetResponse {
    data: Option<TweetData>,
}

/// Posts tweets with an attached video.
pub struct TwitterClient {
    client: Client,
    media_upload_url: String,
    tweets_url: String,
    credentials: TwitterCredentials,
    poll_interval: Duration,
    max_processing_wait: Duration,
}

impl TwitterClient {
    pub fn new(
        config: &PublishersConfig,
        credentials: TwitterCredentials,
    ) -> Result<Self, PublishError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| request_failed(e.to_string()))?;

        Ok(Self {
            client,
            media_upload_url: format!(
                "{}/media/upload.json",
                config.twitter_upload_base_url.trim_end_matches('/')
            ),
            tweets_url: format!("{}/tweets", config.twitter_api_base_url.trim_end_matches('/')),
            credentials,
            poll_interval: Duration::from_secs(5),
            max_processing_wait: Duration::from_secs(config.twitter_processing_max_wait_secs),
        })
    }

    /// Override how often processing status is checked.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Upload the video at `video_url`, tweet it with `text` and return the
    /// tweet URL.
    pub async fn upload(&self, video_url: &str, text: &str) -> Result<String, PublishError> {
        let video = download_video(&self.client, video_url, PLATFORM).await?;

        let total_bytes = video.len().to_string();
        let init = self
            .media_command(&[
                ("command", "INIT"),
                ("total_bytes", total_bytes.as_str()),
                ("media_type", VIDEO_CONTENT_TYPE),
                ("media_category", "tweet_video"),
            ])
            .await?;
        let media_id = init
            .media_id_string
            .ok_or_else(|| rejected("INIT response had no media_id_string".to_string()))?;
        debug!("Twitter media {} initialised ({} bytes)", media_id, total_bytes);

        for (index, chunk) in video.chunks(CHUNK_SIZE).enumerate() {
            self.append(&media_id, index, chunk.to_vec()).await?;
        }

        let finalized = self
            .media_command(&[("command", "FINALIZE"), ("media_id", media_id.as_str())])
            .await?;
        if let Some(info) = finalized.processing_info {
            self.wait_for_processing(&media_id, info).await?;
        }

        let tweet_id = self.create_tweet(text, &media_id).await?;
        let tweet_url = format!("https://twitter.com/user/status/{}", tweet_id);
        info!("Uploaded to Twitter: {}", tweet_url);
        Ok(tweet_url)
    }

    /// INIT and FINALIZE: form-encoded parameters, all of them signed.
    async fn media_command(&self, params: &[(&str, &str)]) -> Result<MediaResponse, PublishError> {
        let authorization = self.authorize("POST", &self.media_upload_url, params)?;
        let request = self
            .client
            .post(&self.media_upload_url)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .form(params);
        let response = send(request).await?;
        response
            .json()
            .await
            .map_err(|e| request_failed(e.to_string()))
    }

    /// APPEND one segment. The bytes travel as multipart, which OAuth leaves
    /// unsigned, so the command parameters go in the signed query string.
    async fn append(
        &self,
        media_id: &str,
        index: usize,
        chunk: Vec<u8>,
    ) -> Result<(), PublishError> {
        let segment_index = index.to_string();
        let params = [
            ("command", "APPEND"),
            ("media_id", media_id),
            ("segment_index", segment_index.as_str()),
        ];
        let authorization = self.authorize("POST", &self.media_upload_url, &params)?;
        let form = Form::new().part("media", Part::bytes(chunk).file_name("video.mp4"));
        let request = self
            .client
            .post(&self.media_upload_url)
            .query(&params)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .multipart(form);
        send(request).await?;
        debug!("Twitter media {} segment {} appended", media_id, index);
        Ok(())
    }

    async fn wait_for_processing(
        &self,
        media_id: &str,
        mut info: ProcessingInfo,
    ) -> Result<(), PublishError> {
        let deadline = Instant::now() + self.max_processing_wait;
        loop {
            if info.is_ready()? {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(rejected(format!(
                    "media processing timed out after {}s",
                    self.max_processing_wait.as_secs()
                )));
            }
            debug!("Twitter media {} is {}", media_id, info.state);
            tokio::time::sleep(self.poll_interval).await;

            let params = [("command", "STATUS"), ("media_id", media_id)];
            let authorization = self.authorize("GET", &self.media_upload_url, &params)?;
            let request = self
                .client
                .get(&self.media_upload_url)
                .query(&params)
                .header(reqwest::header::AUTHORIZATION, authorization);
            let status: MediaResponse = send(request)
                .await?
                .json()
                .await
                .map_err(|e| request_failed(e.to_string()))?;
            info = status
                .processing_info
                .ok_or_else(|| rejected("STATUS response had no processing_info".to_string()))?;
        }
    }

    async fn create_tweet(&self, text: &str, media_id: &str) -> Result<String, PublishError> {
        // JSON bodies are not part of the OAuth signature base.
        let authorization = self.authorize("POST", &self.tweets_url, &[])?;
        let request = self
            .client
            .post(&self.tweets_url)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .json(&tweet_request(text, media_id));
        let parsed: TweetResponse = send(request)
            .await?
            .json()
            .await
            .map_err(|e| request_failed(e.to_string()))?;
        parsed
            .data
            .map(|data| data.id)
            .ok_or_else(|| rejected("tweet response had no data".to_string()))
    }

    fn authorize(
        &self,
        method: &str,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<String, PublishError> {
        let nonce = uuid::Uuid::new_v4().simple().to_string();
        let timestamp = chrono::Utc::now().timestamp().to_string();
        authorization_header(&self.credentials, method, url, params, &nonce, &timestamp)
    }
}

fn tweet_request<'a>(text: &str, media_id: &'a str) -> CreateTweet<'a> {
    CreateTweet {
        text: truncate_chars(text, TEXT_LIMIT),
        media: TweetMedia {
            media_ids: [media_id],
        },
    }
}

fn oauth_params<'a>(
    credentials: &'a TwitterCredentials,
    nonce: &'a str,
    timestamp: &'a str,
) -> [(&'a str, &'a str); 6] {
    [
        ("oauth_consumer_key", credentials.api_key.as_str()),
        ("oauth_nonce", nonce),
        ("oauth_signature_method", "HMAC-SHA1"),
        ("oauth_timestamp", timestamp),
        ("oauth_token", credentials.access_token.as_str()),
        ("oauth_version", "1.0"),
    ]
}

/// HMAC-SHA1 signature over the request, per RFC 5849 section 3.4.
fn signature(
    credentials: &TwitterCredentials,
    method: &str,
    url: &str,
    params: &[(&str, &str)],
) -> Result<String, PublishError> {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (encode(k).into_owned(), encode(v).into_owned()))
        .collect();
    encoded.sort();
    let param_string = encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let base = format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        encode(url),
        encode(&param_string)
    );
    let key = format!(
        "{}&{}",
        encode(&credentials.api_secret),
        encode(&credentials.access_secret)
    );

    let mut mac = HmacSha1::new_from_slice(key.as_bytes())
        .map_err(|e| PublishError::InvalidCredentials {
            platform: PLATFORM.to_string(),
            message: e.to_string(),
        })?;
    mac.update(base.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Value of the `Authorization` header for one signed request.
///
/// `params` are the query or form parameters the request sends; the oauth_*
/// protocol parameters are added here.
fn authorization_header(
    credentials: &TwitterCredentials,
    method: &str,
    url: &str,
    params: &[(&str, &str)],
    nonce: &str,
    timestamp: &str,
) -> Result<String, PublishError> {
    let oauth = oauth_params(credentials, nonce, timestamp);
    let signed: Vec<(&str, &str)> = params.iter().chain(oauth.iter()).copied().collect();
    let signature = signature(credentials, method, url, &signed)?;

    let mut fields: Vec<String> = oauth
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, encode(v)))
        .collect();
    fields.push(format!("oauth_signature=\"{}\"", encode(&signature)));
    fields.sort();
    Ok(format!("OAuth {}", fields.join(", ")))
}

async fn send(request: RequestBuilder) -> Result<Response, PublishError> {
    let response = request
        .send()
        .await
        .map_err(|e| request_failed(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(rejected(format!(
            "HTTP {}: {}",
            status,
            truncate_chars(&body, 200)
        )));
    }
    Ok(response)
}

fn request_failed(message: String) -> PublishError {
    PublishError::RequestFailed {
        platform: PLATFORM.to_string(),
        message,
    }
}

fn rejected(message: String) -> PublishError {
    PublishError::Rejected {
        platform: PLATFORM.to_string(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Worked example from Twitter's "Creating a signature" guide.
    fn documented_credentials() -> TwitterCredentials {
        TwitterCredentials {
            api_key: "xvz1evFS4wEEPTGEFPHBog".to_string(),
            api_secret: "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw".to_string(),
            access_token: "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb".to_string(),
            access_secret: "LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE".to_string(),
        }
    }

    const DOCUMENTED_NONCE: &str = "kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg";
    const DOCUMENTED_TIMESTAMP: &str = "1318622958";
    const DOCUMENTED_URL: &str = "https://api.twitter.com/1.1/statuses/update.json";

    fn documented_params() -> [(&'static str, &'static str); 2] {
        [
            ("include_entities", "true"),
            ("status", "Hello Ladies + Gentlemen, a signed OAuth request!"),
        ]
    }

    #[test]
    fn test_signature_matches_documented_example() {
        let credentials = documented_credentials();
        let oauth = oauth_params(&credentials, DOCUMENTED_NONCE, DOCUMENTED_TIMESTAMP);
        let params: Vec<(&str, &str)> = documented_params()
            .iter()
            .chain(oauth.iter())
            .copied()
            .collect();

        let signature = signature(&credentials, "post", DOCUMENTED_URL, &params).unwrap();
        assert_eq!(signature, "hCtSmYh+iHYCEqBWrE7C7hYmtUk=");
    }

    #[test]
    fn test_authorization_header() {
        let header = authorization_header(
            &documented_credentials(),
            "POST",
            DOCUMENTED_URL,
            &documented_params(),
            DOCUMENTED_NONCE,
            DOCUMENTED_TIMESTAMP,
        )
        .unwrap();

        assert!(header.starts_with("OAuth oauth_consumer_key=\"xvz1evFS4wEEPTGEFPHBog\", "));
        assert!(header.contains("oauth_signature=\"hCtSmYh%2BiHYCEqBWrE7C7hYmtUk%3D\""));
        assert!(header.contains("oauth_signature_method=\"HMAC-SHA1\""));
        assert!(header.contains("oauth_version=\"1.0\""));
        // Request parameters are signed but not repeated in the header.
        assert!(!header.contains("include_entities"));
    }

    #[test]
    fn test_processing_states() {
        let info = |state: &str| ProcessingInfo {
            state: state.to_string(),
            error: None,
        };
        assert!(!info("pending").is_ready().unwrap());
        assert!(!info("in_progress").is_ready().unwrap());
        assert!(info("succeeded").is_ready().unwrap());

        let failed = ProcessingInfo {
            state: "failed".to_string(),
            error: Some(serde_json::json!({"name": "InvalidMedia"})),
        };
        let err = failed.is_ready().unwrap_err();
        assert!(err.to_string().contains("InvalidMedia"));
    }

    #[test]
    fn test_media_response_parsing() {
        let json = r#"{"media_id": 710511363345354753, "media_id_string": "710511363345354753",
            "processing_info": {"state": "pending", "check_after_secs": 5}}"#;
        let parsed: MediaResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.media_id_string.as_deref(), Some("710511363345354753"));
        assert_eq!(parsed.processing_info.unwrap().state, "pending");
    }

    #[test]
    fn test_tweet_request_truncates_text() {
        let text = "x".repeat(400);
        let json = serde_json::to_value(tweet_request(&text, "42")).unwrap();
        assert_eq!(json["text"].as_str().unwrap().len(), TEXT_LIMIT);
        assert_eq!(json["media"]["media_ids"], serde_json::json!(["42"]));
    }

    #[test]
    fn test_endpoints_from_config() {
        let config = PublishersConfig {
            twitter_upload_base_url: "https://upload.example/1.1/".to_string(),
            twitter_processing_max_wait_secs: 30,
            ..Default::default()
        };
        let client = TwitterClient::new(&config, documented_credentials())
            .unwrap()
            .with_poll_interval(Duration::from_millis(10));
        assert_eq!(client.media_upload_url, "https://upload.example/1.1/media/upload.json");
        assert_eq!(client.tweets_url, "https://api.twitter.com/2/tweets");
        assert_eq!(client.max_processing_wait, Duration::from_secs(30));
        assert_eq!(client.poll_interval, Duration::from_millis(10));
    }

    #[tokio::test]
    async fn test_unreachable_video_is_request_failure() {
        let config = PublishersConfig {
            timeout_secs: 2,
            ..Default::default()
        };
        let client = TwitterClient::new(&config, documented_credentials()).unwrap();
        let err = client
            .upload("http://127.0.0.1:9/video.mp4", "caption")
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::RequestFailed { .. }));
    }
}
