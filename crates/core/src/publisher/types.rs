use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::products::ProductRecord;

/// Errors raised by a single platform publish attempt.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("no publisher configured for platform '{0}'")]
    NotConfigured(String),

    #[error("{platform} request failed: {message}")]
    RequestFailed { platform: String, message: String },

    #[error("{platform} rejected the upload: {message}")]
    Rejected { platform: String, message: String },

    #[error("{platform} credentials are invalid: {message}")]
    InvalidCredentials { platform: String, message: String },
}

/// Text that accompanies a published video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishMetadata {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
}

impl PublishMetadata {
    /// Build the title, description and tags for a product.
    pub fn for_product(product: &ProductRecord) -> Self {
        let tagline = product
            .tagline
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or("Amazing Product");

        let tags = if product.tags.is_empty() {
            vec![product.name.clone()]
        } else {
            product.tags.clone()
        };

        Self {
            title: format!("{} - {}", product.name, tagline),
            description: product.description.clone(),
            tags,
        }
    }

    /// Short caption: title, a blank line, then the start of the description.
    pub fn caption(&self, description_chars: usize) -> String {
        if self.description.is_empty() {
            return self.title.clone();
        }
        format!(
            "{}\n\n{}",
            self.title,
            truncate_chars(&self.description, description_chars)
        )
    }
}

/// Truncate to at most `max` characters without splitting a code point.
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Publishes a video to a named platform.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish `video_url` to `platform`, returning a platform reference
    /// (post id or URL).
    async fn publish(
        &self,
        platform: &str,
        video_url: &str,
        metadata: &PublishMetadata,
    ) -> Result<String, PublishError>;
}
