//! Mock publisher for testing.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::publisher::{PublishError, PublishMetadata, Publisher};

/// A recorded publish attempt for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedPublish {
    pub platform: String,
    pub video_url: String,
    pub title: String,
    pub success: bool,
}

/// Mock implementation of the Publisher trait.
///
/// Every platform succeeds unless told otherwise with
/// [`fail_platform`](Self::fail_platform).
#[derive(Debug, Default)]
pub struct MockPublisher {
    failures: Arc<RwLock<HashMap<String, String>>>,
    publishes: Arc<RwLock<Vec<RecordedPublish>>>,
}

impl MockPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every publish to `platform` with `message`.
    pub async fn fail_platform(&self, platform: &str, message: &str) {
        self.failures
            .write()
            .await
            .insert(platform.to_string(), message.to_string());
    }

    pub async fn recorded_publishes(&self) -> Vec<RecordedPublish> {
        self.publishes.read().await.clone()
    }

    pub async fn publish_count(&self) -> usize {
        self.publishes.read().await.len()
    }
}

#[async_trait]
impl Publisher for MockPublisher {
    async fn publish(
        &self,
        platform: &str,
        video_url: &str,
        metadata: &PublishMetadata,
    ) -> Result<String, PublishError> {
        let failure = self.failures.read().await.get(platform).cloned();
        let mut publishes = self.publishes.write().await;
        publishes.push(RecordedPublish {
            platform: platform.to_string(),
            video_url: video_url.to_string(),
            title: metadata.title.clone(),
            success: failure.is_none(),
        });

        match failure {
            Some(message) => Err(PublishError::Rejected {
                platform: platform.to_string(),
                message,
            }),
            None => Ok(format!("{}-post-{}", platform, publishes.len())),
        }
    }
}
