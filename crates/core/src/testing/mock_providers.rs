//! Mock script and video providers for testing.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::orchestrator::RunConfig;
use crate::products::ProductRecord;
use crate::providers::{GenerationError, ScriptProvider, VideoHandle, VideoProvider, VideoStatus};

/// Mock implementation of the ScriptProvider trait.
///
/// Returns a canned script per product and records every request. Products
/// registered with [`fail_for`](Self::fail_for) get an API error instead.
#[derive(Debug, Default)]
pub struct MockScriptProvider {
    failing: Arc<RwLock<HashSet<String>>>,
    requests: Arc<RwLock<Vec<(String, String)>>>,
}

impl MockScriptProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail script generation for the named product.
    pub async fn fail_for(&self, product_name: &str) {
        self.failing.write().await.insert(product_name.to_string());
    }

    /// `(product name, platform)` of every request, in order.
    pub async fn requests(&self) -> Vec<(String, String)> {
        self.requests.read().await.clone()
    }
}

#[async_trait]
impl ScriptProvider for MockScriptProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(
        &self,
        product: &ProductRecord,
        platform: &str,
    ) -> Result<String, GenerationError> {
        self.requests
            .write()
            .await
            .push((product.name.clone(), platform.to_string()));

        if self.failing.read().await.contains(&product.name) {
            return Err(GenerationError::ApiError(format!(
                "mock script failure for {}",
                product.name
            )));
        }
        Ok(format!("Meet the {}. You will love it.", product.name))
    }
}

/// How the mock video provider treats a product's render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoBehavior {
    /// Pending for the configured number of polls, then ready with a URL.
    Ready,
    /// Pending forever; the orchestrator's wait ceiling decides.
    NeverReady,
    /// Reports a failed render.
    Fail(String),
    /// Ready, but without a video URL.
    ReadyWithoutUrl,
    /// The create request itself is rejected.
    RejectCreate,
}

#[derive(Debug, Default)]
struct VideoState {
    behaviors: HashMap<String, VideoBehavior>,
    /// video id → (product name, polls so far)
    renders: HashMap<String, (String, u32)>,
    created: Vec<String>,
}

/// Mock implementation of the VideoProvider trait.
///
/// Each product defaults to [`VideoBehavior::Ready`] after one pending poll.
#[derive(Debug)]
pub struct MockVideoProvider {
    state: Arc<RwLock<VideoState>>,
    pending_polls: Arc<RwLock<u32>>,
}

impl Default for MockVideoProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockVideoProvider {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(VideoState::default())),
            pending_polls: Arc::new(RwLock::new(1)),
        }
    }

    /// URL the mock reports for a finished render of `product_name`.
    pub fn video_url(product_name: &str) -> String {
        format!(
            "https://videos.example/{}.mp4",
            product_name.to_lowercase().replace(' ', "-")
        )
    }

    pub async fn set_behavior(&self, product_name: &str, behavior: VideoBehavior) {
        self.state
            .write()
            .await
            .behaviors
            .insert(product_name.to_string(), behavior);
    }

    /// Number of pending polls before a `Ready` render completes.
    pub async fn set_pending_polls(&self, polls: u32) {
        *self.pending_polls.write().await = polls;
    }

    /// Product names of every accepted create request, in order.
    pub async fn created(&self) -> Vec<String> {
        self.state.read().await.created.clone()
    }
}

#[async_trait]
impl VideoProvider for MockVideoProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn create(
        &self,
        _script: &str,
        product: &ProductRecord,
        _config: &RunConfig,
    ) -> Result<VideoHandle, GenerationError> {
        let mut state = self.state.write().await;
        if state.behaviors.get(&product.name) == Some(&VideoBehavior::RejectCreate) {
            return Err(GenerationError::ApiError(
                "mock video create rejected".to_string(),
            ));
        }

        let id = format!("video-{}", state.created.len() + 1);
        state
            .renders
            .insert(id.clone(), (product.name.clone(), 0));
        state.created.push(product.name.clone());
        Ok(VideoHandle::new(id))
    }

    async fn poll(&self, handle: &VideoHandle) -> Result<VideoStatus, GenerationError> {
        let pending_polls = *self.pending_polls.read().await;
        let mut state = self.state.write().await;

        let (name, polls) = match state.renders.get_mut(&handle.id) {
            Some((name, polls)) => {
                *polls += 1;
                (name.clone(), *polls)
            }
            None => {
                return Err(GenerationError::InvalidResponse(format!(
                    "unknown video {}",
                    handle.id
                )))
            }
        };

        let behavior = state
            .behaviors
            .get(&name)
            .cloned()
            .unwrap_or(VideoBehavior::Ready);

        Ok(match behavior {
            VideoBehavior::Ready if polls > pending_polls => VideoStatus::Ready {
                url: Some(Self::video_url(&name)),
            },
            VideoBehavior::Ready | VideoBehavior::NeverReady | VideoBehavior::RejectCreate => {
                VideoStatus::Pending
            }
            VideoBehavior::Fail(reason) => VideoStatus::Failed { reason },
            VideoBehavior::ReadyWithoutUrl => VideoStatus::Ready { url: None },
        })
    }
}
