//! Script → video → publish for each product of a batch.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::future::join_all;
use tracing::{debug, error, info, warn};

use crate::metrics;
use crate::products::ProductRecord;
use crate::providers::{GenerationError, ScriptProvider, VideoHandle, VideoProvider, VideoStatus};
use crate::publisher::{PublishMetadata, Publisher};
use crate::state::{BatchItem, RunStateTracker, StateError};

use super::config::OrchestratorConfig;
use super::types::{JobResult, PlatformOutcome, ProductError, ProductErrorKind, ProductOutcome};
use super::RunConfig;

/// Runs a job's batch against the collaborators and the run state tracker.
pub struct ProductPipeline {
    config: OrchestratorConfig,
    tracker: Arc<RunStateTracker>,
    script: Arc<dyn ScriptProvider>,
    video: Arc<dyn VideoProvider>,
    publisher: Arc<dyn Publisher>,
}

impl ProductPipeline {
    pub fn new(
        config: OrchestratorConfig,
        tracker: Arc<RunStateTracker>,
        script: Arc<dyn ScriptProvider>,
        video: Arc<dyn VideoProvider>,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        Self {
            config,
            tracker,
            script,
            video,
            publisher,
        }
    }

    pub fn tracker(&self) -> &Arc<RunStateTracker> {
        &self.tracker
    }

    /// Process the next batch. Errors only when the batch cannot be read;
    /// product and platform failures are recorded in the result.
    pub async fn run(&self, run: &RunConfig) -> Result<JobResult, StateError> {
        let batch = self
            .tracker
            .next_batch(run.products_per_run as usize)
            .await?;
        let mut result = JobResult::default();

        if batch.is_empty() {
            warn!("No products found, nothing to do");
            return Ok(result);
        }

        info!(
            "Processing {} of {} products starting at index {}",
            batch.len(),
            batch.list_len,
            batch.items[0].index
        );

        let total = batch.len();
        for (position, item) in batch.items.iter().enumerate() {
            info!(
                "Processing product {}/{}: {}",
                item.index + 1,
                batch.list_len,
                item.product.name
            );

            let outcome = self.process(item, run).await;
            let persistence_failed =
                matches!(outcome.error_kind, Some(ProductErrorKind::Persistence));
            result.push(outcome);

            if persistence_failed {
                error!("Run state could not be saved, abandoning the rest of the batch");
                break;
            }

            if position + 1 < total && self.config.delay_between_products_ms > 0 {
                debug!("Waiting before processing next product");
                tokio::time::sleep(Duration::from_millis(self.config.delay_between_products_ms))
                    .await;
            }
        }

        Ok(result)
    }

    /// Run one product through the pipeline and commit it on success.
    async fn process(&self, item: &BatchItem, run: &RunConfig) -> ProductOutcome {
        let product = &item.product;

        let video_url = match self.produce_video(product, run).await {
            Ok(url) => url,
            Err(e) => {
                warn!("Product '{}' failed: {}", product.name, e);
                metrics::PRODUCTS_PROCESSED
                    .with_label_values(&[e.kind().as_str()])
                    .inc();
                return ProductOutcome::failed(item.index, &product.name, &e);
            }
        };

        let platforms = self.publish_all(product, &video_url, &run.platforms).await;

        if let Err(e) = self.tracker.commit(1).await {
            metrics::STATE_COMMITS.with_label_values(&["failed"]).inc();
            let e = ProductError::from(e);
            metrics::PRODUCTS_PROCESSED
                .with_label_values(&[e.kind().as_str()])
                .inc();
            let mut outcome = ProductOutcome::failed(item.index, &product.name, &e);
            outcome.video_url = Some(video_url);
            outcome.platforms = platforms;
            return outcome;
        }
        metrics::STATE_COMMITS.with_label_values(&["ok"]).inc();
        metrics::PRODUCTS_PROCESSED
            .with_label_values(&["succeeded"])
            .inc();

        if let Err(e) = self
            .tracker
            .products()
            .mark_processed(item.index, Utc::now())
            .await
        {
            warn!("Failed to mark product {} as processed: {}", item.index, e);
        }

        info!("Product '{}' processed", product.name);
        ProductOutcome::succeeded(item.index, &product.name, video_url, platforms)
    }

    async fn produce_video(
        &self,
        product: &ProductRecord,
        run: &RunConfig,
    ) -> Result<String, ProductError> {
        debug!("Generating script with {}", self.script.name());
        let script = self
            .script
            .generate(product, &self.config.script_platform)
            .await?;

        debug!("Requesting video from {}", self.video.name());
        let handle = self.video.create(&script, product, run).await?;
        self.wait_for_video(&handle).await
    }

    /// Poll until the render is ready, failed, or the wait ceiling passes.
    async fn wait_for_video(&self, handle: &VideoHandle) -> Result<String, ProductError> {
        let max_wait = self.config.video_max_wait_secs;
        let interval = Duration::from_millis(self.config.video_poll_interval_ms);
        let started = Instant::now();

        let polled = tokio::time::timeout(Duration::from_secs(max_wait), async {
            loop {
                let status = match self.video.poll(handle).await {
                    Ok(status) => status,
                    Err(e) => return Err(e),
                };
                match status {
                    VideoStatus::Ready { url: Some(url) } => return Ok(url),
                    VideoStatus::Ready { url: None } => {
                        return Err(GenerationError::InvalidResponse(format!(
                            "video {} completed without a URL",
                            handle.id
                        )))
                    }
                    VideoStatus::Failed { reason } => {
                        return Err(GenerationError::VideoFailed(reason))
                    }
                    VideoStatus::Pending => {
                        debug!("Video {} still rendering", handle.id);
                        tokio::time::sleep(interval).await;
                    }
                }
            }
        })
        .await;

        let elapsed = started.elapsed().as_secs_f64();
        match polled {
            Ok(Ok(url)) => {
                metrics::VIDEO_WAIT
                    .with_label_values(&["ready"])
                    .observe(elapsed);
                info!("Video completed: {}", url);
                Ok(url)
            }
            Ok(Err(e)) => {
                metrics::VIDEO_WAIT
                    .with_label_values(&["failed"])
                    .observe(elapsed);
                Err(e.into())
            }
            Err(_) => {
                metrics::VIDEO_WAIT
                    .with_label_values(&["timeout"])
                    .observe(elapsed);
                Err(ProductError::Timeout(max_wait))
            }
        }
    }

    /// Publish to every platform concurrently; each attempt is independent.
    async fn publish_all(
        &self,
        product: &ProductRecord,
        video_url: &str,
        platforms: &[String],
    ) -> BTreeMap<String, PlatformOutcome> {
        let metadata = PublishMetadata::for_product(product);

        let attempts = platforms.iter().map(|platform| {
            let metadata = &metadata;
            async move {
                let outcome = match self.publisher.publish(platform, video_url, metadata).await {
                    Ok(reference) => {
                        info!("Published '{}' to {}", product.name, platform);
                        PlatformOutcome::Published { reference }
                    }
                    Err(e) => {
                        warn!("{} upload failed: {}", platform, e);
                        PlatformOutcome::Failed {
                            error: e.to_string(),
                        }
                    }
                };
                let label = if outcome.is_published() {
                    "published"
                } else {
                    "failed"
                };
                metrics::PUBLISHES
                    .with_label_values(&[platform.as_str(), label])
                    .inc();
                (platform.clone(), outcome)
            }
        });

        join_all(attempts).await.into_iter().collect()
    }
}
