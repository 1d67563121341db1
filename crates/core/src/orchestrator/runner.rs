//! Job orchestrator implementation.
//!
//! `start_job` validates and records a job, then spawns one task per job:
//! - Validation: synchronous, no job is created on failure
//! - Execution: fire-and-forget tokio task, products processed in batch order
//! - Status: polled through `get_status`

use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, warn};

use crate::config::RunDefaults;
use crate::metrics;
use crate::providers::{ScriptProvider, VideoProvider};
use crate::publisher::Publisher;
use crate::state::RunStateTracker;

use super::config::OrchestratorConfig;
use super::pipeline::ProductPipeline;
use super::registry::{JobCounts, JobRegistry};
use super::run_config::{ConfigSource, RunConfig};
use super::types::{Job, JobHandle, OrchestratorError, ValidationError, ValidationKind};

/// The job orchestrator - validates start requests and runs jobs in the
/// background.
pub struct JobOrchestrator {
    config: OrchestratorConfig,
    defaults: RunDefaults,
    pipeline: Arc<ProductPipeline>,
    jobs: Arc<JobRegistry>,
}

impl JobOrchestrator {
    /// Create a new orchestrator.
    pub fn new(
        config: OrchestratorConfig,
        defaults: RunDefaults,
        tracker: Arc<RunStateTracker>,
        script: Arc<dyn ScriptProvider>,
        video: Arc<dyn VideoProvider>,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        let pipeline = ProductPipeline::new(config.clone(), tracker, script, video, publisher);

        Self {
            config,
            defaults,
            pipeline: Arc::new(pipeline),
            jobs: Arc::new(JobRegistry::new()),
        }
    }

    /// The tracker jobs draw batches from.
    pub fn tracker(&self) -> &Arc<RunStateTracker> {
        self.pipeline.tracker()
    }

    /// Validate the request, record a pending job and start it.
    ///
    /// Returns as soon as the job is recorded; the work runs in a spawned task.
    pub async fn start_job(
        &self,
        profile_id: &str,
        source: ConfigSource,
    ) -> Result<JobHandle, OrchestratorError> {
        let profile_id = profile_id.trim();
        if profile_id.is_empty() {
            return Err(ValidationError::new(
                ValidationKind::MissingProfileId,
                "profile_id is required",
            )
            .into());
        }

        let run_config = RunConfig::resolve(source, &self.defaults, &self.config).await?;
        if let Some(served) = self.tracker().products().source_id() {
            if run_config.data_source_id != served {
                return Err(ValidationError::new(
                    ValidationKind::UnknownDataSource,
                    format!(
                        "data_source_id '{}' is not served here (products come from '{}')",
                        run_config.data_source_id, served
                    ),
                )
                .into());
            }
        }
        let job = Job::new(profile_id, run_config);
        let handle = JobHandle::for_job(&job.job_id);

        info!(
            "Starting job {} for profile '{}' ({} products)",
            job.job_id, job.profile_id, job.config.products_per_run
        );
        self.jobs.insert(job.clone()).await;
        metrics::JOBS_STARTED.inc();

        let jobs = Arc::clone(&self.jobs);
        let pipeline = Arc::clone(&self.pipeline);
        tokio::spawn(async move {
            Self::execute(jobs, pipeline, job).await;
        });

        Ok(handle)
    }

    /// Snapshot of one job.
    pub async fn get_status(&self, job_id: &str) -> Result<Job, OrchestratorError> {
        self.jobs
            .get(job_id)
            .await
            .ok_or_else(|| OrchestratorError::NotFound(job_id.to_string()))
    }

    /// All jobs, newest first.
    pub async fn list_jobs(&self) -> Vec<Job> {
        self.jobs.list().await
    }

    pub async fn job_counts(&self) -> JobCounts {
        self.jobs.counts().await
    }

    /// Worker body: runs once per job and drives it to a terminal status.
    async fn execute(jobs: Arc<JobRegistry>, pipeline: Arc<ProductPipeline>, job: Job) {
        let job_id = job.job_id.clone();
        let started = Instant::now();

        if let Err(e) = jobs.update(&job_id, |j| j.mark_running()).await {
            error!("Job {} could not start: {}", job_id, e);
            return;
        }

        let finished = match pipeline.run(&job.config).await {
            Ok(result) if result.all_failed_generation() => {
                let message = format!(
                    "All {} products failed during script or video generation",
                    result.products.len()
                );
                warn!("Job {} failed: {}", job_id, message);
                jobs.update(&job_id, |j| j.fail(message)).await
            }
            Ok(result) => {
                info!(
                    "Job {} completed: {} processed, {} failed",
                    job_id, result.products_processed, result.products_failed
                );
                jobs.update(&job_id, |j| j.complete(result)).await
            }
            Err(e) => {
                error!("Job {} failed: {}", job_id, e);
                jobs.update(&job_id, |j| j.fail(e.to_string())).await
            }
        };

        match finished {
            Ok(job) => {
                let status = job.status.as_str();
                metrics::JOBS_FINISHED.with_label_values(&[status]).inc();
                metrics::JOB_DURATION
                    .with_label_values(&[status])
                    .observe(started.elapsed().as_secs_f64());
            }
            Err(e) => error!("Job {} could not be finalised: {}", job_id, e),
        }
    }
}
