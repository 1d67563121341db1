//! Types for the job orchestrator.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::providers::GenerationError;
use crate::state::StateError;

use super::RunConfig;

// =============================================================================
// Errors
// =============================================================================

/// Which start-request check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationKind {
    MissingProfileId,
    MalformedConfig,
    ConfigFileNotFound,
    ConfigFileUnreadable,
    ProductsPerRunOutOfRange,
    /// A required identifier was absent from the request and has no default.
    MissingIdentifier,
    /// The request names a data source this instance does not read.
    UnknownDataSource,
}

/// A start request was rejected before any job was created.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub kind: ValidationKind,
    pub message: String,
}

impl ValidationError {
    pub fn new(kind: ValidationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Errors returned by the orchestrator's public operations.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Job {0} not found")]
    NotFound(String),

    #[error("invalid job transition: {from} -> {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },
}

/// Why a single product did not produce a committed video.
#[derive(Debug, Error)]
pub enum ProductError {
    #[error("{0}")]
    Generation(#[from] GenerationError),

    #[error("Video generation timed out after {0} seconds")]
    Timeout(u64),

    #[error("{0}")]
    Persistence(#[from] StateError),
}

/// Serialized classification of a [`ProductError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductErrorKind {
    Generation,
    Timeout,
    Persistence,
}

impl ProductErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductErrorKind::Generation => "generation",
            ProductErrorKind::Timeout => "timeout",
            ProductErrorKind::Persistence => "persistence",
        }
    }
}

impl ProductError {
    pub fn kind(&self) -> ProductErrorKind {
        match self {
            ProductError::Generation(_) => ProductErrorKind::Generation,
            ProductError::Timeout(_) => ProductErrorKind::Timeout,
            ProductError::Persistence(_) => ProductErrorKind::Persistence,
        }
    }
}

// =============================================================================
// Job lifecycle
// =============================================================================

/// Job lifecycle: `pending → running → completed | failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Running)
                | (JobStatus::Running, JobStatus::Completed)
                | (JobStatus::Running, JobStatus::Failed)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One invocation of the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub job_id: String,
    pub profile_id: String,
    pub status: JobStatus,
    pub config: RunConfig,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Set only when `status` is `failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Set only when `status` is `completed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<JobResult>,
}

impl Job {
    /// Create a pending job with a fresh random id.
    pub fn new(profile_id: impl Into<String>, config: RunConfig) -> Self {
        Self {
            job_id: Uuid::new_v4().to_string(),
            profile_id: profile_id.into(),
            status: JobStatus::Pending,
            config,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            error: None,
            result: None,
        }
    }

    fn transition(&mut self, next: JobStatus) -> Result<(), OrchestratorError> {
        if !self.status.can_transition_to(next) {
            return Err(OrchestratorError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    pub fn mark_running(&mut self) -> Result<(), OrchestratorError> {
        self.transition(JobStatus::Running)?;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    pub fn complete(&mut self, result: JobResult) -> Result<(), OrchestratorError> {
        self.transition(JobStatus::Completed)?;
        self.completed_at = Some(Utc::now());
        self.result = Some(result);
        Ok(())
    }

    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), OrchestratorError> {
        self.transition(JobStatus::Failed)?;
        self.completed_at = Some(Utc::now());
        self.error = Some(error.into());
        Ok(())
    }
}

/// What `start_job` hands back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHandle {
    pub job_id: String,
    pub status_url: String,
}

impl JobHandle {
    pub fn for_job(job_id: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            status_url: format!("/status/{}", job_id),
        }
    }
}

// =============================================================================
// Results
// =============================================================================

/// Outcome of a completed job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobResult {
    /// Products whose video was produced and committed.
    pub products_processed: usize,
    pub products_failed: usize,
    pub products: Vec<ProductOutcome>,
}

impl JobResult {
    pub fn push(&mut self, outcome: ProductOutcome) {
        match outcome.status {
            ProductStatus::Succeeded => self.products_processed += 1,
            ProductStatus::Failed => self.products_failed += 1,
        }
        self.products.push(outcome);
    }

    /// True when the batch was non-empty and no product got past generation.
    pub fn all_failed_generation(&self) -> bool {
        !self.products.is_empty()
            && self.products.iter().all(|p| {
                matches!(
                    p.error_kind,
                    Some(ProductErrorKind::Generation) | Some(ProductErrorKind::Timeout)
                )
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    Succeeded,
    Failed,
}

/// What happened to one product of the batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductOutcome {
    /// Position in the product list.
    pub index: usize,
    pub name: String,
    pub status: ProductStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ProductErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default)]
    pub platforms: BTreeMap<String, PlatformOutcome>,
}

impl ProductOutcome {
    pub fn succeeded(
        index: usize,
        name: impl Into<String>,
        video_url: String,
        platforms: BTreeMap<String, PlatformOutcome>,
    ) -> Self {
        Self {
            index,
            name: name.into(),
            status: ProductStatus::Succeeded,
            error: None,
            error_kind: None,
            video_url: Some(video_url),
            platforms,
        }
    }

    pub fn failed(index: usize, name: impl Into<String>, error: &ProductError) -> Self {
        Self {
            index,
            name: name.into(),
            status: ProductStatus::Failed,
            error: Some(error.to_string()),
            error_kind: Some(error.kind()),
            video_url: None,
            platforms: BTreeMap::new(),
        }
    }
}

/// Result of publishing one product's video to one platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlatformOutcome {
    Published { reference: String },
    Failed { error: String },
}

impl PlatformOutcome {
    pub fn is_published(&self) -> bool {
        matches!(self, PlatformOutcome::Published { .. })
    }
}
