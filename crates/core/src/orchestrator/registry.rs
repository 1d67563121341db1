//! In-memory job records. Lost on restart.

use std::collections::HashMap;

use serde::Serialize;
use tokio::sync::RwLock;

use super::types::{Job, JobStatus, OrchestratorError};

/// Number of jobs in each status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JobCounts {
    pub pending: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
}

impl JobCounts {
    pub fn total(&self) -> usize {
        self.pending + self.running + self.completed + self.failed
    }
}

/// Volatile store of job records keyed by job id.
#[derive(Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<String, Job>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, job: Job) {
        self.jobs.write().await.insert(job.job_id.clone(), job);
    }

    pub async fn get(&self, job_id: &str) -> Option<Job> {
        self.jobs.read().await.get(job_id).cloned()
    }

    /// All jobs, newest first.
    pub async fn list(&self) -> Vec<Job> {
        let mut jobs: Vec<Job> = self.jobs.read().await.values().cloned().collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs
    }

    /// Apply `f` to the stored job and return the updated snapshot.
    pub async fn update<F>(&self, job_id: &str, f: F) -> Result<Job, OrchestratorError>
    where
        F: FnOnce(&mut Job) -> Result<(), OrchestratorError>,
    {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(job_id)
            .ok_or_else(|| OrchestratorError::NotFound(job_id.to_string()))?;
        f(job)?;
        Ok(job.clone())
    }

    pub async fn counts(&self) -> JobCounts {
        let jobs = self.jobs.read().await;
        let mut counts = JobCounts::default();
        for job in jobs.values() {
            match job.status {
                JobStatus::Pending => counts.pending += 1,
                JobStatus::Running => counts.running += 1,
                JobStatus::Completed => counts.completed += 1,
                JobStatus::Failed => counts.failed += 1,
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::RunConfig;

    fn job(profile: &str) -> Job {
        Job::new(
            profile,
            RunConfig {
                project_id: "p".to_string(),
                data_source_id: "d".to_string(),
                products_per_run: 1,
                platforms: vec![],
            },
        )
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let registry = JobRegistry::new();
        let job = job("daily");
        let id = job.job_id.clone();
        registry.insert(job).await;

        let fetched = registry.get(&id).await.unwrap();
        assert_eq!(fetched.profile_id, "daily");
        assert!(registry.get("missing").await.is_none());
    }

    #[tokio::test]
    async fn test_update_applies_transition() {
        let registry = JobRegistry::new();
        let job = job("daily");
        let id = job.job_id.clone();
        registry.insert(job).await;

        let updated = registry.update(&id, |j| j.mark_running()).await.unwrap();
        assert_eq!(updated.status, JobStatus::Running);
        assert_eq!(registry.get(&id).await.unwrap().status, JobStatus::Running);

        let err = registry.update(&id, |j| j.mark_running()).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_update_unknown_job() {
        let registry = JobRegistry::new();
        let err = registry.update("nope", |j| j.mark_running()).await.unwrap_err();
        assert_eq!(err.to_string(), "Job nope not found");
    }

    #[tokio::test]
    async fn test_counts_and_list() {
        let registry = JobRegistry::new();
        let first = job("a");
        let first_id = first.job_id.clone();
        registry.insert(first).await;
        registry.insert(job("b")).await;
        registry
            .update(&first_id, |j| j.mark_running())
            .await
            .unwrap();

        let counts = registry.counts().await;
        assert_eq!(counts.pending, 1);
        assert_eq!(counts.running, 1);
        assert_eq!(counts.total(), 2);
        assert_eq!(registry.list().await.len(), 2);
    }
}
