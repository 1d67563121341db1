//! Background task that starts jobs on a schedule.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::orchestrator::{ConfigSource, JobOrchestrator};

use super::{ScheduleError, SchedulerConfig};

/// Triggers `start_job` with the configured profile and default run config.
pub struct Scheduler {
    config: SchedulerConfig,
    orchestrator: Arc<JobOrchestrator>,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig, orchestrator: Arc<JobOrchestrator>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            orchestrator,
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Start the scheduler (spawns the schedule loop).
    pub fn start(&self) -> Result<(), ScheduleError> {
        self.config.validate()?;

        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Scheduler already running");
            return Ok(());
        }

        info!("Scheduler: will run {}", self.config.describe());
        self.spawn_loop();
        Ok(())
    }

    /// Stop the scheduler. Jobs already started keep running.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Scheduler not running");
            return;
        }

        info!("Stopping scheduler");
        let _ = self.shutdown_tx.send(());
    }

    fn spawn_loop(&self) {
        let running = Arc::clone(&self.running);
        let orchestrator = Arc::clone(&self.orchestrator);
        let config = self.config.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            if config.run_on_start {
                info!("Running job immediately on startup");
                Self::trigger(&orchestrator, &config.profile_id).await;
            }

            loop {
                let now = Utc::now();
                let next = match config.next_run_after(now) {
                    Ok(next) => next,
                    Err(e) => {
                        error!("Scheduler stopped: {}", e);
                        break;
                    }
                };
                let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
                info!("Next scheduled run at {}", next);

                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Scheduler received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(wait) => {
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                        Self::trigger(&orchestrator, &config.profile_id).await;
                    }
                }
            }
            running.store(false, Ordering::SeqCst);
        });
    }

    async fn trigger(orchestrator: &JobOrchestrator, profile_id: &str) {
        match orchestrator.start_job(profile_id, ConfigSource::Defaults).await {
            Ok(handle) => info!("Scheduled job {} started", handle.job_id),
            Err(e) => error!("Scheduled run failed to start: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::ScheduleKind;
    use crate::testing::fixtures;

    #[tokio::test]
    async fn test_run_on_start_triggers_a_job() {
        let orchestrator = Arc::new(fixtures::orchestrator(fixtures::products(2)).orchestrator);
        let config = SchedulerConfig {
            enabled: true,
            kind: ScheduleKind::EveryNHours,
            interval_hours: 24,
            run_on_start: true,
            ..Default::default()
        };
        let scheduler = Scheduler::new(config, Arc::clone(&orchestrator));

        scheduler.start().unwrap();
        assert!(scheduler.is_running());

        for _ in 0..50 {
            if !orchestrator.list_jobs().await.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        let jobs = orchestrator.list_jobs().await;
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].profile_id, "scheduler");

        scheduler.stop();
        assert!(!scheduler.is_running());
    }

    #[tokio::test]
    async fn test_start_rejects_invalid_schedule() {
        let orchestrator = Arc::new(fixtures::orchestrator(vec![]).orchestrator);
        let config = SchedulerConfig {
            time: "noon".to_string(),
            ..Default::default()
        };
        let scheduler = Scheduler::new(config, orchestrator);

        assert!(matches!(
            scheduler.start(),
            Err(ScheduleError::InvalidTime(_))
        ));
        assert!(!scheduler.is_running());
    }
}
