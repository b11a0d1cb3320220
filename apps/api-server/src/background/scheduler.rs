//! Repeated job scheduler using tokio-cron-scheduler.

use std::time::Duration;

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use tollgate_infra::WindowSweeper;

use super::SchedulerConfig;

/// Job scheduler wrapper.
pub struct Scheduler {
    inner: JobScheduler,
    config: SchedulerConfig,
}

impl Scheduler {
    /// Create a new scheduler.
    pub async fn new(config: SchedulerConfig) -> Result<Self, JobSchedulerError> {
        let inner = JobScheduler::new().await?;
        Ok(Self { inner, config })
    }

    /// Add a job that runs every `every`, first firing one period from now.
    pub async fn add_repeated<F, Fut>(
        &self,
        name: &'static str,
        every: Duration,
        task: F,
    ) -> Result<uuid::Uuid, JobSchedulerError>
    where
        F: Fn() -> Fut + Send + Sync + Clone + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let job = Job::new_repeated_async(every, move |_uuid, _lock| {
            let task = task.clone();
            Box::pin(async move {
                task().await;
            })
        })?;

        let id = self.inner.add(job).await?;
        tracing::info!(job = name, every_secs = every.as_secs(), job_id = %id, "Repeated job registered");
        Ok(id)
    }

    /// Start the scheduler.
    pub async fn start(&self) -> Result<(), JobSchedulerError> {
        if !self.config.enabled {
            tracing::info!("Scheduler disabled");
            return Ok(());
        }

        self.inner.start().await?;
        tracing::info!("Scheduler started");
        Ok(())
    }

    /// Stop the scheduler.
    pub async fn shutdown(&mut self) -> Result<(), JobSchedulerError> {
        self.inner.shutdown().await?;
        tracing::info!("Scheduler stopped");
        Ok(())
    }
}

/// Register the stale-window sweep on its own cadence and start the scheduler.
pub async fn start_sweeper(
    config: SchedulerConfig,
    sweeper: WindowSweeper,
    every: Duration,
) -> Result<Scheduler, JobSchedulerError> {
    let scheduler = Scheduler::new(config).await?;

    scheduler
        .add_repeated("rate-limit-sweep", every, move || {
            let sweeper = sweeper.clone();
            async move {
                sweeper.run_once();
            }
        })
        .await?;

    scheduler.start().await?;
    Ok(scheduler)
}
