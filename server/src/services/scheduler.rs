/// Scheduler Service
/// Runs the dues ledger retention job on a cron schedule and on demand
use crate::config::{LEDGER_CLEANUP_CRON, LEDGER_RETENTION_MONTHS};
use crate::database::Repository;
use crate::error::{AppError, Result};
use crate::period::DuesMonth;
use chrono::{Local, NaiveDate};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_cron_scheduler::{Job, JobScheduler};
use uuid::Uuid;

/// First month kept by the retention policy
pub fn retention_cutoff(today: NaiveDate) -> DuesMonth {
    DuesMonth::from_date(today).minus_months(LEDGER_RETENTION_MONTHS)
}

/// Deletes ledger rows older than the retention window
#[derive(Clone)]
pub struct LedgerRetention {
    repo: Repository,
}

impl LedgerRetention {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Purge every ledger month before the cutoff for `today`
    pub async fn run_cleanup(&self, today: NaiveDate) -> Result<u64> {
        let cutoff = retention_cutoff(today);
        let removed = self.repo.purge_ledger_before(cutoff).await?;

        if removed > 0 {
            tracing::info!("Ledger retention removed {} rows before {}", removed, cutoff);
        } else {
            tracing::debug!("Ledger retention: nothing before {}", cutoff);
        }

        Ok(removed)
    }

    /// Fire-and-forget cleanup; failures are only logged
    pub fn spawn_cleanup(&self, today: NaiveDate) {
        let retention = self.clone();
        tokio::spawn(async move {
            if let Err(e) = retention.run_cleanup(today).await {
                tracing::error!("Ledger retention failed: {}", e);
            }
        });
    }
}

/// Scheduler service for periodic maintenance
pub struct SchedulerService {
    scheduler: Arc<RwLock<JobScheduler>>,
    retention: LedgerRetention,
    current_job_id: Arc<RwLock<Option<Uuid>>>,
}

impl SchedulerService {
    pub async fn new(retention: LedgerRetention) -> Result<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::Scheduler(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self {
            scheduler: Arc::new(RwLock::new(scheduler)),
            retention,
            current_job_id: Arc::new(RwLock::new(None)),
        })
    }

    /// Register the daily retention job and start the scheduler
    pub async fn start(&self) -> Result<()> {
        self.schedule_retention(LEDGER_CLEANUP_CRON).await?;

        let scheduler = self.scheduler.read().await;
        scheduler
            .start()
            .await
            .map_err(|e| AppError::Scheduler(format!("Failed to start scheduler: {}", e)))?;
        tracing::info!("Maintenance scheduler started");
        Ok(())
    }

    /// Replace the retention job with one on `cron_expr`
    pub async fn schedule_retention(&self, cron_expr: &str) -> Result<()> {
        self.cancel_retention().await?;

        let retention = self.retention.clone();

        let job = Job::new_async(cron_expr, move |_uuid, _l| {
            let retention = retention.clone();
            Box::pin(async move {
                tracing::info!("Running scheduled ledger retention");
                let today = Local::now().date_naive();
                if let Err(e) = retention.run_cleanup(today).await {
                    tracing::error!("Scheduled ledger retention failed: {}", e);
                }
            })
        })
        .map_err(|e| AppError::Scheduler(format!("Failed to create retention job: {}", e)))?;

        let job_id = job.guid();

        let scheduler = self.scheduler.write().await;
        scheduler
            .add(job)
            .await
            .map_err(|e| AppError::Scheduler(format!("Failed to schedule job: {}", e)))?;

        *self.current_job_id.write().await = Some(job_id);

        tracing::info!("Ledger retention scheduled ({})", cron_expr);
        Ok(())
    }

    pub async fn cancel_retention(&self) -> Result<()> {
        let mut current_job = self.current_job_id.write().await;

        if let Some(job_id) = *current_job {
            let scheduler = self.scheduler.write().await;
            scheduler
                .remove(&job_id)
                .await
                .map_err(|e| AppError::Scheduler(format!("Failed to remove job: {}", e)))?;

            *current_job = None;
            tracing::info!("Ledger retention schedule cancelled");
        }

        Ok(())
    }

    /// Shutdown scheduler gracefully
    pub async fn shutdown(&self) -> Result<()> {
        let mut scheduler = self.scheduler.write().await;
        scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::Scheduler(format!("Failed to shutdown scheduler: {}", e)))?;
        tracing::info!("Maintenance scheduler shutdown");
        Ok(())
    }
}
