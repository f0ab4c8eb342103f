use chrono::{Duration as ChronoDuration, Utc};
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::database::verify_emails;
use crate::error::{Error, Result};
use crate::services::queue_service::purge_completed_tasks;

/// Top of every hour (seconds-first cron syntax).
pub const HOUSEKEEPING_SCHEDULE: &str = "0 0 * * * *";

const COMPLETED_TASK_RETENTION_DAYS: i64 = 7;
const EXPIRED_VERIFY_RETENTION_DAYS: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HousekeepingReport {
    pub purged_tasks: u64,
    pub purged_verify_emails: u64,
}

#[derive(Clone)]
pub struct HousekeepingService {
    pool: PgPool,
}

impl HousekeepingService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn run_once(&self) -> Result<HousekeepingReport> {
        let now = Utc::now();
        let purged_tasks = purge_completed_tasks(
            &self.pool,
            now - ChronoDuration::days(COMPLETED_TASK_RETENTION_DAYS),
        )
        .await?;
        let purged_verify_emails = verify_emails::delete_expired_verify_emails(
            &self.pool,
            now - ChronoDuration::days(EXPIRED_VERIFY_RETENTION_DAYS),
        )
        .await?;

        Ok(HousekeepingReport {
            purged_tasks,
            purged_verify_emails,
        })
    }

    /// Registers the hourly cleanup and starts the scheduler. The returned
    /// scheduler must be kept alive for the job to keep firing.
    pub async fn start(self) -> Result<JobScheduler> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| Error::Internal(format!("scheduler init failed: {:?}", e)))?;

        let job = Job::new_async(HOUSEKEEPING_SCHEDULE, move |_id, _scheduler| {
            let service = self.clone();
            Box::pin(async move {
                match service.run_once().await {
                    Ok(report) => tracing::info!(
                        purged_tasks = report.purged_tasks,
                        purged_verify_emails = report.purged_verify_emails,
                        "housekeeping finished"
                    ),
                    Err(e) => tracing::error!(error = ?e, "housekeeping failed"),
                }
            })
        })
        .map_err(|e| Error::Internal(format!("invalid housekeeping schedule: {:?}", e)))?;

        scheduler
            .add(job)
            .await
            .map_err(|e| Error::Internal(format!("scheduling housekeeping failed: {:?}", e)))?;
        scheduler
            .start()
            .await
            .map_err(|e| Error::Internal(format!("scheduler start failed: {:?}", e)))?;

        tracing::info!(schedule = HOUSEKEEPING_SCHEDULE, "housekeeping scheduled");
        Ok(scheduler)
    }
}
