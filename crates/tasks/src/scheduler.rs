//! Cron-driven scheduler loop

use crate::jobs::{self, JobContext, JobKind};
use crate::lock::DistributedLock;
use crate::schedule::{next_due, ScheduledJob};
use athena_common::errors::Result;
use chrono::Utc;
use std::future::Future;
use tracing::{error, info, warn};

/// Run `kind` under its distributed lock. Returns `false` when another
/// instance holds the lock and the run was skipped.
pub async fn run_locked(kind: JobKind, ctx: &JobContext, lock: &DistributedLock) -> Result<bool> {
    let Some(guard) = lock.try_acquire(kind.name()).await? else {
        info!(job = %kind, "Job is running elsewhere, skipping");
        return Ok(false);
    };

    let outcome = jobs::run(kind, ctx).await;

    if let Err(e) = lock.release(guard).await {
        warn!(job = %kind, error = %e, "Failed to release job lock");
    }
    outcome.map(|()| true)
}

/// Fire jobs at their scheduled times until `shutdown` resolves.
/// A job in progress finishes before the loop exits.
pub async fn run(
    jobs: Vec<ScheduledJob>,
    ctx: JobContext,
    lock: DistributedLock,
    shutdown: impl Future<Output = ()>,
) {
    tokio::pin!(shutdown);

    for job in &jobs {
        info!(job = %job.kind, next = ?job.next_after(&Utc::now()), "Scheduled job");
    }

    loop {
        let Some((job, at)) = next_due(&jobs, Utc::now()) else {
            warn!("No jobs scheduled, waiting for shutdown");
            shutdown.as_mut().await;
            break;
        };
        let kind = job.kind;
        let wait = (at - Utc::now()).to_std().unwrap_or_default();

        tokio::select! {
            _ = shutdown.as_mut() => break,
            _ = tokio::time::sleep(wait) => {
                if let Err(e) = run_locked(kind, &ctx, &lock).await {
                    error!(job = %kind, error = %e, "Scheduled run failed");
                }
            }
        }
    }

    info!("Scheduler stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lock::tests::MemoryStore;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_run_locked_skips_when_held() {
        let lock = DistributedLock::new(Arc::new(MemoryStore::default()), Duration::from_secs(60));
        let _held = lock.try_acquire(JobKind::WeeklyDigest.name()).await.unwrap().unwrap();

        // The context is never touched when the lock is taken
        let ctx = test_context();
        let ran = run_locked(JobKind::WeeklyDigest, &ctx, &lock).await.unwrap();
        assert!(!ran);
    }

    #[tokio::test]
    async fn test_scheduler_stops_on_shutdown() {
        let lock = DistributedLock::new(Arc::new(MemoryStore::default()), Duration::from_secs(60));
        let jobs = vec![ScheduledJob::new(JobKind::WeeklyDigest, "0 0 9 * * MON").unwrap()];

        tokio::time::timeout(
            Duration::from_secs(5),
            run(jobs, test_context(), lock, std::future::ready(())),
        )
        .await
        .unwrap();
    }

    fn test_context() -> JobContext {
        use athena_common::config::AppConfig;
        use athena_core::DbPool;
        use sea_orm::DatabaseConnection;

        let pool = DbPool::from_connection(DatabaseConnection::Disconnected);
        JobContext::new(Arc::new(AppConfig::default()), pool).unwrap()
    }
}
