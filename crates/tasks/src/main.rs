//! Athena Task Runner
//!
//! Runs the scheduled jobs:
//! 1. SAM.gov import from local JSON exports
//! 2. AI scoring of unscored opportunities
//! 3. High-score alerts to Teams and email
//! 4. Weekly digest email
//!
//! `athena-tasks` starts the scheduler; `athena-tasks run <job>` runs one
//! job once and exits.

mod jobs;
mod lock;
mod schedule;
mod scheduler;

use crate::jobs::{JobContext, JobKind};
use crate::lock::DistributedLock;
use athena_common::{
    cache::Cache,
    config::AppConfig,
    metrics::{self, JOB_BUCKETS, LLM_BUCKETS},
    VERSION,
};
use athena_core::DbPool;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let one_shot = match parse_args(std::env::args().skip(1)) {
        Ok(job) => job,
        Err(message) => {
            eprintln!("{}", message);
            std::process::exit(2);
        }
    };

    let config = AppConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;

    init_tracing(&config);
    info!(service = %config.observability.service_name, "Starting Athena Task Runner v{}", VERSION);

    let config = Arc::new(config);

    if config.observability.metrics_enabled {
        install_prometheus(config.observability.metrics_port)?;
    }
    metrics::register_metrics();

    info!("Connecting to database...");
    let db = DbPool::new(&config.database).await?;
    if config.database.run_migrations {
        db.run_migrations().await?;
    }

    info!("Connecting to Redis...");
    let cache = Cache::new(&config.redis).await?;
    let lock = DistributedLock::new(
        Arc::new(cache),
        Duration::from_secs(config.tasks.lock.lock_at_most_secs),
    );

    let ctx = JobContext::new(config.clone(), db)?;

    // One-shot mode: run a single job and exit
    if let Some(kind) = one_shot {
        return match scheduler::run_locked(kind, &ctx, &lock).await {
            Ok(_) => Ok(()),
            Err(e) => {
                error!(job = %kind, error = %e, "Job failed");
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        };
    }

    let jobs = schedule::build_schedule(&config.tasks)?;
    info!(jobs = jobs.len(), "Scheduler ready");

    scheduler::run(jobs, ctx, lock, shutdown_signal()).await;

    info!("Task runner shutdown complete");
    Ok(())
}

const USAGE: &str = "Usage: athena-tasks [run <job>]";

/// `None` starts the scheduler; `Some(job)` runs that job once
fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Option<JobKind>, String> {
    match (args.next(), args.next(), args.next()) {
        (None, _, _) => Ok(None),
        (Some(command), Some(job), None) if command == "run" => {
            job.parse().map(Some).map_err(|e| format!("{}\n{}", e, USAGE))
        }
        _ => Err(USAGE.to_string()),
    }
}

/// Serves Prometheus text on `0.0.0.0:{port}`
fn install_prometheus(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    PrometheusBuilder::new()
        .with_http_listener(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)))
        .set_buckets_for_metric(Matcher::Suffix("job_duration_seconds".to_string()), JOB_BUCKETS)?
        .set_buckets_for_metric(Matcher::Suffix("llm_duration_seconds".to_string()), LLM_BUCKETS)?
        .install()?;
    info!(port, "Prometheus exporter listening");
    Ok(())
}

/// `RUST_LOG` wins over the configured level
fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.observability.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> impl Iterator<Item = String> {
        values.iter().map(|v| v.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn test_no_arguments_starts_scheduler() {
        assert_eq!(parse_args(args(&[])), Ok(None));
    }

    #[test]
    fn test_run_names_a_job() {
        assert_eq!(
            parse_args(args(&["run", "weekly-digest"])),
            Ok(Some(JobKind::WeeklyDigest))
        );
    }

    #[test]
    fn test_bad_arguments_are_rejected() {
        let err = parse_args(args(&["run", "weekly-digets"])).unwrap_err();
        assert!(err.contains("Unknown job 'weekly-digets'"));
        assert!(err.ends_with(USAGE));

        assert_eq!(parse_args(args(&["run"])), Err(USAGE.to_string()));
        assert_eq!(parse_args(args(&["start", "weekly-digest"])), Err(USAGE.to_string()));
        assert_eq!(
            parse_args(args(&["run", "weekly-digest", "now"])),
            Err(USAGE.to_string())
        );
    }
}
