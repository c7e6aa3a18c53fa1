//! Scheduled jobs and the shared context they run against

pub mod high_score_alerts;
pub mod import;
pub mod scoring;
pub mod weekly_digest;

use athena_common::config::{AppConfig, TasksConfig};
use athena_common::errors::{AppError, Result};
use athena_common::metrics::record_job_run;
use athena_core::clients::{ClaudeClient, EmailClient, TeamsClient};
use athena_core::services::sync_log::CreateSyncLog;
use athena_core::services::{CrudService, Services};
use athena_core::{DbPool, SamGovLoader};
use chrono::{DateTime, FixedOffset, Utc};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    SamGovImport,
    OpportunityScoring,
    HighScoreAlerts,
    WeeklyDigest,
}

impl JobKind {
    pub const ALL: [JobKind; 4] = [
        JobKind::SamGovImport,
        JobKind::OpportunityScoring,
        JobKind::HighScoreAlerts,
        JobKind::WeeklyDigest,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            JobKind::SamGovImport => "sam-gov-import",
            JobKind::OpportunityScoring => "opportunity-scoring",
            JobKind::HighScoreAlerts => "high-score-alerts",
            JobKind::WeeklyDigest => "weekly-digest",
        }
    }

    pub fn cron<'a>(&self, config: &'a TasksConfig) -> &'a str {
        match self {
            JobKind::SamGovImport => &config.import.cron,
            JobKind::OpportunityScoring => &config.scoring.cron,
            JobKind::HighScoreAlerts => &config.high_score_alert.cron,
            JobKind::WeeklyDigest => &config.weekly_digest.cron,
        }
    }

    pub fn enabled(&self, config: &TasksConfig) -> bool {
        match self {
            JobKind::SamGovImport => config.import.enabled,
            JobKind::OpportunityScoring => config.scoring.enabled,
            JobKind::HighScoreAlerts => config.high_score_alert.enabled,
            JobKind::WeeklyDigest => config.weekly_digest.enabled,
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for JobKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        JobKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| AppError::InvalidFormat {
                message: format!(
                    "Unknown job '{}', expected one of: {}",
                    s,
                    JobKind::ALL.map(|k| k.name()).join(", ")
                ),
            })
    }
}

/// Everything a job needs: configuration, services and outbound clients
#[derive(Clone)]
pub struct JobContext {
    pub config: Arc<AppConfig>,
    pub services: Arc<Services>,
    pub loader: SamGovLoader,
    /// Absent when no Claude API key is configured
    pub claude: Option<Arc<ClaudeClient>>,
    pub teams: Arc<TeamsClient>,
    pub email: EmailClient,
}

impl JobContext {
    pub fn new(config: Arc<AppConfig>, pool: DbPool) -> Result<Self> {
        let claude = match ClaudeClient::new(&config.claude) {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                warn!(error = %e, "Claude client unavailable, scoring will fail");
                None
            }
        };

        Ok(Self {
            services: Arc::new(Services::new(pool.clone())),
            loader: SamGovLoader::new(pool),
            claude,
            teams: Arc::new(TeamsClient::new(&config.teams)?),
            email: EmailClient::from_config(&config.email)?,
            config,
        })
    }

    pub fn claude(&self) -> Result<&ClaudeClient> {
        self.claude.as_deref().ok_or_else(|| AppError::Configuration {
            message: "claude.api_key is not set".to_string(),
        })
    }

    /// Write a finished-run audit record; failures are logged, not returned
    pub(crate) async fn record_sync(&self, request: CreateSyncLog) {
        let sync_type = request.sync_type.clone();
        if let Err(e) = self.services.sync_logs.create(request).await {
            error!(sync_type = %sync_type, error = %e, "Failed to write sync log");
        }
    }
}

/// Run one job to completion, recording duration and outcome metrics
pub async fn run(kind: JobKind, ctx: &JobContext) -> Result<()> {
    info!(job = %kind, "Starting job");
    let start = Instant::now();

    let outcome = match kind {
        JobKind::SamGovImport => import::run(ctx).await.map(|_| ()),
        JobKind::OpportunityScoring => scoring::run(ctx).await.map(|_| ()),
        JobKind::HighScoreAlerts => high_score_alerts::run(ctx).await.map(|_| ()),
        JobKind::WeeklyDigest => weekly_digest::run(ctx).await,
    };

    let elapsed = start.elapsed().as_secs_f64();
    match &outcome {
        Ok(()) => {
            record_job_run(kind.name(), "success", elapsed);
            info!(job = %kind, duration_secs = elapsed, "Job completed");
        }
        Err(e) => {
            record_job_run(kind.name(), "failure", elapsed);
            error!(job = %kind, error = %e, duration_secs = elapsed, "Job failed");
        }
    }
    outcome
}

/// Current time as stored in `timestamptz` columns
pub(crate) fn now() -> DateTime<FixedOffset> {
    Utc::now().fixed_offset()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_names_round_trip() {
        for kind in JobKind::ALL {
            assert_eq!(kind.name().parse::<JobKind>().unwrap(), kind);
        }
        assert!(matches!(
            "reindex".parse::<JobKind>(),
            Err(AppError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_cron_lookup() {
        let config = TasksConfig::default();
        assert_eq!(JobKind::SamGovImport.cron(&config), "0 0 2 * * *");
        assert_eq!(JobKind::OpportunityScoring.cron(&config), "0 30 2 * * *");
        assert!(JobKind::WeeklyDigest.enabled(&config));
    }
}
