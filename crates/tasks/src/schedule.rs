//! Cron schedules for the enabled jobs

use crate::jobs::JobKind;
use athena_common::config::TasksConfig;
use athena_common::errors::{AppError, Result};
use chrono::{DateTime, Utc};
use cron::Schedule;
use std::str::FromStr;

/// A job bound to its six-field cron expression (sec min hour dom month dow)
#[derive(Debug, Clone)]
pub struct ScheduledJob {
    pub kind: JobKind,
    schedule: Schedule,
}

impl ScheduledJob {
    pub fn new(kind: JobKind, expression: &str) -> Result<Self> {
        let schedule = Schedule::from_str(expression).map_err(|e| AppError::Configuration {
            message: format!("Invalid cron '{}' for {}: {}", expression, kind, e),
        })?;
        Ok(Self { kind, schedule })
    }

    /// First fire time strictly after `after`
    pub fn next_after(&self, after: &DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(after).next()
    }
}

/// Schedules for every enabled job
pub fn build_schedule(config: &TasksConfig) -> Result<Vec<ScheduledJob>> {
    JobKind::ALL
        .iter()
        .filter(|kind| kind.enabled(config))
        .map(|kind| ScheduledJob::new(*kind, kind.cron(config)))
        .collect()
}

/// The job that fires soonest after `after`, with its fire time
pub fn next_due(jobs: &[ScheduledJob], after: DateTime<Utc>) -> Option<(&ScheduledJob, DateTime<Utc>)> {
    jobs.iter()
        .filter_map(|job| job.next_after(&after).map(|at| (job, at)))
        .min_by_key(|(_, at)| *at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Timelike, Weekday};

    #[test]
    fn test_default_schedules_parse() {
        let jobs = build_schedule(&TasksConfig::default()).unwrap();
        assert_eq!(jobs.len(), 4);
    }

    #[test]
    fn test_invalid_cron_is_configuration_error() {
        let err = ScheduledJob::new(JobKind::WeeklyDigest, "every monday").unwrap_err();
        assert!(matches!(err, AppError::Configuration { .. }));
    }

    #[test]
    fn test_next_fire_times() {
        // Saturday 2026-10-17 10:00 UTC
        let saturday = Utc.with_ymd_and_hms(2026, 10, 17, 10, 0, 0).unwrap();

        let alerts = ScheduledJob::new(JobKind::HighScoreAlerts, "0 0 8 * * MON-FRI").unwrap();
        let next = alerts.next_after(&saturday).unwrap();
        assert_eq!(next.weekday(), Weekday::Mon);
        assert_eq!(next.hour(), 8);

        let digest = ScheduledJob::new(JobKind::WeeklyDigest, "0 0 9 * * MON").unwrap();
        assert_eq!(
            digest.next_after(&saturday).unwrap(),
            Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap()
        );

        let import = ScheduledJob::new(JobKind::SamGovImport, "0 0 2 * * *").unwrap();
        assert_eq!(
            import.next_after(&saturday).unwrap(),
            Utc.with_ymd_and_hms(2026, 10, 18, 2, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_next_due_picks_earliest() {
        let jobs = build_schedule(&TasksConfig::default()).unwrap();
        let after = Utc.with_ymd_and_hms(2026, 10, 19, 2, 10, 0).unwrap();

        let (job, at) = next_due(&jobs, after).unwrap();
        assert_eq!(job.kind, JobKind::OpportunityScoring);
        assert_eq!(at, Utc.with_ymd_and_hms(2026, 10, 19, 2, 30, 0).unwrap());

        assert!(next_due(&[], after).is_none());
    }

    #[test]
    fn test_disabled_jobs_are_not_scheduled() {
        let mut config = TasksConfig::default();
        config.weekly_digest.enabled = false;
        config.import.enabled = false;

        let kinds: Vec<JobKind> = build_schedule(&config).unwrap().iter().map(|j| j.kind).collect();
        assert_eq!(kinds, vec![JobKind::OpportunityScoring, JobKind::HighScoreAlerts]);
    }
}
