//! Weekly digest email summarising the last seven days of activity

use super::{now, JobContext};
use athena_common::errors::Result;
use athena_core::db::models::SyncStatus;
use athena_core::services::sync_log::{CreateSyncLog, SYNC_TYPE_WEEKLY_DIGEST};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

const HIGH_SCORE: i64 = 80;
const MEDIUM_SCORE: i64 = 50;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WeeklyStats {
    pub opportunities_added: u64,
    pub opportunities_scored: u64,
    pub alerts_sent: u64,
    pub high_scores: u64,
    pub medium_scores: u64,
    pub low_scores: u64,
}

impl WeeklyStats {
    /// Share of new opportunities that got scored, as a whole percentage
    pub fn scoring_rate(&self) -> u64 {
        let added = self.opportunities_added.max(1) as f64;
        (self.opportunities_scored as f64 / added * 100.0).round() as u64
    }

    pub fn insights(&self) -> Vec<String> {
        let mut lines = Vec::new();

        if self.opportunities_added == 0 {
            lines.push("- No new opportunities added this week.".to_string());
        } else {
            lines.push(format!("- {} new opportunities discovered.", self.opportunities_added));
        }

        if self.high_scores > 0 {
            lines.push(format!("- {} high-value opportunities identified!", self.high_scores));
        }

        let rate = self.scoring_rate();
        if rate > 0 {
            lines.push(format!("- {}% of new opportunities scored by AI.", rate));
        }

        if self.alerts_sent > 0 {
            lines.push(format!("- {} alerts delivered to capture team.", self.alerts_sent));
        }

        if lines.len() == 1 && self.opportunities_added == 0 {
            lines.push("- Quiet week - no significant activity.".to_string());
        }

        lines
    }
}

pub fn digest_subject(today: NaiveDate) -> String {
    format!("Athena Weekly Digest - {}", today.format("%Y-%m-%d"))
}

pub fn digest_body(stats: &WeeklyStats, start: NaiveDate, end: NaiveDate) -> String {
    format!(
        "Athena Weekly Digest\n\n\
         Period: {} to {}\n\n\
         Activity Summary:\n\
         ----------------\n\
         Opportunities Added: {}\n\
         Opportunities Scored: {}\n\
         Alerts Sent: {}\n\n\
         Score Breakdown:\n\
         ----------------\n\
         High Scores (80-100): {}\n\
         Medium Scores (50-79): {}\n\
         Low Scores (0-49): {}\n\n\
         Key Insights:\n\
         -------------\n\
         {}\n\n\
         ---\n\
         This is an automated digest from Athena Contract Intelligence Platform.\n\
         To adjust digest settings, contact your system administrator.",
        start,
        end,
        stats.opportunities_added,
        stats.opportunities_scored,
        stats.alerts_sent,
        stats.high_scores,
        stats.medium_scores,
        stats.low_scores,
        stats.insights().join("\n"),
    )
}

pub async fn run(ctx: &JobContext) -> Result<()> {
    let settings = &ctx.config.tasks.weekly_digest;
    if !settings.enabled {
        info!("Weekly digest disabled, skipping");
        return Ok(());
    }
    let Some(recipient) = settings
        .recipient_email
        .as_deref()
        .filter(|r| !r.trim().is_empty())
    else {
        warn!("No weekly digest recipient configured, skipping");
        return Ok(());
    };

    let started_at = now();
    let outcome = send_digest(ctx, recipient, started_at).await;

    let mut log = CreateSyncLog::completed(
        SYNC_TYPE_WEEKLY_DIGEST,
        if outcome.is_ok() {
            SyncStatus::Success
        } else {
            SyncStatus::Failed
        },
        started_at,
    );
    match &outcome {
        Ok(stats) => log.records_processed = Some(stats.opportunities_added as i32),
        Err(e) => {
            log.error_count = Some(1);
            log.error_log = Some(format!("Error: {}", e));
        }
    }
    ctx.record_sync(log).await;

    outcome.map(|_| ())
}

async fn send_digest(ctx: &JobContext, recipient: &str, end: DateTime<FixedOffset>) -> Result<WeeklyStats> {
    let start = end - Duration::days(7);
    let stats = collect_stats(ctx, start, end).await?;

    let subject = digest_subject(end.date_naive());
    let body = digest_body(&stats, start.date_naive(), end.date_naive());
    ctx.email.send_text(recipient, &subject, &body).await?;

    info!(
        recipient,
        added = stats.opportunities_added,
        scored = stats.opportunities_scored,
        "Weekly digest sent"
    );
    Ok(stats)
}

async fn collect_stats(
    ctx: &JobContext,
    from: DateTime<FixedOffset>,
    to: DateTime<FixedOffset>,
) -> Result<WeeklyStats> {
    let services = &ctx.services;
    let scores = &services.opportunity_scores;
    let high = Decimal::from(HIGH_SCORE);
    let medium = Decimal::from(MEDIUM_SCORE);

    Ok(WeeklyStats {
        opportunities_added: services.opportunities.count_created_between(from, to).await?,
        opportunities_scored: scores.count_created_between(from, to).await?,
        alerts_sent: services.alerts.count_created_between(from, to).await?,
        high_scores: scores.count_in_band(Some(high), None, from, to).await?,
        medium_scores: scores.count_in_band(Some(medium), Some(high), from, to).await?,
        low_scores: scores.count_in_band(None, Some(medium), from, to).await?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_week() {
        let stats = WeeklyStats::default();
        assert_eq!(
            stats.insights(),
            vec![
                "- No new opportunities added this week.",
                "- Quiet week - no significant activity.",
            ]
        );
    }

    #[test]
    fn test_busy_week_insights() {
        let stats = WeeklyStats {
            opportunities_added: 40,
            opportunities_scored: 30,
            alerts_sent: 3,
            high_scores: 5,
            medium_scores: 15,
            low_scores: 10,
        };
        assert_eq!(stats.scoring_rate(), 75);
        assert_eq!(
            stats.insights(),
            vec![
                "- 40 new opportunities discovered.",
                "- 5 high-value opportunities identified!",
                "- 75% of new opportunities scored by AI.",
                "- 3 alerts delivered to capture team.",
            ]
        );
    }

    #[test]
    fn test_scored_backlog_without_new_opportunities() {
        // Older opportunities scored this week still count against a floor of one
        let stats = WeeklyStats {
            opportunities_scored: 2,
            ..WeeklyStats::default()
        };
        let insights = stats.insights();
        assert!(insights.contains(&"- 200% of new opportunities scored by AI.".to_string()));
        assert!(!insights.iter().any(|l| l.contains("Quiet week")));
    }

    #[test]
    fn test_digest_layout() {
        let start = NaiveDate::from_ymd_opt(2026, 10, 12).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let stats = WeeklyStats {
            opportunities_added: 12,
            high_scores: 2,
            ..WeeklyStats::default()
        };

        assert_eq!(digest_subject(end), "Athena Weekly Digest - 2026-10-19");
        let body = digest_body(&stats, start, end);
        assert!(body.starts_with("Athena Weekly Digest\n\nPeriod: 2026-10-12 to 2026-10-19\n"));
        assert!(body.contains("Opportunities Added: 12\n"));
        assert!(body.contains("High Scores (80-100): 2\n"));
        assert!(body.contains("Key Insights:\n-------------\n- 12 new opportunities discovered.\n"));
        assert!(body.ends_with("contact your system administrator."));
    }
}
