//! High-score alerts: notifies Teams (and optionally email) about
//! opportunities that recently scored at or above the threshold

use super::JobContext;
use athena_common::errors::Result;
use athena_core::db::models::OpportunityScore;
use athena_core::services::CrudService;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{error, info};

const NOT_SPECIFIED: &str = "Not specified";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AlertSummary {
    pub found: usize,
    pub notified: usize,
    pub failed: usize,
}

/// Everything an alert message shows about one scored opportunity
#[derive(Debug, Clone)]
pub struct AlertDetails {
    pub title: String,
    pub notice_id: String,
    pub score: Decimal,
    pub confidence: Option<Decimal>,
    pub agency: Option<String>,
    pub posted_date: Option<NaiveDate>,
    pub deadline: Option<DateTime<FixedOffset>>,
    pub rationale: Option<String>,
    pub link: Option<String>,
}

impl AlertDetails {
    fn score_text(&self) -> String {
        self.score.round().to_string()
    }

    /// Confidence as a whole percentage (stored as a 0..1 fraction)
    fn confidence_percent(&self) -> String {
        let percent = self
            .confidence
            .map(|c| (c * Decimal::ONE_HUNDRED).round())
            .unwrap_or(Decimal::ZERO);
        percent.to_i64().unwrap_or(0).to_string()
    }

    fn agency(&self) -> &str {
        self.agency.as_deref().unwrap_or("Unknown")
    }

    fn posted(&self) -> String {
        self.posted_date
            .map_or_else(|| NOT_SPECIFIED.to_string(), |d| d.to_string())
    }

    fn deadline(&self) -> String {
        self.deadline
            .map_or_else(|| NOT_SPECIFIED.to_string(), |d| d.to_rfc3339())
    }

    fn rationale(&self) -> &str {
        self.rationale
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or("No rationale provided")
    }

    fn link(&self) -> &str {
        self.link.as_deref().filter(|l| !l.is_empty()).unwrap_or("N/A")
    }

    pub fn teams_title(&self) -> String {
        format!("High-Score Opportunity: {}", self.title)
    }

    pub fn teams_message(&self) -> String {
        format!(
            "**High-Score Opportunity Alert**\n\n\
             **Title**: {}\n\n\
             **Score**: {}/100 (AI Confidence: {}%)\n\n\
             **Agency**: {}\n\n\
             **Posted**: {}\n\n\
             **Deadline**: {}\n\n\
             **Rationale**: {}\n\n\
             **Link**: {}",
            self.title,
            self.score_text(),
            self.confidence_percent(),
            self.agency(),
            self.posted(),
            self.deadline(),
            self.rationale(),
            self.link(),
        )
    }

    pub fn email_subject(&self) -> String {
        format!("High-Score Opportunity Alert: {} (Score: {})", self.title, self.score_text())
    }

    pub fn email_body(&self) -> String {
        format!(
            "High-Score Opportunity Alert\n\n\
             Title: {}\n\n\
             AI Score: {}/100 (Confidence: {}%)\n\n\
             Agency: {}\n\
             Posted Date: {}\n\
             Response Deadline: {}\n\n\
             Rationale:\n{}\n\n\
             View Opportunity: {}\n\n\
             ---\n\
             This is an automated alert from Athena Contract Intelligence Platform.",
            self.title,
            self.score_text(),
            self.confidence_percent(),
            self.agency(),
            self.posted(),
            self.deadline(),
            self.rationale(),
            self.link(),
        )
    }
}

pub async fn run(ctx: &JobContext) -> Result<AlertSummary> {
    let settings = &ctx.config.tasks.high_score_alert;
    let threshold = Decimal::from(settings.threshold);
    let since = (Utc::now() - Duration::hours(settings.lookback_hours)).fixed_offset();

    let scores = ctx
        .services
        .opportunity_scores
        .find_high_scores_since(threshold, since)
        .await?;

    let mut summary = AlertSummary {
        found: scores.len(),
        ..AlertSummary::default()
    };
    if scores.is_empty() {
        info!(lookback_hours = settings.lookback_hours, "No high-scoring opportunities found");
        return Ok(summary);
    }
    info!(count = scores.len(), threshold = settings.threshold, "Found high-scoring opportunities");

    for score in &scores {
        match notify(ctx, score).await {
            Ok(()) => summary.notified += 1,
            Err(e) => {
                error!(opportunity_id = %score.opportunity_id, error = %e, "Failed to send alert");
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}

async fn notify(ctx: &JobContext, score: &OpportunityScore) -> Result<()> {
    let details = load_details(ctx, score).await?;
    info!(notice_id = %details.notice_id, score = %details.score, "Sending high-score alert");

    ctx.teams
        .send_message(&details.teams_title(), &details.teams_message())
        .await;

    if let Some(recipient) = ctx
        .config
        .tasks
        .high_score_alert
        .recipient_email
        .as_deref()
        .filter(|r| !r.trim().is_empty())
    {
        // Email failures are already logged by the client
        let _ = ctx
            .email
            .send_text(recipient, &details.email_subject(), &details.email_body())
            .await;
    }

    Ok(())
}

async fn load_details(ctx: &JobContext, score: &OpportunityScore) -> Result<AlertDetails> {
    let opportunity = ctx.services.opportunities.find_by_id(score.opportunity_id).await?;

    let agency = match opportunity.agency_id {
        Some(agency_id) => ctx
            .services
            .agencies
            .find_by_id(agency_id)
            .await
            .ok()
            .map(|agency| agency.name),
        None => None,
    };

    Ok(AlertDetails {
        title: opportunity.title,
        notice_id: opportunity.notice_id,
        score: score.score_value,
        confidence: score.confidence,
        agency,
        posted_date: opportunity.posted_date,
        deadline: opportunity.response_deadline,
        rationale: score.rationale().map(str::to_string),
        link: opportunity.ui_link,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn details() -> AlertDetails {
        AlertDetails {
            title: "Enterprise Cloud Migration".to_string(),
            notice_id: "abc123".to_string(),
            score: Decimal::new(9200, 2),
            confidence: Some(Decimal::new(90, 2)),
            agency: Some("Department of Veterans Affairs".to_string()),
            posted_date: NaiveDate::from_ymd_opt(2026, 10, 1),
            deadline: Some(Utc.with_ymd_and_hms(2026, 11, 15, 0, 0, 0).unwrap().fixed_offset()),
            rationale: Some("Strong NAICS alignment.".to_string()),
            link: Some("https://sam.gov/opp/abc123/view".to_string()),
        }
    }

    #[test]
    fn test_teams_message() {
        let details = details();
        assert_eq!(details.teams_title(), "High-Score Opportunity: Enterprise Cloud Migration");

        let message = details.teams_message();
        assert!(message.contains("**Score**: 92/100 (AI Confidence: 90%)"));
        assert!(message.contains("**Agency**: Department of Veterans Affairs"));
        assert!(message.contains("**Posted**: 2026-10-01"));
        assert!(message.contains("**Deadline**: 2026-11-15T00:00:00+00:00"));
        assert!(message.contains("**Link**: https://sam.gov/opp/abc123/view"));
    }

    #[test]
    fn test_email_fallbacks() {
        let details = AlertDetails {
            confidence: None,
            agency: None,
            posted_date: None,
            rationale: None,
            link: None,
            ..details()
        };

        assert_eq!(
            details.email_subject(),
            "High-Score Opportunity Alert: Enterprise Cloud Migration (Score: 92)"
        );
        let body = details.email_body();
        assert!(body.contains("AI Score: 92/100 (Confidence: 0%)"));
        assert!(body.contains("Agency: Unknown"));
        assert!(body.contains("Posted Date: Not specified"));
        assert!(body.contains("Rationale:\nNo rationale provided"));
        assert!(body.contains("View Opportunity: N/A"));
    }
}
