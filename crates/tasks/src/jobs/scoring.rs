//! AI scoring: asks Claude to score every opportunity that has no `AI` score yet
//!
//! Opportunities are read newest-first a page at a time and scored in
//! chunks, with a bounded number of concurrent Claude calls per chunk.
//! A failure on one opportunity is logged and counted; the run goes on.

use super::{now, JobContext};
use athena_common::errors::Result;
use athena_common::pagination::PageRequest;
use athena_core::clients::ClaudeClient;
use athena_core::db::models::{Opportunity, SyncStatus, SCORE_TYPE_AI};
use athena_core::services::opportunity_score::CreateOpportunityScore;
use athena_core::services::sync_log::{CreateSyncLog, SYNC_TYPE_AI_SCORING};
use athena_core::services::CrudService;
use futures::stream::{self, StreamExt};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, error, info, warn};

const NO_DESCRIPTION: &str = "No description available";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScoringSummary {
    pub scored: usize,
    pub skipped: usize,
    pub failed: usize,
}

enum Outcome {
    Scored,
    Skipped,
}

/// Confidence attached to a score: 0.90 for 80+, 0.70 for 50+, else 0.50
pub fn confidence_for(score: u32) -> Decimal {
    match score {
        80.. => Decimal::new(90, 2),
        50..=79 => Decimal::new(70, 2),
        _ => Decimal::new(50, 2),
    }
}

pub async fn run(ctx: &JobContext) -> Result<ScoringSummary> {
    let started_at = now();
    let outcome = score_all(ctx).await;

    let mut log = CreateSyncLog::completed(
        SYNC_TYPE_AI_SCORING,
        if outcome.is_ok() {
            SyncStatus::Success
        } else {
            SyncStatus::Failed
        },
        started_at,
    );
    match &outcome {
        Ok(summary) => {
            log.records_processed = Some(summary.scored as i32);
            log.error_count = Some(summary.failed as i32);
        }
        Err(e) => {
            log.error_count = Some(1);
            log.error_log = Some(e.to_string());
        }
    }
    ctx.record_sync(log).await;

    outcome
}

async fn score_all(ctx: &JobContext) -> Result<ScoringSummary> {
    let claude = ctx.claude()?;
    let settings = &ctx.config.tasks.scoring;
    let chunk_size = settings.chunk_size.max(1);
    let concurrency = settings.concurrency.max(1);

    let mut summary = ScoringSummary::default();
    let mut page = PageRequest::new(0, settings.page_size);

    loop {
        let batch = ctx.services.opportunities.find_for_scoring(page).await?;
        debug!(page = batch.page, items = batch.content.len(), "Read scoring page");

        for chunk in batch.content.chunks(chunk_size) {
            let outcomes: Vec<(&Opportunity, Result<Outcome>)> = stream::iter(chunk)
                .map(|opportunity| async move { (opportunity, score_one(ctx, claude, opportunity).await) })
                .buffer_unordered(concurrency)
                .collect()
                .await;

            for (opportunity, outcome) in outcomes {
                match outcome {
                    Ok(Outcome::Scored) => summary.scored += 1,
                    Ok(Outcome::Skipped) => summary.skipped += 1,
                    Err(e) => {
                        error!(notice_id = %opportunity.notice_id, error = %e, "Failed to score opportunity");
                        summary.failed += 1;
                    }
                }
            }
        }

        if batch.is_last() {
            break;
        }
        page.page += 1;
    }

    info!(
        scored = summary.scored,
        skipped = summary.skipped,
        failed = summary.failed,
        "Opportunity scoring finished"
    );
    Ok(summary)
}

async fn score_one(ctx: &JobContext, claude: &ClaudeClient, opportunity: &Opportunity) -> Result<Outcome> {
    if opportunity.title.trim().is_empty() {
        warn!(notice_id = %opportunity.notice_id, "Opportunity missing title, skipping");
        return Ok(Outcome::Skipped);
    }

    let scores = &ctx.services.opportunity_scores;
    if scores.exists_for(opportunity.id, SCORE_TYPE_AI).await? {
        debug!(notice_id = %opportunity.notice_id, "Opportunity already scored");
        return Ok(Outcome::Skipped);
    }

    let description = opportunity
        .description
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .unwrap_or(NO_DESCRIPTION);

    let result = claude
        .score_opportunity(
            &opportunity.title,
            description,
            &ctx.config.tasks.scoring.company_capabilities,
        )
        .await?;

    scores
        .create(CreateOpportunityScore {
            opportunity_id: opportunity.id,
            score_type: SCORE_TYPE_AI.to_string(),
            score_value: Decimal::from(result.score),
            confidence: Some(confidence_for(result.score)),
            scored_at: None,
            metadata: Some(json!({ "rationale": result.rationale })),
        })
        .await?;

    info!(notice_id = %opportunity.notice_id, score = result.score, "Scored opportunity");
    Ok(Outcome::Scored)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_bands() {
        assert_eq!(confidence_for(100), Decimal::new(90, 2));
        assert_eq!(confidence_for(80), Decimal::new(90, 2));
        assert_eq!(confidence_for(79), Decimal::new(70, 2));
        assert_eq!(confidence_for(50), Decimal::new(70, 2));
        assert_eq!(confidence_for(49), Decimal::new(50, 2));
        assert_eq!(confidence_for(0), Decimal::new(50, 2));
    }
}
