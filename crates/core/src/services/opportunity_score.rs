//! Opportunity score service

use super::{now, CrudService};
use crate::db::models::{
    OpportunityEntity, OpportunityScore, OpportunityScoreActiveModel, OpportunityScoreColumn, OpportunityScoreEntity,
};
use crate::db::query::{delete_required, fetch_page, find_required};
use crate::db::DbPool;
use async_trait::async_trait;
use athena_common::errors::{AppError, Result};
use athena_common::pagination::{Page, PageRequest};
use athena_common::validation::{not_blank, validate_request};
use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QueryTrait, Select, Set,
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateOpportunityScore {
    pub opportunity_id: Uuid,

    #[validate(custom(function = "not_blank"), length(max = 50))]
    pub score_type: String,

    #[validate(custom(function = "percentage"))]
    pub score_value: Decimal,

    #[validate(custom(function = "percentage"))]
    pub confidence: Option<Decimal>,

    /// Defaults to the insert time
    pub scored_at: Option<DateTimeWithTimeZone>,

    pub metadata: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateOpportunityScore {
    #[validate(custom(function = "not_blank"), length(max = 50))]
    pub score_type: Option<String>,

    #[validate(custom(function = "percentage"))]
    pub score_value: Option<Decimal>,

    #[validate(custom(function = "percentage"))]
    pub confidence: Option<Decimal>,

    pub scored_at: Option<DateTimeWithTimeZone>,

    pub metadata: Option<Value>,
}

/// Scores and confidences live in `numeric(5,2)` and must fit 0..=100
fn percentage(value: &Decimal) -> std::result::Result<(), ValidationError> {
    if *value < Decimal::ZERO || *value > Decimal::ONE_HUNDRED {
        let mut err = ValidationError::new("range");
        err.message = Some("must be between 0 and 100".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Clone)]
pub struct OpportunityScoreService {
    pool: DbPool,
}

impl OpportunityScoreService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_opportunity(&self, opportunity_id: Uuid) -> Result<Vec<OpportunityScore>> {
        OpportunityScoreEntity::find()
            .filter(OpportunityScoreColumn::OpportunityId.eq(opportunity_id))
            .order_by_desc(OpportunityScoreColumn::ScoredAt)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_score_type(&self, score_type: &str) -> Result<Vec<OpportunityScore>> {
        OpportunityScoreEntity::find()
            .filter(OpportunityScoreColumn::ScoreType.eq(score_type))
            .order_by_desc(OpportunityScoreColumn::ScoredAt)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }

    /// Most recent score of `score_type` for an opportunity
    pub async fn find_latest(&self, opportunity_id: Uuid, score_type: &str) -> Result<OpportunityScore> {
        OpportunityScoreEntity::find()
            .filter(OpportunityScoreColumn::OpportunityId.eq(opportunity_id))
            .filter(OpportunityScoreColumn::ScoreType.eq(score_type))
            .order_by_desc(OpportunityScoreColumn::ScoredAt)
            .one(self.pool.read())
            .await?
            .ok_or_else(|| AppError::NotFound {
                resource_type: format!("{} score", score_type),
                id: opportunity_id.to_string(),
            })
    }

    pub async fn exists_for(&self, opportunity_id: Uuid, score_type: &str) -> Result<bool> {
        let count = OpportunityScoreEntity::find()
            .filter(OpportunityScoreColumn::OpportunityId.eq(opportunity_id))
            .filter(OpportunityScoreColumn::ScoreType.eq(score_type))
            .count(self.pool.read())
            .await?;
        Ok(count > 0)
    }

    /// Scores at or above `threshold` created after `after`, best first
    pub async fn find_high_scores_since(
        &self,
        threshold: Decimal,
        after: DateTimeWithTimeZone,
    ) -> Result<Vec<OpportunityScore>> {
        OpportunityScoreEntity::find()
            .filter(OpportunityScoreColumn::ScoreValue.gte(threshold))
            .filter(OpportunityScoreColumn::CreatedAt.gt(after))
            .order_by_desc(OpportunityScoreColumn::ScoreValue)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }

    /// Scores created in `[from, to)`
    pub async fn count_created_between(&self, from: DateTimeWithTimeZone, to: DateTimeWithTimeZone) -> Result<u64> {
        OpportunityScoreEntity::find()
            .filter(OpportunityScoreColumn::CreatedAt.gte(from))
            .filter(OpportunityScoreColumn::CreatedAt.lt(to))
            .count(self.pool.read())
            .await
            .map_err(Into::into)
    }

    /// Scores in `[min, max_exclusive)` created in `[from, to)`; a `None` bound is open
    pub async fn count_in_band(
        &self,
        min: Option<Decimal>,
        max_exclusive: Option<Decimal>,
        from: DateTimeWithTimeZone,
        to: DateTimeWithTimeZone,
    ) -> Result<u64> {
        band_query(min, max_exclusive, from, to)
            .count(self.pool.read())
            .await
            .map_err(Into::into)
    }
}

fn band_query(
    min: Option<Decimal>,
    max_exclusive: Option<Decimal>,
    from: DateTimeWithTimeZone,
    to: DateTimeWithTimeZone,
) -> Select<OpportunityScoreEntity> {
    OpportunityScoreEntity::find()
        .apply_if(min, |query, min| query.filter(OpportunityScoreColumn::ScoreValue.gte(min)))
        .apply_if(max_exclusive, |query, max| query.filter(OpportunityScoreColumn::ScoreValue.lt(max)))
        .filter(OpportunityScoreColumn::CreatedAt.gte(from))
        .filter(OpportunityScoreColumn::CreatedAt.lt(to))
}

#[async_trait]
impl CrudService for OpportunityScoreService {
    type Model = OpportunityScore;
    type Create = CreateOpportunityScore;
    type Update = UpdateOpportunityScore;

    const RESOURCE: &'static str = "OpportunityScore";

    async fn create(&self, request: CreateOpportunityScore) -> Result<OpportunityScore> {
        validate_request(&request)?;
        find_required::<OpportunityEntity>(self.pool.read(), request.opportunity_id, "Opportunity").await?;

        let timestamp = now();
        let score = OpportunityScoreActiveModel {
            id: Set(Uuid::new_v4()),
            opportunity_id: Set(request.opportunity_id),
            score_type: Set(request.score_type),
            score_value: Set(request.score_value),
            confidence: Set(request.confidence),
            scored_at: Set(request.scored_at.unwrap_or(timestamp)),
            metadata: Set(request.metadata),
            created_at: Set(timestamp),
            updated_at: Set(timestamp),
        };

        score.insert(self.pool.write()).await.map_err(Into::into)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<OpportunityScore> {
        find_required::<OpportunityScoreEntity>(self.pool.read(), id, Self::RESOURCE).await
    }

    async fn find_all(&self, page: PageRequest) -> Result<Page<OpportunityScore>> {
        let select = OpportunityScoreEntity::find().order_by_desc(OpportunityScoreColumn::CreatedAt);
        fetch_page(self.pool.read(), select, &page).await
    }

    async fn update(&self, id: Uuid, request: UpdateOpportunityScore) -> Result<OpportunityScore> {
        validate_request(&request)?;
        let existing = find_required::<OpportunityScoreEntity>(self.pool.write(), id, Self::RESOURCE).await?;

        let mut score: OpportunityScoreActiveModel = existing.into();
        if let Some(score_type) = request.score_type {
            score.score_type = Set(score_type);
        }
        if let Some(score_value) = request.score_value {
            score.score_value = Set(score_value);
        }
        if let Some(confidence) = request.confidence {
            score.confidence = Set(Some(confidence));
        }
        if let Some(scored_at) = request.scored_at {
            score.scored_at = Set(scored_at);
        }
        if let Some(metadata) = request.metadata {
            score.metadata = Set(Some(metadata));
        }
        score.updated_at = Set(now());

        score.update(self.pool.write()).await.map_err(Into::into)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        delete_required::<OpportunityScoreEntity>(self.pool.write(), id, Self::RESOURCE).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::prelude::FromPrimitive;
    use sea_orm::DbBackend;

    #[test]
    fn test_percentage_bounds() {
        assert!(percentage(&Decimal::ZERO).is_ok());
        assert!(percentage(&Decimal::ONE_HUNDRED).is_ok());
        assert!(percentage(&Decimal::from_f64(87.5).unwrap()).is_ok());
        assert!(percentage(&Decimal::from(101)).is_err());
        assert!(percentage(&Decimal::from(-1)).is_err());
    }

    #[test]
    fn test_open_band_bounds_are_omitted() {
        let to = now();
        let from = to - chrono::Duration::days(7);
        let sql = |min, max| band_query(min, max, from, to).build(DbBackend::Postgres).to_string();

        let high = sql(Some(Decimal::from(80)), None);
        assert!(high.contains(r#""score_value" >= 80"#));
        assert!(!high.contains(r#""score_value" <"#));

        let low = sql(None, Some(Decimal::from(50)));
        assert!(low.contains(r#""score_value" < 50"#));
        assert!(!low.contains(r#""score_value" >="#));

        let medium = sql(Some(Decimal::from(50)), Some(Decimal::from(80)));
        assert!(medium.contains(r#""score_value" >= 50"#));
        assert!(medium.contains(r#""score_value" < 80"#));
    }
}
