//! Competitor intelligence service

use super::{now, CrudService};
use crate::db::models::{
    CompetitorIntel, CompetitorIntelActiveModel, CompetitorIntelColumn, CompetitorIntelEntity, OpportunityEntity,
    OrganizationEntity,
};
use crate::db::query::{delete_required, fetch_page, find_required};
use crate::db::DbPool;
use async_trait::async_trait;
use athena_common::errors::Result;
use athena_common::pagination::{Page, PageRequest};
use athena_common::validation::{not_blank, validate_request};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCompetitorIntel {
    pub organization_id: Uuid,

    pub opportunity_id: Uuid,

    #[validate(length(max = 50))]
    pub likelihood: Option<String>,

    pub strengths: Option<String>,

    pub weaknesses: Option<String>,

    #[validate(custom(function = "not_blank"), length(max = 100))]
    pub source: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCompetitorIntel {
    #[validate(length(max = 50))]
    pub likelihood: Option<String>,

    pub strengths: Option<String>,

    pub weaknesses: Option<String>,

    #[validate(custom(function = "not_blank"), length(max = 100))]
    pub source: Option<String>,
}

#[derive(Clone)]
pub struct CompetitorIntelService {
    pool: DbPool,
}

impl CompetitorIntelService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_opportunity(&self, opportunity_id: Uuid) -> Result<Vec<CompetitorIntel>> {
        CompetitorIntelEntity::find()
            .filter(CompetitorIntelColumn::OpportunityId.eq(opportunity_id))
            .order_by_desc(CompetitorIntelColumn::CreatedAt)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_organization(&self, organization_id: Uuid) -> Result<Vec<CompetitorIntel>> {
        CompetitorIntelEntity::find()
            .filter(CompetitorIntelColumn::OrganizationId.eq(organization_id))
            .order_by_desc(CompetitorIntelColumn::CreatedAt)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_likelihood(&self, likelihood: &str) -> Result<Vec<CompetitorIntel>> {
        CompetitorIntelEntity::find()
            .filter(CompetitorIntelColumn::Likelihood.eq(likelihood))
            .order_by_desc(CompetitorIntelColumn::CreatedAt)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }
}

#[async_trait]
impl CrudService for CompetitorIntelService {
    type Model = CompetitorIntel;
    type Create = CreateCompetitorIntel;
    type Update = UpdateCompetitorIntel;

    const RESOURCE: &'static str = "CompetitorIntel";

    async fn create(&self, request: CreateCompetitorIntel) -> Result<CompetitorIntel> {
        validate_request(&request)?;
        find_required::<OrganizationEntity>(self.pool.read(), request.organization_id, "Organization").await?;
        find_required::<OpportunityEntity>(self.pool.read(), request.opportunity_id, "Opportunity").await?;

        let timestamp = now();
        let intel = CompetitorIntelActiveModel {
            id: Set(Uuid::new_v4()),
            organization_id: Set(request.organization_id),
            opportunity_id: Set(request.opportunity_id),
            likelihood: Set(request.likelihood),
            strengths: Set(request.strengths),
            weaknesses: Set(request.weaknesses),
            source: Set(request.source),
            created_at: Set(timestamp),
            updated_at: Set(timestamp),
        };

        intel.insert(self.pool.write()).await.map_err(Into::into)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<CompetitorIntel> {
        find_required::<CompetitorIntelEntity>(self.pool.read(), id, Self::RESOURCE).await
    }

    async fn find_all(&self, page: PageRequest) -> Result<Page<CompetitorIntel>> {
        let select = CompetitorIntelEntity::find().order_by_desc(CompetitorIntelColumn::CreatedAt);
        fetch_page(self.pool.read(), select, &page).await
    }

    async fn update(&self, id: Uuid, request: UpdateCompetitorIntel) -> Result<CompetitorIntel> {
        validate_request(&request)?;
        let existing = find_required::<CompetitorIntelEntity>(self.pool.write(), id, Self::RESOURCE).await?;

        let mut intel: CompetitorIntelActiveModel = existing.into();
        if let Some(likelihood) = request.likelihood {
            intel.likelihood = Set(Some(likelihood));
        }
        if let Some(strengths) = request.strengths {
            intel.strengths = Set(Some(strengths));
        }
        if let Some(weaknesses) = request.weaknesses {
            intel.weaknesses = Set(Some(weaknesses));
        }
        if let Some(source) = request.source {
            intel.source = Set(source);
        }
        intel.updated_at = Set(now());

        intel.update(self.pool.write()).await.map_err(Into::into)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        delete_required::<CompetitorIntelEntity>(self.pool.write(), id, Self::RESOURCE).await
    }
}
