//! Capture team service

use super::{now, CrudService};
use crate::db::models::{OpportunityEntity, OrganizationEntity, Team, TeamActiveModel, TeamColumn, TeamEntity, UserEntity};
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
pub struct CreateTeam {
    pub lead_organization_id: Uuid,

    pub opportunity_id: Uuid,

    #[validate(custom(function = "not_blank"), length(max = 255))]
    pub team_name: String,

    #[validate(custom(function = "not_blank"), length(max = 50))]
    pub status: String,

    pub created_by: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateTeam {
    pub lead_organization_id: Option<Uuid>,

    #[validate(custom(function = "not_blank"), length(max = 255))]
    pub team_name: Option<String>,

    #[validate(custom(function = "not_blank"), length(max = 50))]
    pub status: Option<String>,
}

#[derive(Clone)]
pub struct TeamService {
    pool: DbPool,
}

impl TeamService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_lead_organization(&self, organization_id: Uuid) -> Result<Vec<Team>> {
        TeamEntity::find()
            .filter(TeamColumn::LeadOrganizationId.eq(organization_id))
            .order_by_desc(TeamColumn::CreatedAt)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_opportunity(&self, opportunity_id: Uuid) -> Result<Vec<Team>> {
        TeamEntity::find()
            .filter(TeamColumn::OpportunityId.eq(opportunity_id))
            .order_by_desc(TeamColumn::CreatedAt)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_status(&self, status: &str) -> Result<Vec<Team>> {
        TeamEntity::find()
            .filter(TeamColumn::Status.eq(status))
            .order_by_desc(TeamColumn::CreatedAt)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_created_by(&self, user_id: Uuid) -> Result<Vec<Team>> {
        TeamEntity::find()
            .filter(TeamColumn::CreatedBy.eq(user_id))
            .order_by_desc(TeamColumn::CreatedAt)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }
}

#[async_trait]
impl CrudService for TeamService {
    type Model = Team;
    type Create = CreateTeam;
    type Update = UpdateTeam;

    const RESOURCE: &'static str = "Team";

    async fn create(&self, request: CreateTeam) -> Result<Team> {
        validate_request(&request)?;
        find_required::<OrganizationEntity>(self.pool.read(), request.lead_organization_id, "Organization").await?;
        find_required::<OpportunityEntity>(self.pool.read(), request.opportunity_id, "Opportunity").await?;
        find_required::<UserEntity>(self.pool.read(), request.created_by, "User").await?;

        let timestamp = now();
        let team = TeamActiveModel {
            id: Set(Uuid::new_v4()),
            lead_organization_id: Set(request.lead_organization_id),
            opportunity_id: Set(request.opportunity_id),
            team_name: Set(request.team_name),
            status: Set(request.status),
            created_by: Set(request.created_by),
            created_at: Set(timestamp),
            updated_at: Set(timestamp),
        };

        team.insert(self.pool.write()).await.map_err(Into::into)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Team> {
        find_required::<TeamEntity>(self.pool.read(), id, Self::RESOURCE).await
    }

    async fn find_all(&self, page: PageRequest) -> Result<Page<Team>> {
        let select = TeamEntity::find().order_by_desc(TeamColumn::CreatedAt);
        fetch_page(self.pool.read(), select, &page).await
    }

    async fn update(&self, id: Uuid, request: UpdateTeam) -> Result<Team> {
        validate_request(&request)?;
        let existing = find_required::<TeamEntity>(self.pool.write(), id, Self::RESOURCE).await?;

        if let Some(lead_organization_id) = request.lead_organization_id {
            find_required::<OrganizationEntity>(self.pool.read(), lead_organization_id, "Organization").await?;
        }

        let mut team: TeamActiveModel = existing.into();
        if let Some(lead_organization_id) = request.lead_organization_id {
            team.lead_organization_id = Set(lead_organization_id);
        }
        if let Some(team_name) = request.team_name {
            team.team_name = Set(team_name);
        }
        if let Some(status) = request.status {
            team.status = Set(status);
        }
        team.updated_at = Set(now());

        team.update(self.pool.write()).await.map_err(Into::into)
    }

    /// Members are removed with the team
    async fn delete(&self, id: Uuid) -> Result<()> {
        delete_required::<TeamEntity>(self.pool.write(), id, Self::RESOURCE).await
    }
}
