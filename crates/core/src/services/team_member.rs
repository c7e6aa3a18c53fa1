//! Team membership service

use super::{now, CrudService};
use crate::db::models::{
    OrganizationEntity, TeamEntity, TeamMember, TeamMemberActiveModel, TeamMemberColumn, TeamMemberEntity, UserEntity,
};
use crate::db::query::{delete_required, fetch_page, find_required};
use crate::db::DbPool;
use async_trait::async_trait;
use athena_common::errors::{AppError, Result};
use athena_common::pagination::{Page, PageRequest};
use athena_common::validation::{not_blank, validate_request};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTeamMember {
    pub team_id: Uuid,

    pub organization_id: Uuid,

    #[validate(custom(function = "not_blank"), length(max = 100))]
    pub role: String,

    pub capabilities: Option<String>,

    pub is_prime: Option<bool>,

    pub added_by: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateTeamMember {
    #[validate(custom(function = "not_blank"), length(max = 100))]
    pub role: Option<String>,

    pub capabilities: Option<String>,

    pub is_prime: Option<bool>,
}

#[derive(Clone)]
pub struct TeamMemberService {
    pool: DbPool,
}

impl TeamMemberService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_team(&self, team_id: Uuid) -> Result<Vec<TeamMember>> {
        TeamMemberEntity::find()
            .filter(TeamMemberColumn::TeamId.eq(team_id))
            .order_by_desc(TeamMemberColumn::IsPrime)
            .order_by_asc(TeamMemberColumn::CreatedAt)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_organization(&self, organization_id: Uuid) -> Result<Vec<TeamMember>> {
        TeamMemberEntity::find()
            .filter(TeamMemberColumn::OrganizationId.eq(organization_id))
            .order_by_desc(TeamMemberColumn::CreatedAt)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }

    pub async fn find_prime_contractors(&self, team_id: Uuid) -> Result<Vec<TeamMember>> {
        TeamMemberEntity::find()
            .filter(TeamMemberColumn::TeamId.eq(team_id))
            .filter(TeamMemberColumn::IsPrime.eq(true))
            .order_by_asc(TeamMemberColumn::CreatedAt)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }
}

#[async_trait]
impl CrudService for TeamMemberService {
    type Model = TeamMember;
    type Create = CreateTeamMember;
    type Update = UpdateTeamMember;

    const RESOURCE: &'static str = "TeamMember";

    async fn create(&self, request: CreateTeamMember) -> Result<TeamMember> {
        validate_request(&request)?;
        find_required::<TeamEntity>(self.pool.read(), request.team_id, "Team").await?;
        find_required::<OrganizationEntity>(self.pool.read(), request.organization_id, "Organization").await?;
        find_required::<UserEntity>(self.pool.read(), request.added_by, "User").await?;

        // An organization joins a team at most once
        let already_member = TeamMemberEntity::find()
            .filter(TeamMemberColumn::TeamId.eq(request.team_id))
            .filter(TeamMemberColumn::OrganizationId.eq(request.organization_id))
            .one(self.pool.write())
            .await?
            .is_some();
        if already_member {
            return Err(AppError::duplicate(
                Self::RESOURCE,
                "organization_id",
                request.organization_id,
            ));
        }

        let timestamp = now();
        let member = TeamMemberActiveModel {
            id: Set(Uuid::new_v4()),
            team_id: Set(request.team_id),
            organization_id: Set(request.organization_id),
            role: Set(request.role),
            capabilities: Set(request.capabilities),
            is_prime: Set(request.is_prime.unwrap_or(false)),
            added_by: Set(request.added_by),
            created_at: Set(timestamp),
            updated_at: Set(timestamp),
        };

        member.insert(self.pool.write()).await.map_err(Into::into)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<TeamMember> {
        find_required::<TeamMemberEntity>(self.pool.read(), id, Self::RESOURCE).await
    }

    async fn find_all(&self, page: PageRequest) -> Result<Page<TeamMember>> {
        let select = TeamMemberEntity::find().order_by_desc(TeamMemberColumn::CreatedAt);
        fetch_page(self.pool.read(), select, &page).await
    }

    async fn update(&self, id: Uuid, request: UpdateTeamMember) -> Result<TeamMember> {
        validate_request(&request)?;
        let existing = find_required::<TeamMemberEntity>(self.pool.write(), id, Self::RESOURCE).await?;

        let mut member: TeamMemberActiveModel = existing.into();
        if let Some(role) = request.role {
            member.role = Set(role);
        }
        if let Some(capabilities) = request.capabilities {
            member.capabilities = Set(Some(capabilities));
        }
        if let Some(is_prime) = request.is_prime {
            member.is_prime = Set(is_prime);
        }
        member.updated_at = Set(now());

        member.update(self.pool.write()).await.map_err(Into::into)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        delete_required::<TeamMemberEntity>(self.pool.write(), id, Self::RESOURCE).await
    }
}
