//! Set-aside program reference data (8(a), HUBZone, SDVOSB...)

use super::{now, CrudService};
use crate::db::models::{SetAside, SetAsideActiveModel, SetAsideColumn, SetAsideEntity};
use crate::db::query::{fetch_page, find_required};
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
pub struct CreateSetAside {
    #[validate(custom(function = "not_blank"), length(max = 50))]
    pub code: String,

    #[validate(custom(function = "not_blank"), length(max = 255))]
    pub name: String,

    pub description: Option<String>,

    #[validate(length(max = 100))]
    pub eligibility_criteria: Option<String>,

    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateSetAside {
    #[validate(custom(function = "not_blank"), length(max = 50))]
    pub code: Option<String>,

    #[validate(custom(function = "not_blank"), length(max = 255))]
    pub name: Option<String>,

    pub description: Option<String>,

    #[validate(length(max = 100))]
    pub eligibility_criteria: Option<String>,

    pub is_active: Option<bool>,
}

#[derive(Clone)]
pub struct SetAsideService {
    pool: DbPool,
}

impl SetAsideService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_code(&self, code: &str) -> Result<SetAside> {
        SetAsideEntity::find()
            .filter(SetAsideColumn::Code.eq(code))
            .one(self.pool.read())
            .await?
            .ok_or_else(|| AppError::not_found(Self::RESOURCE, code))
    }

    async fn ensure_code_free(&self, code: &str) -> Result<()> {
        let taken = SetAsideEntity::find()
            .filter(SetAsideColumn::Code.eq(code))
            .one(self.pool.write())
            .await?
            .is_some();
        if taken {
            return Err(AppError::duplicate(Self::RESOURCE, "code", code));
        }
        Ok(())
    }
}

#[async_trait]
impl CrudService for SetAsideService {
    type Model = SetAside;
    type Create = CreateSetAside;
    type Update = UpdateSetAside;

    const RESOURCE: &'static str = "SetAside";

    async fn create(&self, request: CreateSetAside) -> Result<SetAside> {
        validate_request(&request)?;
        self.ensure_code_free(&request.code).await?;

        let timestamp = now();
        let set_aside = SetAsideActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(request.code),
            name: Set(request.name),
            description: Set(request.description),
            eligibility_criteria: Set(request.eligibility_criteria),
            is_active: Set(request.is_active.unwrap_or(true)),
            created_at: Set(timestamp),
            updated_at: Set(timestamp),
        };

        set_aside.insert(self.pool.write()).await.map_err(Into::into)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<SetAside> {
        find_required::<SetAsideEntity>(self.pool.read(), id, Self::RESOURCE).await
    }

    async fn find_all(&self, page: PageRequest) -> Result<Page<SetAside>> {
        let select = SetAsideEntity::find().order_by_desc(SetAsideColumn::CreatedAt);
        fetch_page(self.pool.read(), select, &page).await
    }

    async fn update(&self, id: Uuid, request: UpdateSetAside) -> Result<SetAside> {
        validate_request(&request)?;
        let existing = find_required::<SetAsideEntity>(self.pool.write(), id, Self::RESOURCE).await?;

        if let Some(ref code) = request.code {
            if *code != existing.code {
                self.ensure_code_free(code).await?;
            }
        }

        let mut set_aside: SetAsideActiveModel = existing.into();
        if let Some(code) = request.code {
            set_aside.code = Set(code);
        }
        if let Some(name) = request.name {
            set_aside.name = Set(name);
        }
        if let Some(description) = request.description {
            set_aside.description = Set(Some(description));
        }
        if let Some(eligibility_criteria) = request.eligibility_criteria {
            set_aside.eligibility_criteria = Set(Some(eligibility_criteria));
        }
        if let Some(is_active) = request.is_active {
            set_aside.is_active = Set(is_active);
        }
        set_aside.updated_at = Set(now());

        set_aside.update(self.pool.write()).await.map_err(Into::into)
    }

    /// Soft delete
    async fn delete(&self, id: Uuid) -> Result<()> {
        let existing = find_required::<SetAsideEntity>(self.pool.write(), id, Self::RESOURCE).await?;

        let mut set_aside: SetAsideActiveModel = existing.into();
        set_aside.is_active = Set(false);
        set_aside.updated_at = Set(now());
        set_aside.update(self.pool.write()).await?;
        Ok(())
    }
}
