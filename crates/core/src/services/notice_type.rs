//! Notice type reference data (solicitation, presolicitation, award...)

use super::{now, CrudService};
use crate::db::models::{NoticeType, NoticeTypeActiveModel, NoticeTypeColumn, NoticeTypeEntity};
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
pub struct CreateNoticeType {
    #[validate(custom(function = "not_blank"), length(max = 50))]
    pub code: String,

    #[validate(custom(function = "not_blank"), length(max = 255))]
    pub name: String,

    pub description: Option<String>,

    #[validate(length(max = 50))]
    pub category: Option<String>,

    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateNoticeType {
    #[validate(custom(function = "not_blank"), length(max = 50))]
    pub code: Option<String>,

    #[validate(custom(function = "not_blank"), length(max = 255))]
    pub name: Option<String>,

    pub description: Option<String>,

    #[validate(length(max = 50))]
    pub category: Option<String>,

    pub is_active: Option<bool>,
}

#[derive(Clone)]
pub struct NoticeTypeService {
    pool: DbPool,
}

impl NoticeTypeService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_code(&self, code: &str) -> Result<NoticeType> {
        NoticeTypeEntity::find()
            .filter(NoticeTypeColumn::Code.eq(code))
            .one(self.pool.read())
            .await?
            .ok_or_else(|| AppError::not_found(Self::RESOURCE, code))
    }

    async fn ensure_code_free(&self, code: &str) -> Result<()> {
        let taken = NoticeTypeEntity::find()
            .filter(NoticeTypeColumn::Code.eq(code))
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
impl CrudService for NoticeTypeService {
    type Model = NoticeType;
    type Create = CreateNoticeType;
    type Update = UpdateNoticeType;

    const RESOURCE: &'static str = "NoticeType";

    async fn create(&self, request: CreateNoticeType) -> Result<NoticeType> {
        validate_request(&request)?;
        self.ensure_code_free(&request.code).await?;

        let timestamp = now();
        let notice_type = NoticeTypeActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(request.code),
            name: Set(request.name),
            description: Set(request.description),
            category: Set(request.category),
            is_active: Set(request.is_active.unwrap_or(true)),
            created_at: Set(timestamp),
            updated_at: Set(timestamp),
        };

        notice_type.insert(self.pool.write()).await.map_err(Into::into)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<NoticeType> {
        find_required::<NoticeTypeEntity>(self.pool.read(), id, Self::RESOURCE).await
    }

    async fn find_all(&self, page: PageRequest) -> Result<Page<NoticeType>> {
        let select = NoticeTypeEntity::find().order_by_desc(NoticeTypeColumn::CreatedAt);
        fetch_page(self.pool.read(), select, &page).await
    }

    async fn update(&self, id: Uuid, request: UpdateNoticeType) -> Result<NoticeType> {
        validate_request(&request)?;
        let existing = find_required::<NoticeTypeEntity>(self.pool.write(), id, Self::RESOURCE).await?;

        if let Some(ref code) = request.code {
            if *code != existing.code {
                self.ensure_code_free(code).await?;
            }
        }

        let mut notice_type: NoticeTypeActiveModel = existing.into();
        if let Some(code) = request.code {
            notice_type.code = Set(code);
        }
        if let Some(name) = request.name {
            notice_type.name = Set(name);
        }
        if let Some(description) = request.description {
            notice_type.description = Set(Some(description));
        }
        if let Some(category) = request.category {
            notice_type.category = Set(Some(category));
        }
        if let Some(is_active) = request.is_active {
            notice_type.is_active = Set(is_active);
        }
        notice_type.updated_at = Set(now());

        notice_type.update(self.pool.write()).await.map_err(Into::into)
    }

    /// Soft delete
    async fn delete(&self, id: Uuid) -> Result<()> {
        let existing = find_required::<NoticeTypeEntity>(self.pool.write(), id, Self::RESOURCE).await?;

        let mut notice_type: NoticeTypeActiveModel = existing.into();
        notice_type.is_active = Set(false);
        notice_type.updated_at = Set(now());
        notice_type.update(self.pool.write()).await?;
        Ok(())
    }
}
