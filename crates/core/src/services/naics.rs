//! NAICS industry classification service

use super::{now, CrudService};
use crate::db::models::{Naics, NaicsActiveModel, NaicsColumn, NaicsEntity};
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
pub struct CreateNaics {
    #[validate(custom(function = "not_blank"), length(max = 6))]
    pub code: String,

    #[validate(custom(function = "not_blank"), length(max = 500))]
    pub title: String,

    pub description: Option<String>,

    #[validate(length(max = 6))]
    pub parent_code: Option<String>,

    /// Hierarchy depth, 2 (sector) through 6 (national industry)
    #[validate(range(min = 1, max = 6))]
    pub level: i32,

    #[validate(length(max = 50))]
    pub year_version: Option<String>,

    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateNaics {
    #[validate(custom(function = "not_blank"), length(max = 6))]
    pub code: Option<String>,

    #[validate(custom(function = "not_blank"), length(max = 500))]
    pub title: Option<String>,

    pub description: Option<String>,

    #[validate(length(max = 6))]
    pub parent_code: Option<String>,

    #[validate(range(min = 1, max = 6))]
    pub level: Option<i32>,

    #[validate(length(max = 50))]
    pub year_version: Option<String>,

    pub is_active: Option<bool>,
}

#[derive(Clone)]
pub struct NaicsService {
    pool: DbPool,
}

impl NaicsService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_code(&self, code: &str) -> Result<Naics> {
        NaicsEntity::find()
            .filter(NaicsColumn::Code.eq(code))
            .one(self.pool.read())
            .await?
            .ok_or_else(|| AppError::not_found(Self::RESOURCE, code))
    }

    async fn ensure_code_free(&self, code: &str) -> Result<()> {
        let taken = NaicsEntity::find()
            .filter(NaicsColumn::Code.eq(code))
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
impl CrudService for NaicsService {
    type Model = Naics;
    type Create = CreateNaics;
    type Update = UpdateNaics;

    const RESOURCE: &'static str = "NAICS";

    async fn create(&self, request: CreateNaics) -> Result<Naics> {
        validate_request(&request)?;
        self.ensure_code_free(&request.code).await?;

        let timestamp = now();
        let naics = NaicsActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(request.code),
            title: Set(request.title),
            description: Set(request.description),
            parent_code: Set(request.parent_code),
            level: Set(request.level),
            year_version: Set(request.year_version),
            is_active: Set(request.is_active.unwrap_or(true)),
            created_at: Set(timestamp),
            updated_at: Set(timestamp),
        };

        naics.insert(self.pool.write()).await.map_err(Into::into)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Naics> {
        find_required::<NaicsEntity>(self.pool.read(), id, Self::RESOURCE).await
    }

    async fn find_all(&self, page: PageRequest) -> Result<Page<Naics>> {
        let select = NaicsEntity::find().order_by_desc(NaicsColumn::CreatedAt);
        fetch_page(self.pool.read(), select, &page).await
    }

    async fn update(&self, id: Uuid, request: UpdateNaics) -> Result<Naics> {
        validate_request(&request)?;
        let existing = find_required::<NaicsEntity>(self.pool.write(), id, Self::RESOURCE).await?;

        if let Some(ref code) = request.code {
            if *code != existing.code {
                self.ensure_code_free(code).await?;
            }
        }

        let mut naics: NaicsActiveModel = existing.into();
        if let Some(code) = request.code {
            naics.code = Set(code);
        }
        if let Some(title) = request.title {
            naics.title = Set(title);
        }
        if let Some(description) = request.description {
            naics.description = Set(Some(description));
        }
        if let Some(parent_code) = request.parent_code {
            naics.parent_code = Set(Some(parent_code));
        }
        if let Some(level) = request.level {
            naics.level = Set(level);
        }
        if let Some(year_version) = request.year_version {
            naics.year_version = Set(Some(year_version));
        }
        if let Some(is_active) = request.is_active {
            naics.is_active = Set(is_active);
        }
        naics.updated_at = Set(now());

        naics.update(self.pool.write()).await.map_err(Into::into)
    }

    /// Soft delete
    async fn delete(&self, id: Uuid) -> Result<()> {
        let existing = find_required::<NaicsEntity>(self.pool.write(), id, Self::RESOURCE).await?;

        let mut naics: NaicsActiveModel = existing.into();
        naics.is_active = Set(false);
        naics.updated_at = Set(now());
        naics.update(self.pool.write()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_level_and_code_bounds() {
        let request: CreateNaics = serde_json::from_value(json!({
            "code": "5415121",
            "title": "Computer Systems Design Services",
            "level": 9
        }))
        .unwrap();
        let err = validate_request(&request).unwrap_err();
        match err {
            AppError::Validation { message, .. } => {
                assert!(message.contains("code"));
                assert!(message.contains("level"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
