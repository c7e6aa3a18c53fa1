//! Saved search service

use super::{now, CrudService};
use crate::db::models::{SavedSearch, SavedSearchActiveModel, SavedSearchColumn, SavedSearchEntity, UserEntity};
use crate::db::query::{fetch_page, find_required};
use crate::db::DbPool;
use async_trait::async_trait;
use athena_common::errors::{AppError, Result};
use athena_common::pagination::{Page, PageRequest};
use athena_common::validation::{not_blank, validate_request};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSavedSearch {
    pub user_id: Uuid,

    #[validate(custom(function = "not_blank"), length(max = 255))]
    pub search_name: String,

    pub search_criteria: Value,

    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateSavedSearch {
    #[validate(custom(function = "not_blank"), length(max = 255))]
    pub search_name: Option<String>,

    pub search_criteria: Option<Value>,

    pub is_active: Option<bool>,
}

#[derive(Clone)]
pub struct SavedSearchService {
    pool: DbPool,
}

impl SavedSearchService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<SavedSearch>> {
        SavedSearchEntity::find()
            .filter(SavedSearchColumn::UserId.eq(user_id))
            .order_by_asc(SavedSearchColumn::SearchName)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }

    pub async fn find_active_by_user(&self, user_id: Uuid) -> Result<Vec<SavedSearch>> {
        SavedSearchEntity::find()
            .filter(SavedSearchColumn::UserId.eq(user_id))
            .filter(SavedSearchColumn::IsActive.eq(true))
            .order_by_asc(SavedSearchColumn::SearchName)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }

    /// Stamp `last_executed` with the current time
    pub async fn record_execution(&self, id: Uuid) -> Result<SavedSearch> {
        let existing = find_required::<SavedSearchEntity>(self.pool.write(), id, Self::RESOURCE).await?;

        let timestamp = now();
        let mut search: SavedSearchActiveModel = existing.into();
        search.last_executed = Set(Some(timestamp));
        search.updated_at = Set(timestamp);
        search.update(self.pool.write()).await.map_err(Into::into)
    }

    /// Search names are unique per user
    async fn ensure_name_free(&self, user_id: Uuid, search_name: &str) -> Result<()> {
        let taken = SavedSearchEntity::find()
            .filter(SavedSearchColumn::UserId.eq(user_id))
            .filter(SavedSearchColumn::SearchName.eq(search_name))
            .one(self.pool.write())
            .await?
            .is_some();
        if taken {
            return Err(AppError::duplicate(Self::RESOURCE, "search_name", search_name));
        }
        Ok(())
    }
}

#[async_trait]
impl CrudService for SavedSearchService {
    type Model = SavedSearch;
    type Create = CreateSavedSearch;
    type Update = UpdateSavedSearch;

    const RESOURCE: &'static str = "SavedSearch";

    async fn create(&self, request: CreateSavedSearch) -> Result<SavedSearch> {
        validate_request(&request)?;
        find_required::<UserEntity>(self.pool.read(), request.user_id, "User").await?;
        self.ensure_name_free(request.user_id, &request.search_name).await?;

        let timestamp = now();
        let search = SavedSearchActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(request.user_id),
            search_name: Set(request.search_name),
            search_criteria: Set(request.search_criteria),
            is_active: Set(request.is_active.unwrap_or(true)),
            last_executed: Set(None),
            created_at: Set(timestamp),
            updated_at: Set(timestamp),
        };

        search.insert(self.pool.write()).await.map_err(Into::into)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<SavedSearch> {
        find_required::<SavedSearchEntity>(self.pool.read(), id, Self::RESOURCE).await
    }

    async fn find_all(&self, page: PageRequest) -> Result<Page<SavedSearch>> {
        let select = SavedSearchEntity::find().order_by_desc(SavedSearchColumn::CreatedAt);
        fetch_page(self.pool.read(), select, &page).await
    }

    async fn update(&self, id: Uuid, request: UpdateSavedSearch) -> Result<SavedSearch> {
        validate_request(&request)?;
        let existing = find_required::<SavedSearchEntity>(self.pool.write(), id, Self::RESOURCE).await?;

        if let Some(ref search_name) = request.search_name {
            if *search_name != existing.search_name {
                self.ensure_name_free(existing.user_id, search_name).await?;
            }
        }

        let mut search: SavedSearchActiveModel = existing.into();
        if let Some(search_name) = request.search_name {
            search.search_name = Set(search_name);
        }
        if let Some(search_criteria) = request.search_criteria {
            search.search_criteria = Set(search_criteria);
        }
        if let Some(is_active) = request.is_active {
            search.is_active = Set(is_active);
        }
        search.updated_at = Set(now());

        search.update(self.pool.write()).await.map_err(Into::into)
    }

    /// Soft delete
    async fn delete(&self, id: Uuid) -> Result<()> {
        let existing = find_required::<SavedSearchEntity>(self.pool.write(), id, Self::RESOURCE).await?;

        let mut search: SavedSearchActiveModel = existing.into();
        search.is_active = Set(false);
        search.updated_at = Set(now());
        search.update(self.pool.write()).await?;
        Ok(())
    }
}
