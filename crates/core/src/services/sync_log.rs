//! Sync/job audit log service

use super::{now, CrudService};
use crate::db::models::{SyncLog, SyncLogActiveModel, SyncLogColumn, SyncLogEntity, SyncStatus};
use crate::db::query::{delete_required, fetch_page, find_required};
use crate::db::DbPool;
use async_trait::async_trait;
use athena_common::errors::{AppError, Result};
use athena_common::pagination::{Page, PageRequest};
use athena_common::validation::{not_blank, validate_request};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

pub const SYNC_TYPE_SAM_GOV_IMPORT: &str = "SAM_GOV_IMPORT";
pub const SYNC_TYPE_AI_SCORING: &str = "AI_SCORING";
pub const SYNC_TYPE_WEEKLY_DIGEST: &str = "WEEKLY_DIGEST";

/// Upper bound for `find_recent`
const MAX_RECENT: u64 = 100;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSyncLog {
    #[validate(custom(function = "not_blank"), length(max = 100))]
    pub sync_type: String,

    #[validate(custom(function = "not_blank"), length(max = 50))]
    pub status: String,

    /// Defaults to the insert time
    pub started_at: Option<DateTimeWithTimeZone>,

    pub completed_at: Option<DateTimeWithTimeZone>,

    #[validate(range(min = 0))]
    pub records_processed: Option<i32>,

    #[validate(range(min = 0))]
    pub error_count: Option<i32>,

    pub error_log: Option<String>,
}

impl CreateSyncLog {
    /// A finished run of `sync_type`
    pub fn completed(sync_type: &str, status: SyncStatus, started_at: DateTimeWithTimeZone) -> Self {
        Self {
            sync_type: sync_type.to_string(),
            status: status.into(),
            started_at: Some(started_at),
            completed_at: Some(now()),
            records_processed: None,
            error_count: None,
            error_log: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateSyncLog {
    #[validate(custom(function = "not_blank"), length(max = 50))]
    pub status: Option<String>,

    pub completed_at: Option<DateTimeWithTimeZone>,

    #[validate(range(min = 0))]
    pub records_processed: Option<i32>,

    #[validate(range(min = 0))]
    pub error_count: Option<i32>,

    pub error_log: Option<String>,
}

#[derive(Clone)]
pub struct SyncLogService {
    pool: DbPool,
}

impl SyncLogService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_status(&self, status: &str) -> Result<Vec<SyncLog>> {
        SyncLogEntity::find()
            .filter(SyncLogColumn::Status.eq(status.to_ascii_uppercase()))
            .order_by_desc(SyncLogColumn::StartedAt)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_sync_type(&self, sync_type: &str) -> Result<Vec<SyncLog>> {
        SyncLogEntity::find()
            .filter(SyncLogColumn::SyncType.eq(sync_type))
            .order_by_desc(SyncLogColumn::StartedAt)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_started_between(
        &self,
        start: DateTimeWithTimeZone,
        end: DateTimeWithTimeZone,
    ) -> Result<Vec<SyncLog>> {
        SyncLogEntity::find()
            .filter(SyncLogColumn::StartedAt.between(start, end))
            .order_by_desc(SyncLogColumn::StartedAt)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }

    /// Newest runs first, at most 100
    pub async fn find_recent(&self, limit: u64) -> Result<Vec<SyncLog>> {
        SyncLogEntity::find()
            .order_by_desc(SyncLogColumn::StartedAt)
            .limit(limit.clamp(1, MAX_RECENT))
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }

    pub async fn find_failed(&self) -> Result<Vec<SyncLog>> {
        self.find_by_status(SyncStatus::Failed.as_str()).await
    }

    pub async fn find_latest_by_type(&self, sync_type: &str) -> Result<SyncLog> {
        SyncLogEntity::find()
            .filter(SyncLogColumn::SyncType.eq(sync_type))
            .order_by_desc(SyncLogColumn::StartedAt)
            .one(self.pool.read())
            .await?
            .ok_or_else(|| AppError::NotFound {
                resource_type: format!("{} sync", sync_type),
                id: "latest".to_string(),
            })
    }

    /// Whether `sync_type` has ever completed successfully
    pub async fn exists_successful(&self, sync_type: &str) -> Result<bool> {
        let count = SyncLogEntity::find()
            .filter(SyncLogColumn::SyncType.eq(sync_type))
            .filter(SyncLogColumn::Status.eq(SyncStatus::Success.as_str()))
            .count(self.pool.read())
            .await?;
        Ok(count > 0)
    }
}

#[async_trait]
impl CrudService for SyncLogService {
    type Model = SyncLog;
    type Create = CreateSyncLog;
    type Update = UpdateSyncLog;

    const RESOURCE: &'static str = "SyncLog";

    async fn create(&self, request: CreateSyncLog) -> Result<SyncLog> {
        validate_request(&request)?;

        let timestamp = now();
        let log = SyncLogActiveModel {
            id: Set(Uuid::new_v4()),
            sync_type: Set(request.sync_type),
            status: Set(request.status),
            started_at: Set(request.started_at.unwrap_or(timestamp)),
            completed_at: Set(request.completed_at),
            records_processed: Set(request.records_processed),
            error_count: Set(request.error_count),
            error_log: Set(request.error_log),
            created_at: Set(timestamp),
            updated_at: Set(timestamp),
        };

        log.insert(self.pool.write()).await.map_err(Into::into)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<SyncLog> {
        find_required::<SyncLogEntity>(self.pool.read(), id, Self::RESOURCE).await
    }

    async fn find_all(&self, page: PageRequest) -> Result<Page<SyncLog>> {
        let select = SyncLogEntity::find().order_by_desc(SyncLogColumn::CreatedAt);
        fetch_page(self.pool.read(), select, &page).await
    }

    async fn update(&self, id: Uuid, request: UpdateSyncLog) -> Result<SyncLog> {
        validate_request(&request)?;
        let existing = find_required::<SyncLogEntity>(self.pool.write(), id, Self::RESOURCE).await?;

        let mut log: SyncLogActiveModel = existing.into();
        if let Some(status) = request.status {
            log.status = Set(status);
        }
        if let Some(completed_at) = request.completed_at {
            log.completed_at = Set(Some(completed_at));
        }
        if let Some(records_processed) = request.records_processed {
            log.records_processed = Set(Some(records_processed));
        }
        if let Some(error_count) = request.error_count {
            log.error_count = Set(Some(error_count));
        }
        if let Some(error_log) = request.error_log {
            log.error_log = Set(Some(error_log));
        }
        log.updated_at = Set(now());

        log.update(self.pool.write()).await.map_err(Into::into)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        delete_required::<SyncLogEntity>(self.pool.write(), id, Self::RESOURCE).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completed_log_request() {
        let started = now();
        let request = CreateSyncLog::completed(SYNC_TYPE_WEEKLY_DIGEST, SyncStatus::Success, started);

        assert_eq!(request.sync_type, "WEEKLY_DIGEST");
        assert_eq!(request.status, "SUCCESS");
        assert_eq!(request.started_at, Some(started));
        assert!(request.completed_at.unwrap() >= started);
        assert!(validate_request(&request).is_ok());
    }
}
