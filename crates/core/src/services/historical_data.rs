//! Point-in-time snapshots of entity data

use super::{now, CrudService};
use crate::db::models::{HistoricalData, HistoricalDataActiveModel, HistoricalDataColumn, HistoricalDataEntity};
use crate::db::query::{delete_required, fetch_page, find_required};
use crate::db::DbPool;
use async_trait::async_trait;
use athena_common::errors::Result;
use athena_common::pagination::{Page, PageRequest};
use athena_common::validation::{not_blank, validate_request};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateHistoricalData {
    #[validate(custom(function = "not_blank"), length(max = 100))]
    pub entity_type: String,

    pub entity_id: Uuid,

    #[validate(custom(function = "not_blank"), length(max = 100))]
    pub data_type: String,

    pub data_value: Value,

    /// Defaults to the insert time
    pub captured_at: Option<DateTimeWithTimeZone>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateHistoricalData {
    #[validate(custom(function = "not_blank"), length(max = 100))]
    pub data_type: Option<String>,

    pub data_value: Option<Value>,

    pub captured_at: Option<DateTimeWithTimeZone>,
}

#[derive(Clone)]
pub struct HistoricalDataService {
    pool: DbPool,
}

impl HistoricalDataService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_entity_id(&self, entity_id: Uuid) -> Result<Vec<HistoricalData>> {
        HistoricalDataEntity::find()
            .filter(HistoricalDataColumn::EntityId.eq(entity_id))
            .order_by_desc(HistoricalDataColumn::CapturedAt)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }

    /// Snapshots of one specific entity
    pub async fn find_by_entity(&self, entity_type: &str, entity_id: Uuid) -> Result<Vec<HistoricalData>> {
        HistoricalDataEntity::find()
            .filter(HistoricalDataColumn::EntityType.eq(entity_type))
            .filter(HistoricalDataColumn::EntityId.eq(entity_id))
            .order_by_desc(HistoricalDataColumn::CapturedAt)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_data_type(&self, data_type: &str) -> Result<Vec<HistoricalData>> {
        HistoricalDataEntity::find()
            .filter(HistoricalDataColumn::DataType.eq(data_type))
            .order_by_desc(HistoricalDataColumn::CapturedAt)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_captured_between(
        &self,
        start: DateTimeWithTimeZone,
        end: DateTimeWithTimeZone,
    ) -> Result<Vec<HistoricalData>> {
        HistoricalDataEntity::find()
            .filter(HistoricalDataColumn::CapturedAt.between(start, end))
            .order_by_desc(HistoricalDataColumn::CapturedAt)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_entity_type(&self, entity_type: &str) -> Result<Vec<HistoricalData>> {
        HistoricalDataEntity::find()
            .filter(HistoricalDataColumn::EntityType.eq(entity_type))
            .order_by_desc(HistoricalDataColumn::CapturedAt)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }
}

#[async_trait]
impl CrudService for HistoricalDataService {
    type Model = HistoricalData;
    type Create = CreateHistoricalData;
    type Update = UpdateHistoricalData;

    const RESOURCE: &'static str = "HistoricalData";

    async fn create(&self, request: CreateHistoricalData) -> Result<HistoricalData> {
        validate_request(&request)?;

        let timestamp = now();
        let snapshot = HistoricalDataActiveModel {
            id: Set(Uuid::new_v4()),
            entity_type: Set(request.entity_type),
            entity_id: Set(request.entity_id),
            data_type: Set(request.data_type),
            data_value: Set(request.data_value),
            captured_at: Set(request.captured_at.unwrap_or(timestamp)),
            created_at: Set(timestamp),
        };

        snapshot.insert(self.pool.write()).await.map_err(Into::into)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<HistoricalData> {
        find_required::<HistoricalDataEntity>(self.pool.read(), id, Self::RESOURCE).await
    }

    async fn find_all(&self, page: PageRequest) -> Result<Page<HistoricalData>> {
        let select = HistoricalDataEntity::find().order_by_desc(HistoricalDataColumn::CreatedAt);
        fetch_page(self.pool.read(), select, &page).await
    }

    /// Snapshots carry no `updated_at`; only the payload fields change
    async fn update(&self, id: Uuid, request: UpdateHistoricalData) -> Result<HistoricalData> {
        validate_request(&request)?;
        let existing = find_required::<HistoricalDataEntity>(self.pool.write(), id, Self::RESOURCE).await?;

        let mut snapshot: HistoricalDataActiveModel = existing.into();
        if let Some(data_type) = request.data_type {
            snapshot.data_type = Set(data_type);
        }
        if let Some(data_value) = request.data_value {
            snapshot.data_value = Set(data_value);
        }
        if let Some(captured_at) = request.captured_at {
            snapshot.captured_at = Set(captured_at);
        }

        snapshot.update(self.pool.write()).await.map_err(Into::into)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        delete_required::<HistoricalDataEntity>(self.pool.write(), id, Self::RESOURCE).await
    }
}
